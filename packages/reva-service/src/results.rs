use reva_storage::models::{AssetSummary, ItemCandidate};

/// Listing card returned by search and both recommenders.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssetResult {
	pub id: i64,
	pub code: String,
	pub name: Option<String>,
	pub price: Option<f64>,
	pub image_url: String,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

// Media storage is not wired up yet, so every card points at a generated
// placeholder keyed by the asset id.
pub(crate) fn image_url(asset_id: i64) -> String {
	format!("https://placehold.co/600x400/EEE/333?text=Property+Image+{asset_id}")
}

impl From<AssetSummary> for AssetResult {
	fn from(row: AssetSummary) -> Self {
		Self {
			image_url: image_url(row.id),
			id: row.id,
			code: row.code,
			name: row.name_th.or(row.name_en),
			price: row.price,
			latitude: row.latitude,
			longitude: row.longitude,
		}
	}
}

impl From<ItemCandidate> for AssetResult {
	fn from(row: ItemCandidate) -> Self {
		Self {
			image_url: image_url(row.id),
			id: row.id,
			code: row.code,
			name: row.name_th.or(row.name_en),
			price: row.price,
			latitude: row.latitude,
			longitude: row.longitude,
		}
	}
}
