use time::OffsetDateTime;

/// Columns shared by every listing-shaped query. `price` is cast to double
/// precision in SQL; the NUMERIC column is not decoded directly.
#[derive(Debug, sqlx::FromRow)]
pub struct AssetSummary {
	pub id: i64,
	pub code: String,
	pub name_th: Option<String>,
	pub name_en: Option<String>,
	pub price: Option<f64>,
	pub main_image_id: Option<i64>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
}

/// Candidate row for item-to-item scoring: the listing columns plus the
/// attributes the composite score needs and the store-computed cosine
/// distance to the target embedding.
#[derive(Debug, sqlx::FromRow)]
pub struct ItemCandidate {
	pub id: i64,
	pub code: String,
	pub name_th: Option<String>,
	pub name_en: Option<String>,
	pub price: Option<f64>,
	pub main_image_id: Option<i64>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub asset_type_id: Option<i64>,
	pub bedrooms: Option<i32>,
	pub vector_distance: f64,
}

/// Attributes of the item-similarity target. The embedding itself stays in
/// the store; only its presence matters here.
#[derive(Debug, sqlx::FromRow)]
pub struct AssetTarget {
	pub asset_type_id: Option<i64>,
	pub price: Option<f64>,
	pub bedrooms: Option<i32>,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub has_embedding: bool,
}

/// Listing fields the chat flow turns into grounding context for the model.
#[derive(Debug, sqlx::FromRow)]
pub struct ChatContext {
	pub code: String,
	pub name_th: Option<String>,
	pub name_en: Option<String>,
	pub price: Option<f64>,
	pub bedrooms: Option<i32>,
	pub description_th: Option<String>,
	pub description_en: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserProfile {
	pub client_id: String,
	/// `profile_vector::text`, parsed by the service layer.
	pub profile_vector: Option<String>,
	pub profile_weight: f64,
	pub last_updated: OffsetDateTime,
}
