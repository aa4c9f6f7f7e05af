use reva_storage::models::AssetSummary;

use crate::{AssetResult, RevaService, ServiceResult, search::LIST_COLUMNS};

impl RevaService {
	/// Fetches one asset by id. `Ok(None)` becomes a 404 at the API layer.
	pub async fn get_asset(&self, asset_id: i64) -> ServiceResult<Option<AssetResult>> {
		let query = format!("SELECT {LIST_COLUMNS} FROM assets WHERE id = $1");
		let row: Option<AssetSummary> =
			sqlx::query_as(&query).bind(asset_id).fetch_optional(&self.db.pool).await?;

		Ok(row.map(AssetResult::from))
	}
}
