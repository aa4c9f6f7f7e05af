use std::sync::Arc;

use reva_service::{ProfileTracker, RevaService};
use reva_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RevaService>,
	pub tracker: ProfileTracker,
}
impl AppState {
	pub async fn new(config: reva_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.vector_dim).await?;

		Ok(Self::from_service(Arc::new(RevaService::new(config, db))))
	}

	/// Also the seam the HTTP tests use to inject stub providers.
	pub fn from_service(service: Arc<RevaService>) -> Self {
		let tracker = ProfileTracker::spawn(service.clone());

		Self { service, tracker }
	}
}
