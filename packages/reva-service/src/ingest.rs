use crate::{RevaService, ServiceError, ServiceResult, vector_to_pg};

#[derive(Debug, Default, serde::Deserialize)]
pub struct IngestRequest {
	#[serde(default)]
	pub asset_types: Vec<AssetTypeInput>,
	#[serde(default)]
	pub assets: Vec<AssetInput>,
	/// Set to false to load rows without calling the embedding backend.
	#[serde(default = "default_embed")]
	pub embed: bool,
}

fn default_embed() -> bool {
	true
}

#[derive(Debug, serde::Deserialize)]
pub struct AssetTypeInput {
	pub id: i64,
	pub name_th: Option<String>,
	pub name_en: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct AssetInput {
	pub id: i64,
	pub code: String,
	#[serde(default)]
	pub name_th: Option<String>,
	#[serde(default)]
	pub name_en: Option<String>,
	#[serde(default)]
	pub asset_type_id: Option<i64>,
	#[serde(default)]
	pub price: Option<f64>,
	#[serde(default)]
	pub bedrooms: Option<i32>,
	#[serde(default)]
	pub bathrooms: Option<i32>,
	#[serde(default)]
	pub description_th: Option<String>,
	#[serde(default)]
	pub description_en: Option<String>,
	#[serde(default)]
	pub latitude: Option<f64>,
	#[serde(default)]
	pub longitude: Option<f64>,
	#[serde(default)]
	pub main_image_id: Option<i64>,
}

#[derive(Debug, serde::Serialize)]
pub struct IngestReport {
	pub asset_types_inserted: u64,
	pub assets_processed: u64,
}

impl RevaService {
	pub async fn ingest(&self, req: &IngestRequest) -> ServiceResult<IngestReport> {
		for asset in &req.assets {
			if asset.latitude.is_some() != asset.longitude.is_some() {
				return Err(ServiceError::InvalidRequest {
					message: format!(
						"Asset {} has only one of latitude and longitude.",
						asset.id
					),
				});
			}
		}

		let mut asset_types_inserted = 0;

		for asset_type in &req.asset_types {
			let result = sqlx::query(
				"INSERT INTO asset_types (id, name_th, name_en) VALUES ($1, $2, $3) \
				 ON CONFLICT (id) DO NOTHING",
			)
			.bind(asset_type.id)
			.bind(&asset_type.name_th)
			.bind(&asset_type.name_en)
			.execute(&self.db.pool)
			.await?;

			asset_types_inserted += result.rows_affected();
		}

		let vectors = if req.embed && !req.assets.is_empty() {
			self.embed_documents(&req.assets).await
		} else {
			None
		};

		for (i, asset) in req.assets.iter().enumerate() {
			let vector_text =
				vectors.as_ref().and_then(|batch| batch.get(i)).map(|v| vector_to_pg(v));

			sqlx::query(
				"INSERT INTO assets (id, code, name_th, name_en, asset_type_id, price, \
				 bedrooms, bathrooms, description_th, description_en, latitude, longitude, \
				 main_image_id, embedding) \
				 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14::vector) \
				 ON CONFLICT (id) DO UPDATE SET code = EXCLUDED.code, \
				 name_th = EXCLUDED.name_th, name_en = EXCLUDED.name_en, \
				 asset_type_id = EXCLUDED.asset_type_id, price = EXCLUDED.price, \
				 bedrooms = EXCLUDED.bedrooms, bathrooms = EXCLUDED.bathrooms, \
				 description_th = EXCLUDED.description_th, \
				 description_en = EXCLUDED.description_en, latitude = EXCLUDED.latitude, \
				 longitude = EXCLUDED.longitude, main_image_id = EXCLUDED.main_image_id, \
				 embedding = EXCLUDED.embedding",
			)
			.bind(asset.id)
			.bind(&asset.code)
			.bind(&asset.name_th)
			.bind(&asset.name_en)
			.bind(asset.asset_type_id)
			.bind(asset.price)
			.bind(asset.bedrooms)
			.bind(asset.bathrooms)
			.bind(&asset.description_th)
			.bind(&asset.description_en)
			.bind(asset.latitude)
			.bind(asset.longitude)
			.bind(asset.main_image_id)
			.bind(vector_text)
			.execute(&self.db.pool)
			.await?;
		}

		Ok(IngestReport { asset_types_inserted, assets_processed: req.assets.len() as u64 })
	}

	/// One embedding call for the whole batch. Failure degrades to loading
	/// the rows without vectors.
	async fn embed_documents(&self, assets: &[AssetInput]) -> Option<Vec<Vec<f32>>> {
		let documents: Vec<String> = assets.iter().map(embedding_document).collect();

		match self.providers.embedding.embed(&self.cfg.providers.embedding, &documents).await {
			Ok(vectors) if vectors.len() == assets.len() => Some(vectors),
			Ok(vectors) => {
				tracing::warn!(
					expected = assets.len(),
					received = vectors.len(),
					"Embedding batch size mismatch; loading assets without vectors."
				);

				None
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Embedding backend failed; loading assets without vectors."
				);

				None
			},
		}
	}
}

fn embedding_document(asset: &AssetInput) -> String {
	format!(
		"TH: {} {} EN: {} {}",
		asset.name_th.as_deref().unwrap_or_default(),
		asset.description_th.as_deref().unwrap_or_default(),
		asset.name_en.as_deref().unwrap_or_default(),
		asset.description_en.as_deref().unwrap_or_default(),
	)
}
