use reva_domain::similarity::{self, ItemAttributes};
use reva_storage::models::{AssetSummary, AssetTarget, ItemCandidate, UserProfile};

use crate::{AssetResult, RevaService, ServiceResult, parse_pg_vector};

impl RevaService {
	/// Assets most similar to `asset_id`, best first. Empty when the target
	/// is missing, has no embedding, or nothing else qualifies.
	pub async fn recommend_items(&self, asset_id: i64) -> ServiceResult<Vec<AssetResult>> {
		let target: Option<AssetTarget> = sqlx::query_as(
			"SELECT asset_type_id, price::double precision AS price, bedrooms, latitude, \
			 longitude, (embedding IS NOT NULL) AS has_embedding FROM assets WHERE id = $1",
		)
		.bind(asset_id)
		.fetch_optional(&self.db.pool)
		.await?;
		let Some(target) = target.filter(|t| t.has_embedding) else {
			return Ok(Vec::new());
		};
		let candidates: Vec<ItemCandidate> = sqlx::query_as(
			"SELECT id, code, name_th, name_en, price::double precision AS price, \
			 main_image_id, latitude, longitude, asset_type_id, bedrooms, \
			 (embedding <=> (SELECT embedding FROM assets WHERE id = $1))::double precision \
			 AS vector_distance \
			 FROM assets WHERE id <> $1 AND embedding IS NOT NULL AND price > 0",
		)
		.bind(asset_id)
		.fetch_all(&self.db.pool)
		.await?;
		let target_attrs = ItemAttributes {
			asset_type_id: target.asset_type_id,
			price: target.price,
			bedrooms: target.bedrooms,
			latitude: target.latitude,
			longitude: target.longitude,
		};
		let mut scored: Vec<(f64, ItemCandidate)> = candidates
			.into_iter()
			.map(|candidate| {
				let attrs = ItemAttributes {
					asset_type_id: candidate.asset_type_id,
					price: candidate.price,
					bedrooms: candidate.bedrooms,
					latitude: candidate.latitude,
					longitude: candidate.longitude,
				};
				let score =
					similarity::composite_score(&target_attrs, &attrs, candidate.vector_distance);

				(score, candidate)
			})
			.collect();

		// Ties break on id so repeated calls return the same order.
		scored.sort_by(|(a_score, a), (b_score, b)| {
			b_score
				.partial_cmp(a_score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| a.id.cmp(&b.id))
		});
		scored.truncate(self.cfg.recommend.item_limit as usize);

		Ok(scored.into_iter().map(|(_, candidate)| AssetResult::from(candidate)).collect())
	}

	/// Assets closest to the caller's interaction profile. Empty for unknown
	/// clients and for profiles that have not accumulated a vector yet.
	pub async fn recommend_for_user(&self, client_id: &str) -> ServiceResult<Vec<AssetResult>> {
		let profile: Option<UserProfile> = sqlx::query_as(
			"SELECT client_id, profile_vector::text AS profile_vector, profile_weight, \
			 last_updated FROM user_profiles WHERE client_id = $1",
		)
		.bind(client_id)
		.fetch_optional(&self.db.pool)
		.await?;
		let Some(vector_text) = profile.and_then(|p| p.profile_vector) else {
			return Ok(Vec::new());
		};

		if parse_pg_vector(&vector_text)?.is_empty() {
			return Ok(Vec::new());
		}

		let rows: Vec<AssetSummary> = sqlx::query_as(
			"SELECT id, code, name_th, name_en, price::double precision AS price, \
			 main_image_id, latitude, longitude \
			 FROM assets WHERE embedding IS NOT NULL \
			 ORDER BY embedding <=> $1::vector ASC, id ASC LIMIT $2",
		)
		.bind(&vector_text)
		.bind(i64::from(self.cfg.recommend.user_limit))
		.fetch_all(&self.db.pool)
		.await?;

		Ok(rows.into_iter().map(AssetResult::from).collect())
	}
}
