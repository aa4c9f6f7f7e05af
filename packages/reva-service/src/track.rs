use std::sync::Arc;

use reva_domain::profile::{self, ProfileState};
use reva_storage::models::UserProfile;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::{RevaService, ServiceResult, parse_pg_vector, vector_to_pg};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TrackRequest {
	pub client_id: String,
	pub asset_id: i64,
	pub action: String,
}

/// Fire-and-forget queue in front of [`RevaService::update_profile`]. The
/// HTTP layer answers as soon as the event is enqueued; one worker applies
/// events in arrival order.
#[derive(Clone)]
pub struct ProfileTracker {
	tx: mpsc::UnboundedSender<TrackRequest>,
}
impl ProfileTracker {
	pub fn spawn(service: Arc<RevaService>) -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<TrackRequest>();

		tokio::spawn(async move {
			while let Some(event) = rx.recv().await {
				if let Err(err) = service.update_profile(&event).await {
					tracing::error!(
						error = %err,
						client_id = %event.client_id,
						asset_id = event.asset_id,
						"Profile update failed."
					);
				}
			}
		});

		Self { tx }
	}

	pub fn enqueue(&self, event: TrackRequest) {
		if self.tx.send(event).is_err() {
			tracing::error!("Profile tracker worker is gone; interaction dropped.");
		}
	}
}

impl RevaService {
	/// Folds one interaction into the client's profile vector. Unknown
	/// actions and assets without embeddings are no-ops.
	pub async fn update_profile(&self, event: &TrackRequest) -> ServiceResult<()> {
		let Some(weight) = profile::action_weight(&event.action) else {
			tracing::warn!(action = %event.action, "Unknown interaction action ignored.");

			return Ok(());
		};
		let embedding_text: Option<String> =
			sqlx::query_scalar("SELECT embedding::text FROM assets WHERE id = $1")
				.bind(event.asset_id)
				.fetch_optional(&self.db.pool)
				.await?
				.flatten();
		let Some(embedding_text) = embedding_text else {
			tracing::debug!(
				asset_id = event.asset_id,
				"Asset is missing or has no embedding; interaction skipped."
			);

			return Ok(());
		};
		let asset_vector = parse_pg_vector(&embedding_text)?;
		let mut tx = self.db.pool.begin().await?;
		let existing: Option<UserProfile> = sqlx::query_as(
			"SELECT client_id, profile_vector::text AS profile_vector, profile_weight, \
			 last_updated FROM user_profiles WHERE client_id = $1",
		)
		.bind(&event.client_id)
		.fetch_optional(&mut *tx)
		.await?;
		let state = match &existing {
			Some(row) => match &row.profile_vector {
				Some(text) => {
					let vector = parse_pg_vector(text)?;

					(!vector.is_empty())
						.then_some(ProfileState { vector, weight: row.profile_weight })
				},
				None => None,
			},
			None => None,
		};
		let had_vector = state.is_some();
		let Some(folded) = profile::fold_interaction(state.as_ref(), &asset_vector, weight) else {
			tracing::warn!(
				client_id = %event.client_id,
				asset_id = event.asset_id,
				"Profile and asset vector dimensions differ; interaction skipped."
			);

			return Ok(());
		};
		let vector_text = vector_to_pg(&folded.vector);
		let now = OffsetDateTime::now_utc();

		if had_vector {
			// Read-modify-write on an existing profile is last-writer-wins.
			sqlx::query(
				"UPDATE user_profiles SET profile_vector = $2::vector, profile_weight = $3, \
				 last_updated = $4 WHERE client_id = $1",
			)
			.bind(&event.client_id)
			.bind(&vector_text)
			.bind(folded.weight)
			.bind(now)
			.execute(&mut *tx)
			.await?;
		} else {
			// First event for a client races with itself across workers; the
			// upsert keeps row creation atomic.
			sqlx::query(
				"INSERT INTO user_profiles (client_id, profile_vector, profile_weight, \
				 last_updated) VALUES ($1, $2::vector, $3, $4) \
				 ON CONFLICT (client_id) DO UPDATE SET profile_vector = EXCLUDED.profile_vector, \
				 profile_weight = EXCLUDED.profile_weight, last_updated = EXCLUDED.last_updated",
			)
			.bind(&event.client_id)
			.bind(&vector_text)
			.bind(folded.weight)
			.bind(now)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
