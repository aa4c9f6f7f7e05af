use sqlx::PgPool;

use reva_service::TrackRequest;

use super::suite::{self, SeedAsset, VECTOR_DIM};

fn event(client_id: &str, asset_id: i64, action: &str) -> TrackRequest {
	TrackRequest {
		client_id: client_id.to_string(),
		asset_id,
		action: action.to_string(),
	}
}

async fn profile_row(pool: &PgPool, client_id: &str) -> Option<(Option<String>, f64)> {
	sqlx::query_as(
		"SELECT profile_vector::text, profile_weight FROM user_profiles WHERE client_id = $1",
	)
	.bind(client_id)
	.fetch_optional(pool)
	.await
	.expect("Failed to read profile.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn unknown_actions_leave_no_profile() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!("Skipping unknown_actions_leave_no_profile; set REVA_PG_DSN to run this test.");

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::stub_providers(VECTOR_DIM)).await;

	suite::seed_asset(&service.db.pool, SeedAsset {
		id: 1,
		code: "A-001",
		embedding: Some("[1,0,0]"),
		..Default::default()
	})
	.await;
	service.update_profile(&event("client-1", 1, "share")).await.expect("Update failed.");

	assert!(profile_row(&service.db.pool, "client-1").await.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn missing_assets_are_skipped() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!("Skipping missing_assets_are_skipped; set REVA_PG_DSN to run this test.");

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::stub_providers(VECTOR_DIM)).await;

	service.update_profile(&event("client-1", 404, "click")).await.expect("Update failed.");

	assert!(profile_row(&service.db.pool, "client-1").await.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn first_event_seeds_the_profile_from_the_asset() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!(
			"Skipping first_event_seeds_the_profile_from_the_asset; \
			 set REVA_PG_DSN to run this test."
		);

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::stub_providers(VECTOR_DIM)).await;

	suite::seed_asset(&service.db.pool, SeedAsset {
		id: 1,
		code: "A-001",
		embedding: Some("[1,0,0]"),
		..Default::default()
	})
	.await;
	service.update_profile(&event("client-1", 1, "save")).await.expect("Update failed.");

	let (vector, weight) =
		profile_row(&service.db.pool, "client-1").await.expect("Profile is missing.");

	assert_eq!(suite::parse_vector(&vector.expect("Profile vector is null.")), vec![
		1.0, 0.0, 0.0
	]);
	assert_eq!(weight, 3.0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn click_then_save_converges_to_the_weighted_mean() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!(
			"Skipping click_then_save_converges_to_the_weighted_mean; \
			 set REVA_PG_DSN to run this test."
		);

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::stub_providers(VECTOR_DIM)).await;
	let pool = &service.db.pool;

	suite::seed_asset(pool, SeedAsset {
		id: 1,
		code: "A-001",
		embedding: Some("[1,0,0]"),
		..Default::default()
	})
	.await;
	suite::seed_asset(pool, SeedAsset {
		id: 2,
		code: "A-002",
		embedding: Some("[0,1,0]"),
		..Default::default()
	})
	.await;
	service.update_profile(&event("client-1", 1, "click")).await.expect("Update failed.");
	service.update_profile(&event("client-1", 2, "save")).await.expect("Update failed.");

	let (vector, weight) = profile_row(pool, "client-1").await.expect("Profile is missing.");
	let vector = suite::parse_vector(&vector.expect("Profile vector is null."));

	// (v1 * 1 + v2 * 3) / 4.
	assert!((vector[0] - 0.25).abs() < 1e-6);
	assert!((vector[1] - 0.75).abs() < 1e-6);
	assert_eq!(vector[2], 0.0);
	assert_eq!(weight, 4.0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
