use reva_service::IngestRequest;

use super::suite::{self, VECTOR_DIM};

fn two_asset_request() -> IngestRequest {
	serde_json::from_value(serde_json::json!({
		"asset_types": [
			{ "id": 1, "name_th": "คอนโด", "name_en": "Condo" }
		],
		"assets": [
			{
				"id": 1,
				"code": "A-001",
				"name_en": "Skyline Condo",
				"asset_type_id": 1,
				"price": 3_200_000.0,
				"bedrooms": 2,
				"latitude": 13.7563,
				"longitude": 100.5018
			},
			{ "id": 2, "code": "A-002", "name_th": "บ้านสวน", "asset_type_id": 1 }
		]
	}))
	.expect("Failed to build ingest request.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn ingest_upserts_types_and_embeds_assets() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!(
			"Skipping ingest_upserts_types_and_embeds_assets; set REVA_PG_DSN to run this test."
		);

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::stub_providers(VECTOR_DIM)).await;
	let first = service.ingest(&two_asset_request()).await.expect("Ingest failed.");

	assert_eq!(first.asset_types_inserted, 1);
	assert_eq!(first.assets_processed, 2);

	let embedded: i64 =
		sqlx::query_scalar("SELECT COUNT(id) FROM assets WHERE embedding IS NOT NULL")
			.fetch_one(&service.db.pool)
			.await
			.expect("Count failed.");

	assert_eq!(embedded, 2);

	// Re-ingesting is an update, not a duplicate.
	let second = service.ingest(&two_asset_request()).await.expect("Ingest failed.");

	assert_eq!(second.asset_types_inserted, 0);
	assert_eq!(second.assets_processed, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn ingested_assets_can_be_read_back_by_id() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!(
			"Skipping ingested_assets_can_be_read_back_by_id; set REVA_PG_DSN to run this test."
		);

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::stub_providers(VECTOR_DIM)).await;

	service.ingest(&two_asset_request()).await.expect("Ingest failed.");

	let asset = service
		.get_asset(1)
		.await
		.expect("Lookup failed.")
		.expect("Asset 1 must exist.");

	assert_eq!(asset.code, "A-001");
	assert_eq!(asset.name.as_deref(), Some("Skyline Condo"));
	assert_eq!(asset.price, Some(3_200_000.0));

	assert!(service.get_asset(999).await.expect("Lookup failed.").is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn embedding_outage_degrades_to_rows_without_vectors() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!(
			"Skipping embedding_outage_degrades_to_rows_without_vectors; \
			 set REVA_PG_DSN to run this test."
		);

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::failing_providers()).await;
	let report = service.ingest(&two_asset_request()).await.expect("Ingest failed.");

	assert_eq!(report.assets_processed, 2);

	let embedded: i64 =
		sqlx::query_scalar("SELECT COUNT(id) FROM assets WHERE embedding IS NOT NULL")
			.fetch_one(&service.db.pool)
			.await
			.expect("Count failed.");

	assert_eq!(embedded, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set REVA_PG_DSN to run."]
async fn half_a_coordinate_pair_is_rejected() {
	let Some(test_db) = suite::test_db().await else {
		eprintln!("Skipping half_a_coordinate_pair_is_rejected; set REVA_PG_DSN to run this test.");

		return;
	};
	let cfg = suite::test_config(test_db.dsn().to_string(), VECTOR_DIM);
	let service = suite::build_service(cfg, suite::stub_providers(VECTOR_DIM)).await;
	let request: IngestRequest = serde_json::from_value(serde_json::json!({
		"assets": [ { "id": 1, "code": "A-001", "latitude": 13.7563 } ]
	}))
	.expect("Failed to build ingest request.");
	let err = service.ingest(&request).await.expect_err("Ingest should fail.");

	assert!(matches!(err, reva_service::ServiceError::InvalidRequest { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
