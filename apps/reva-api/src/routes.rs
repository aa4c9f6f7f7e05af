use axum::{
	Json, Router,
	extract::{Path, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use reva_service::{
	AssetResult, ChatRequest, ChatResponse, IngestReport, IngestRequest, SearchRequest,
	SearchResponse, ServiceError, TrackRequest,
};

use crate::state::AppState;

const CLIENT_ID_HEADER: &str = "x-client-id";

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/assets/{asset_id}", get(get_asset))
		.route("/v1/recommend/item/{asset_id}", get(recommend_item))
		.route("/v1/recommend/user", get(recommend_user))
		.route("/v1/recommend/track", post(track))
		.route("/v1/chat", post(chat))
		.route("/v1/chat/ai", post(chat_session))
		.route("/v1/ingest", post(ingest))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(&payload).await?;

	Ok(Json(response))
}

async fn get_asset(
	State(state): State<AppState>,
	Path(asset_id): Path<i64>,
) -> Result<Json<AssetResult>, ApiError> {
	let asset = state.service.get_asset(asset_id).await?.ok_or_else(|| {
		json_error(StatusCode::NOT_FOUND, "not_found", format!("Asset {asset_id} not found."))
	})?;

	Ok(Json(asset))
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.chat(&payload).await?;

	Ok(Json(response))
}

async fn chat_session(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.chat_session(&payload).await?;

	Ok(Json(response))
}

async fn recommend_item(
	State(state): State<AppState>,
	Path(asset_id): Path<i64>,
) -> Result<Json<Vec<AssetResult>>, ApiError> {
	let results = state.service.recommend_items(asset_id).await?;

	if results.is_empty() {
		return Err(json_error(
			StatusCode::NOT_FOUND,
			"not_found",
			format!("No recommendations for asset {asset_id}."),
		));
	}

	Ok(Json(results))
}

async fn recommend_user(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<Vec<AssetResult>>, ApiError> {
	let client_id = client_id(&headers)?;
	let results = state.service.recommend_for_user(&client_id).await?;

	Ok(Json(results))
}

#[derive(Debug, Deserialize)]
struct TrackBody {
	asset_id: i64,
	action: String,
}

#[derive(Debug, Serialize)]
struct TrackAck {
	status: &'static str,
}

async fn track(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<TrackBody>,
) -> Result<(StatusCode, Json<TrackAck>), ApiError> {
	let client_id = client_id(&headers)?;

	state.tracker.enqueue(TrackRequest {
		client_id,
		asset_id: payload.asset_id,
		action: payload.action,
	});

	Ok((StatusCode::ACCEPTED, Json(TrackAck { status: "received" })))
}

async fn ingest(
	State(state): State<AppState>,
	Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestReport>, ApiError> {
	let report = state.service.ingest(&payload).await?;

	Ok(Json(report))
}

fn client_id(headers: &HeaderMap) -> Result<String, ApiError> {
	headers
		.get(CLIENT_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(str::to_string)
		.ok_or_else(|| {
			json_error(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				"The X-Client-ID header is required.",
			)
		})
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidRequest { .. } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::EmbeddingUnavailable { .. } =>
				json_error(StatusCode::SERVICE_UNAVAILABLE, "embedding_unavailable", message),
			ServiceError::Provider { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "provider_error", message),
			ServiceError::Storage { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
