use axum::{
	Json, Router,
	extract::{Query, Request, State},
	http::{HeaderMap, HeaderValue, Method, StatusCode, header},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use scout_service::{
	Error as ServiceError, HistoryRequest, HistoryResponse, LOCATION_REQUIRED, SearchRequest,
	SearchResponse, StatusRequest, StatusResponse, SubmitRequest, SubmitResponse,
};

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, Default, Deserialize)]
struct StatusQuery {
	#[serde(default, alias = "requestId")]
	request_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
	#[serde(default, alias = "userId")]
	user_id: Option<String>,
	#[serde(default)]
	limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => {
				let fields = (message == LOCATION_REQUIRED)
					.then(|| vec!["$.search_params.location".to_string()]);

				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, fields)
			},
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "conflict", message, None),
			ServiceError::Provider { message } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "provider_error", message, None),
			ServiceError::Storage { message } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", message, None),
			ServiceError::Dispatch { message } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "dispatch_error", message, None),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search/submit", post(submit))
		.route("/v1/search/status", get(status))
		.route("/v1/search", post(search))
		.route("/v1/history", get(history))
		.fallback(not_found)
		.layer(middleware::from_fn(cors))
		.with_state(state)
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

/// Answers preflight requests directly and stamps permissive CORS headers on every response.
async fn cors(req: Request, next: Next) -> Response {
	let mut response = if req.method() == Method::OPTIONS {
		StatusCode::OK.into_response()
	} else {
		next.run(req).await
	};

	apply_cors_headers(response.headers_mut());

	response
}

fn apply_cors_headers(headers: &mut HeaderMap) {
	headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
	headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS));
	headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS));
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn not_found() -> ApiError {
	json_error(StatusCode::NOT_FOUND, "not_found", "No such route.", None)
}

async fn submit(
	State(state): State<AppState>,
	Json(payload): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
	let response = state.service.submit(payload).await?;

	Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn status(
	State(state): State<AppState>,
	Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
	let request = StatusRequest { request_id: query.request_id.unwrap_or_default() };
	let response = state.service.status(request).await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn history(
	State(state): State<AppState>,
	Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
	let request = HistoryRequest { user_id: query.user_id.unwrap_or_default(), limit: query.limit };
	let response = state.service.history(request).await?;

	Ok(Json(response))
}
