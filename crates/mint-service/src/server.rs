//! HTTP server for the signature mint API.
//!
//! Routes live under `/api`. Handlers delegate to the `apis` modules and turn
//! their [`APIError`]s into JSON error bodies with matching status codes.

use axum::{
	extract::{Path, State},
	http::{HeaderValue, Method},
	response::Json,
	routing::{get, post},
	Router,
};
use mint_config::ApiConfig;
use mint_core::MintEngine;
use mint_types::{
	APIError, AuthorizationResponse, BalanceResponse, IssueAuthorizationRequest, ProtocolInfo,
	SubmitMintRequest, SubmitMintResponse,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Engine serving every request.
	pub engine: Arc<MintEngine>,
}

/// Builds the API router.
pub fn router(api_config: &ApiConfig, engine: Arc<MintEngine>) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/protocol", get(handle_protocol))
				.route("/authorizations", post(handle_issue_authorization))
				.route("/mints", post(handle_submit_mint))
				.route("/balances/{address}", get(handle_get_balance)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(&api_config.allowed_origins)),
		)
		.with_state(AppState { engine })
}

/// Permissive CORS unless specific origins are configured.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
	if allowed_origins.is_empty() {
		return CorsLayer::permissive();
	}

	let origins: Vec<HeaderValue> = allowed_origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(_) => {
				tracing::warn!("Ignoring invalid CORS origin: {}", origin);
				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods([Method::GET, Method::POST])
		.allow_headers(Any)
}

/// Starts the HTTP server and serves until it fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<MintEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, engine);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Signature mint API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles GET /api/protocol requests.
async fn handle_protocol(State(state): State<AppState>) -> Json<ProtocolInfo> {
	Json(crate::apis::protocol::protocol_info(&state.engine))
}

/// Handles POST /api/authorizations requests.
async fn handle_issue_authorization(
	State(state): State<AppState>,
	Json(request): Json<IssueAuthorizationRequest>,
) -> Result<Json<AuthorizationResponse>, APIError> {
	match crate::apis::authorization::issue_authorization(&state.engine, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Authorization request failed: {}", e);
			Err(e)
		},
	}
}

/// Handles POST /api/mints requests.
///
/// Runs the signature mint as a transaction from the request's caller and
/// returns the committed events.
async fn handle_submit_mint(
	State(state): State<AppState>,
	Json(request): Json<SubmitMintRequest>,
) -> Result<Json<SubmitMintResponse>, APIError> {
	match crate::apis::mint::submit_mint(&state.engine, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Mint submission failed: {}", e);
			Err(e)
		},
	}
}

/// Handles GET /api/balances/{address} requests.
async fn handle_get_balance(
	Path(address): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, APIError> {
	crate::apis::balance::get_balance(&state.engine, &address)
		.await
		.map(Json)
}
