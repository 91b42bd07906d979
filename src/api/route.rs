use crate::{
    api::{error::ApiError, response::ApiResponse},
    models::{AddressTransactionsResponse, CurrentBlockResponse},
    state::AppState,
    validation::validate_address,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/block/current", get(get_current_block))
        .route("/block/parsed", get(get_parsed_block))
        .route("/transactions/{address}", get(get_transactions))
        .route("/subscribe/{address}", post(subscribe_address))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn health_check() -> &'static str {
    "OK"
}

// GET /block/current handler
async fn get_current_block(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<CurrentBlockResponse>, ApiError> {
    let block_number = state.source.current_height().await?;
    Ok(ApiResponse::ok(CurrentBlockResponse { block_number }))
}

// GET /block/parsed handler
async fn get_parsed_block(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<CurrentBlockResponse>, ApiError> {
    let block_number = state.progress.get().await?;
    Ok(ApiResponse::ok(CurrentBlockResponse { block_number }))
}

// GET /transactions/{address} handler
async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<AddressTransactionsResponse>, ApiError> {
    let address = validate_address(&address)?;

    let transactions = state.store.get_transactions(address.as_str()).await?;
    info!("Fetched {} transactions for {}", transactions.len(), address);

    Ok(ApiResponse::ok(AddressTransactionsResponse { transactions }))
}

// POST /subscribe/{address} handler
async fn subscribe_address(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    let address = validate_address(&address)?;

    state.registry.subscribe(address.as_str()).await?;
    info!("Subscribed address {}", address);

    Ok(StatusCode::ACCEPTED.into_response())
}
