use crate::errors::AppError;
use crate::evaluator::Evaluator;
use crate::models::*;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validation, aggregation and scoring pipeline.
    pub evaluator: Arc<Evaluator>,
}

/// Health check endpoint.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "livability-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /get_single_address_probability
///
/// Scores one address. A rejected address is answered with 200 and the
/// rejection message as a JSON string.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - JSON body with `requested_address`.
///
/// # Returns
///
/// * `Result<Json<SingleAddressResponse>, AppError>` - `{rating, score}`, the rejection message, or a 502 when geocoding is unavailable.
pub async fn get_single_address_probability(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SingleAddressRequest>,
) -> Result<Json<SingleAddressResponse>, AppError> {
    tracing::info!(
        "POST /get_single_address_probability - address: {}",
        request.requested_address
    );

    let response = state
        .evaluator
        .evaluate_single(&request.requested_address)
        .await?;

    Ok(Json(response))
}

/// POST /get_many_addresses_probability
///
/// Scores a list of addresses. The response holds one entry per input, in
/// input order.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `request` - JSON body with `requested_addresses`.
///
/// # Returns
///
/// * `Json<Vec<BatchEntry>>` - `{address, data}` per input, where `data` is `{rating, score}` or `{error}`. Always 200.
pub async fn get_many_addresses_probability(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ManyAddressesRequest>,
) -> Json<Vec<BatchEntry>> {
    tracing::info!(
        "POST /get_many_addresses_probability - {} addresses",
        request.requested_addresses.len()
    );

    let entries = state
        .evaluator
        .evaluate_many(&request.requested_addresses)
        .await;

    let rejected = entries
        .iter()
        .filter(|e| e.data.evaluation().is_none())
        .count();
    tracing::info!(
        "Batch finished: {} evaluated, {} rejected",
        entries.len() - rejected,
        rejected
    );

    Json(entries)
}

/// The two evaluation endpoints with state applied.
pub fn evaluation_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/get_single_address_probability",
            post(get_single_address_probability),
        )
        .route(
            "/get_many_addresses_probability",
            post(get_many_addresses_probability),
        )
        .with_state(state)
}

/// Health check plus evaluation routes, without middleware.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(evaluation_routes(state))
}
