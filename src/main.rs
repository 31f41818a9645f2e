use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use livability_api::config::Config;
use livability_api::evaluator::Evaluator;
use livability_api::handlers::{self, AppState};

/// Maximum accepted request body (1 MiB).
const MAX_BODY_BYTES: usize = 1024 * 1024;

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    match &config.cors_allowed_origin {
        Some(origin) => Ok(CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])),
        None => Ok(CorsLayer::permissive()),
    }
}

/// Main entry point for the application.
///
/// Initializes tracing and configuration, wires the evaluation pipeline to
/// its upstream APIs, then serves the HTTP routes behind CORS, body size and
/// per-IP rate limits.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "livability_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let evaluator = Evaluator::from_config(&config)?;
    tracing::info!(
        "Evaluation pipeline ready (crime month {}, building radius {}m)",
        config.crime_reference_month,
        config.building_radius_m
    );

    let app_state = Arc::new(AppState {
        evaluator: Arc::new(evaluator),
    });

    tracing::info!(
        "Rate limit: {} req/s per IP, burst {}",
        config.rate_limit_per_second,
        config.rate_limit_burst
    );
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .period(config.replenish_interval())
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = handlers::evaluation_routes(app_state).layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
