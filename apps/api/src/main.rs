mod config;
mod errors;
mod models;
mod routes;
mod scoring;
mod state;
mod workflow;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::scoring::{http::attempt_timeout, FitScorer, HttpFitScorer, RandomFitScorer};
use crate::state::AppState;
use crate::workflow::store::SessionStore;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AutoApply API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize fit scorer (RandomFitScorer unless SCORING_SERVICE_URL is set)
    let fit_scorer = build_fit_scorer(&config)?;

    let timing = config.analysis_timing();
    info!(
        "Analysis delay {}ms, scoring timeout {}s",
        timing.delay.as_millis(),
        timing.scoring_timeout.as_secs()
    );

    // In-memory sessions; idle ones are pruned in the background
    let sessions = SessionStore::new();
    let _pruner = sessions.spawn_pruner(config.session_ttl(), PRUNE_INTERVAL);

    let state = AppState {
        config: config.clone(),
        fit_scorer,
        sessions,
    };

    let cors = cors_layer(&config.cors_allowed_origins)?;
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_fit_scorer(config: &Config) -> Result<Arc<dyn FitScorer>> {
    match &config.scoring_service_url {
        Some(url) => {
            let budget = config.analysis_timing().scoring_timeout;
            let scorer = HttpFitScorer::new(url.clone(), attempt_timeout(budget))?;
            info!("Fit scorer: http ({})", scorer.endpoint());
            Ok(Arc::new(scorer))
        }
        None => {
            info!("Fit scorer: random placeholder");
            Ok(Arc::new(RandomFitScorer))
        }
    }
}

/// Permissive when no origins are configured; otherwise only the listed origins.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        info!("CORS: any origin");
        return Ok(CorsLayer::permissive());
    }

    let allowed = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("CORS_ALLOWED_ORIGINS has an invalid origin: {origin}"))
        })
        .collect::<Result<Vec<_>>>()?;
    info!("CORS: {} allowed origins", allowed.len());

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any))
}
