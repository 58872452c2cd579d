//! Video Comment Sentiment Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use video_comment_sentiment::{api, bootstrap, config::AppConfig, metrics::Metrics};

/// Install a tracing subscriber; `LOG_FORMAT=json` switches to JSON lines.
/// No-op when a global subscriber is already set by the runtime.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("video_comment_sentiment=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load()?;
    let state = bootstrap::build_state(&cfg)?;
    let metrics = Metrics::init()?;

    let router = api::router(state).merge(metrics.router());
    Ok(router.into())
}
