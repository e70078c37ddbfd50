use std::{error::Error, fs::OpenOptions, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use cashflow::{
    AppState, OpenAiCompatibleClient, ProviderConfig, build_router, graceful_shutdown,
    logging_middleware,
};

/// The web server for CashFlow.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical timezone used for displaying dates, e.g. "Asia/Shanghai".
    #[arg(long, env = "LOCAL_TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// The secret used to derive the key for encrypting cookies.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    secret: String,

    /// The API key for the language model provider. AI input is disabled without one.
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    ai_api_key: Option<String>,

    /// The root URL of an OpenAI-compatible API.
    #[arg(long, env = "AI_BASE_URL", default_value = ProviderConfig::DEFAULT_BASE_URL)]
    ai_base_url: String,

    /// The model to ask.
    #[arg(long, env = "AI_MODEL", default_value = ProviderConfig::DEFAULT_MODEL)]
    ai_model: String,

    /// How many seconds to wait for the model before giving up.
    #[arg(long, env = "AI_TIMEOUT_SECS", default_value_t = 30)]
    ai_timeout_secs: u64,

    /// Log full request and response bodies (passwords are redacted).
    #[arg(long)]
    log_bodies: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging()?;

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let provider_config = ProviderConfig {
        api_key: args.ai_api_key.filter(|key| !key.trim().is_empty()),
        base_url: args.ai_base_url,
        model: args.ai_model,
        timeout: Duration::from_secs(args.ai_timeout_secs),
    };
    if provider_config.api_key.is_none() {
        tracing::warn!("AI_API_KEY is not set, AI input will not record transactions");
    }
    tracing::debug!("Using language model provider {provider_config:?}");
    let completion_client = Arc::new(OpenAiCompatibleClient::new(provider_config));

    let conn = Connection::open(&args.db_path)?;
    let state = AppState::new(conn, &args.secret, &args.timezone, completion_client)?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let mut router = build_router(state);
    if args.log_bodies {
        router = router.layer(axum::middleware::from_fn(logging_middleware));
    }
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they happen.
        .on_failure(());

    router.layer(tracing_layer)
}
