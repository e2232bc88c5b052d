use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use sa_agent::{Agent, AgentConfig};
use sa_domain::config::{Config, CorsConfig};
use sa_gateway::api;
use sa_gateway::runtime::session_lock::LaneLock;
use sa_gateway::state::{AppState, APP_NAME};
use sa_memory::{InMemoryMemoryService, MemoryExtractor, ThresholdExtractionTrigger};
use sa_providers::EchoModel;
use sa_runner::Runner;
use sa_sessions::{InMemorySessionService, ThresholdSummarizer};
use sa_tools::{AddTool, ToolRegistry};

/// SerialAgent gateway — the HTTP boundary for a single agent deployment.
///
/// Startup is intentionally this small: no subcommands, no doctor or
/// pairing flows. Config lives in one TOML file; everything else is
/// derived from it.
#[derive(Debug, Parser)]
#[command(name = "serialagent", version)]
struct Cli {
    /// Path to the TOML config file. Defaults to `config.toml` in the
    /// working directory if present, otherwise built-in defaults apply.
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Overrides `[server] host:port` from the config file, e.g. `0.0.0.0:9000`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = load_config(&cli.config)?;
    if let Some(bind) = &cli.bind {
        let (host, port) = bind.rsplit_once(':').context("--bind must be HOST:PORT")?;
        config.server.host = host.to_string();
        config.server.port = port.parse().context("--bind port must be a number")?;
    }

    run_server(Arc::new(config)).await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sa_gateway=debug")))
        .json()
        .init();
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
        toml::from_str(&raw).with_context(|| format!("parsing {path}"))
    } else {
        tracing::info!(path, "no config file found, using defaults");
        Ok(Config::default())
    }
}

async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("serialagent gateway starting");

    let model = Arc::new(EchoModel::new());

    let memory: Arc<dyn sa_memory::Service> = Arc::new(InMemoryMemoryService::new());

    let mut tools = ToolRegistry::new();
    tools.register(AddTool);
    for tool in memory.clone().tools() {
        tools.register_arc(tool);
    }

    let agent = Arc::new(Agent::new(model, tools, AgentConfig::from(&config.agent)));

    let sessions: Arc<dyn sa_sessions::Service> = Arc::new(InMemorySessionService::new());
    let summarizer = Arc::new(ThresholdSummarizer::new(config.sessions.summarizer.clone()));
    let memory_trigger = Arc::new(ThresholdExtractionTrigger::new(config.memory.extractor.clone()));

    let extractor = if config.memory.extractor.enabled {
        tracing::info!(workers = config.memory.extractor.async_workers, "memory extraction enabled");
        Some(Arc::new(MemoryExtractor::spawn(
            memory.clone(),
            config.memory.extractor.async_workers,
            config.memory.extractor.queue_size,
            Duration::from_millis(config.memory.extractor.job_timeout_ms),
        )))
    } else {
        None
    };

    let runner = Arc::new(Runner::new(APP_NAME, agent, sessions, memory, summarizer, memory_trigger, extractor));
    let lane_lock = Arc::new(LaneLock::new());

    let state = AppState { config: config.clone(), runner, lane_lock };

    let app = api::router(&state)
        .layer(build_cors_layer(&config.server.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "serialagent gateway listening");

    axum::serve(listener, app).await.context("axum server error")?;
    Ok(())
}

/// Builds a [`CorsLayer`] from the configured allowed origins. An origin
/// ending in `:*` matches any numeric port on that host/scheme.
fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    use axum::http::header;

    if cors.allowed_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured with wildcard \"*\" — all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
    }

    let mut exact: Vec<HeaderValue> = Vec::new();
    let mut wildcard_prefixes: Vec<String> = Vec::new();

    for origin in &cors.allowed_origins {
        if let Some(prefix) = origin.strip_suffix('*') {
            wildcard_prefixes.push(prefix.to_owned());
        } else if let Ok(hv) = origin.parse::<HeaderValue>() {
            exact.push(hv);
        } else {
            tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
        }
    }

    let allow_origin = if wildcard_prefixes.is_empty() {
        AllowOrigin::list(exact)
    } else {
        AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            if exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
                return true;
            }
            wildcard_prefixes.iter().any(|prefix| {
                origin_str.strip_prefix(prefix.as_str()).map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit())).unwrap_or(false)
            })
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
