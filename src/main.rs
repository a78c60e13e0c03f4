use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scribe_live::auth::HmacTokenVerifier;
use scribe_live::config::Config;
use scribe_live::finalize::FinalizationPipeline;
use scribe_live::http::{create_router, AppState};
use scribe_live::llm::ChatTextService;
use scribe_live::session::SessionManager;
use scribe_live::storage::HttpObjectStore;
use scribe_live::store::MemoryStore;
use scribe_live::stt::{HttpBatchTranscriber, RealtimeTranscriber};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Realtime transcription session service
#[derive(Debug, Parser)]
#[command(name = "scribe-live", version)]
struct Args {
    /// Path to a TOML config file (defaults to config/scribe-live.toml)
    #[arg(long)]
    config: Option<String>,

    /// Override the bind address, e.g. 127.0.0.1:9090
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;

    let addr = match args.bind {
        Some(bind) => bind,
        None => format!("{}:{}", cfg.service.bind, cfg.service.port),
    };

    let verifier = Arc::new(HmacTokenVerifier::new(&cfg.auth.token_secret));
    let store = Arc::new(MemoryStore::new());
    let streaming = Arc::new(RealtimeTranscriber::new(&cfg.stt));
    let batch = Arc::new(HttpBatchTranscriber::new(&cfg.stt)?);
    let text = Arc::new(ChatTextService::new(&cfg.llm)?);
    let storage = Arc::new(HttpObjectStore::new(&cfg.storage));

    let finalizer = FinalizationPipeline::new(storage, batch, text.clone(), store.clone());
    let manager = Arc::new(SessionManager::new(
        &cfg.stt,
        verifier.clone(),
        store.clone(),
        streaming,
        text,
        finalizer,
    ));
    let state = AppState::new(manager, store, verifier);

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
