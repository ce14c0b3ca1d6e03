use anyhow::{Context, Result};
use clap::Parser;
use loqa_calls::{
    create_router, spawn_sweeper, AppState, CallOrchestrator, Config, SessionStore,
    StaticPromptResolver,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loqa-calls")]
#[command(about = "Answer calls, record the caller and decide when to hang up")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/loqa-calls")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loqa Calls v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Public URL: {}", cfg.service.public_url);

    let audio_dir = cfg.audio_dir();
    let prompts = StaticPromptResolver::new(&cfg.service.public_url, &audio_dir);
    prompts.verify().with_context(|| {
        format!(
            "Generate the prompt audio with voice {} before starting",
            cfg.prompts.voice
        )
    })?;

    let store = Arc::new(SessionStore::new());
    let _sweeper = spawn_sweeper(Arc::clone(&store), cfg.sweep_policy());

    let orchestrator = Arc::new(CallOrchestrator::new(
        store,
        cfg.call_settings(),
        Arc::new(prompts),
    ));
    let app = create_router(AppState::new(orchestrator, audio_dir));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
