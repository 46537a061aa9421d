use anyhow::{Context, Result};
use clap::Parser;
use signlink::{config::Config, web::serve};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signlink")]
#[command(about = "Real-time sign language gesture recognition service")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Number of worker threads
    #[arg(long)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Model directory path
    #[arg(long, default_value = "models")]
    models_dir: String,

    /// Gesture classifier model (overrides models dir)
    #[arg(long, env = "SIGNLANG_MODEL_PATH")]
    model_path: Option<String>,

    /// Label manifest (overrides models dir)
    #[arg(long, env = "SIGNLANG_LABELS_PATH")]
    labels_path: Option<String>,

    /// Hand landmark model (overrides models dir)
    #[arg(long, env = "SIGNLANG_LANDMARK_MODEL_PATH")]
    landmark_model_path: Option<String>,

    /// Quiz question seed file (JSON array)
    #[arg(long)]
    questions: Option<String>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting sign language recognition service...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Models directory: {}", args.models_dir);

    let config = Config::new(args.bind, args.models_dir, args.workers, args.dev)?
        .with_model_path(args.model_path)
        .with_labels_path(args.labels_path)
        .with_landmark_model_path(args.landmark_model_path)
        .with_questions_path(args.questions);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(config))?;

    Ok(())
}
