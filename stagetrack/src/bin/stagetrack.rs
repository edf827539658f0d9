use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stagetrack::config::AppConfig;
use stagetrack::errors::TrackerError;
use stagetrack::events::LoggingEventSink;
use stagetrack::graph::reference_pipeline;
use stagetrack::observability::{init_tracing, LogFormat};
use stagetrack::render::TextDiagramAdapter;
use stagetrack::simulation::{RunState, SimulationDriver, TriggerEvent};
use stagetrack::upload::{HttpUploadCollaborator, UploadSession};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "stagetrack")]
#[command(about = "Track a document-processing pipeline stage by stage", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate the reference pipeline without uploading anything
    Simulate {
        /// Milliseconds between steps
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Upload a document, then track the pipeline while it is processed
    Upload {
        /// PDF or image to extract
        file: PathBuf,

        /// Extraction endpoint URL
        #[arg(long)]
        endpoint: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    config
        .with_env_overrides()
        .context("Invalid STAGETRACK_* environment override")
}

/// Waits for the run to finish, cancelling it on Ctrl-C.
async fn follow(driver: &SimulationDriver) -> RunState {
    follow_until(driver, tokio::signal::ctrl_c()).await
}

/// Waits for the run to finish, cancelling it if `interrupt` fires first.
///
/// An interrupt that resolves to an error (no signal handler) is ignored.
async fn follow_until(
    driver: &SimulationDriver,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> RunState {
    tokio::select! {
        state = driver.wait() => state,
        Ok(()) = interrupt => {
            driver.cancel("interrupted");
            driver.state()
        }
    }
}

async fn simulate(config: AppConfig, interval_ms: Option<u64>) -> RunState {
    let mut tracker = config.tracker;
    if let Some(ms) = interval_ms {
        tracker = tracker.with_step_interval_ms(ms);
    }

    let driver = SimulationDriver::new(reference_pipeline(), &tracker)
        .with_adapter(Arc::new(TextDiagramAdapter::stdout()))
        .with_event_sink(Arc::new(LoggingEventSink::debug()));
    driver.trigger(TriggerEvent::new("cli"));
    follow(&driver).await
}

async fn upload(
    config: AppConfig,
    file: PathBuf,
    endpoint: Option<String>,
) -> Result<RunState, TrackerError> {
    let mut upload = config.upload;
    if let Some(endpoint) = endpoint {
        upload = upload.with_endpoint(endpoint);
    }

    let collaborator = HttpUploadCollaborator::new(upload)?;
    let driver = Arc::new(
        SimulationDriver::new(reference_pipeline(), &config.tracker)
            .with_adapter(Arc::new(TextDiagramAdapter::stdout()))
            .with_event_sink(Arc::new(LoggingEventSink::debug())),
    );
    let session = UploadSession::new(Arc::new(collaborator), driver.clone());
    session.select(file);

    let result = session.upload().await?;
    let state = follow(&driver).await;
    println!("{:#}", result.payload);
    Ok(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(format);

    let config = load_config(cli.config.as_ref())?;
    let state = match cli.command {
        Commands::Simulate { interval_ms } => simulate(config, interval_ms).await,
        Commands::Upload { file, endpoint } => upload(config, file, endpoint)
            .await
            .context("Upload failed")?,
    };

    match state {
        RunState::Done { .. } => Ok(()),
        other => anyhow::bail!("Pipeline did not finish: {other}"),
    }
}
