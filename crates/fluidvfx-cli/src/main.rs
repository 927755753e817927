//! FluidVFX command line.

mod prompt;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fluidvfx_genai::{CredentialSlot, GenAiConfig, GenerationClient, InputImage, VideoDownloader};
use fluidvfx_models::{SceneCatalog, WorkflowStep};
use fluidvfx_workflow::{Transition, WorkflowController};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::prompt::TerminalCredentials;

#[derive(Parser)]
#[command(name = "fluidvfx")]
#[command(about = "Blend a photo into a cinematic scene and animate it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available scenes
    Scenes,

    /// Print the JSON Schema of the scene catalog format
    Schema,

    /// Generate a video from a photo
    Run {
        /// Photo to blend into the scene
        photo: PathBuf,

        /// Scene id (see `fluidvfx scenes`)
        #[arg(short, long)]
        scene: String,

        /// Directory the video is saved to
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Print the video reference instead of downloading it
        #[arg(long)]
        no_download: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scenes => list_scenes(),
        Commands::Schema => print_schema(),
        Commands::Run {
            photo,
            scene,
            output,
            no_download,
        } => {
            init_metrics()?;
            run(&photo, &scene, &output, no_download).await
        }
    }
}

/// Colored output for terminals, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fluidvfx=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Serve Prometheus metrics when `METRICS_LISTEN_ADDR` is set.
fn init_metrics() -> Result<()> {
    let Ok(addr) = std::env::var("METRICS_LISTEN_ADDR") else {
        return Ok(());
    };
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid METRICS_LISTEN_ADDR: {}", addr))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!(%addr, "Metrics exporter listening");
    Ok(())
}

fn load_catalog() -> Result<SceneCatalog> {
    SceneCatalog::from_env().context("Failed to load scene catalog")
}

fn list_scenes() -> Result<()> {
    let catalog = load_catalog()?;
    for scene in catalog.iter() {
        println!("{:<12} {}", scene.id.as_str(), scene.label());
        println!("{:<12} {}", "", scene.description);
    }
    Ok(())
}

fn print_schema() -> Result<()> {
    let schema = SceneCatalog::json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

async fn run(photo: &Path, scene: &str, output: &Path, no_download: bool) -> Result<()> {
    let catalog = Arc::new(load_catalog()?);
    if !catalog.contains(scene) {
        bail!("Unknown scene '{}'. Run `fluidvfx scenes` to list them.", scene);
    }

    let config = GenAiConfig::from_env();
    let slot = Arc::new(CredentialSlot::from_env());
    let credentials = Arc::new(TerminalCredentials::new(slot));
    let client = GenerationClient::from_config(config.clone(), credentials)
        .context("Failed to create generation client")?;

    let mut controller = WorkflowController::new(catalog, client);
    let printer = tokio::spawn(print_progress(controller.subscribe_progress()));

    let image = InputImage::from_path(photo).await?;
    expect_applied(controller.select_input(image), &controller)?;
    expect_applied(controller.advance(), &controller)?;
    expect_applied(controller.choose_scene(scene), &controller)?;

    info!(
        session_id = %controller.session().id(),
        scene,
        photo = %photo.display(),
        "Starting generation"
    );

    drive(&mut controller, WorkflowStep::ConfirmComposite).await?;
    drive(&mut controller, WorkflowStep::Complete).await?;

    printer.abort();

    let offer = controller
        .download_offer()
        .context("Video finished without a download reference")?;

    if no_download {
        println!("{}", offer.reference);
        return Ok(());
    }

    let destination = output.join(offer.suggested_filename);
    let downloader = VideoDownloader::from_config(&config)?;
    let bytes = downloader.download(&offer.reference, &destination).await?;
    println!("Saved {} ({} bytes)", destination.display(), bytes);
    Ok(())
}

/// Run the generation step that leads to `target`.
///
/// A rejected API key triggers one reselection and one retry. Ctrl-C
/// abandons the request.
async fn drive(controller: &mut WorkflowController, target: WorkflowStep) -> Result<()> {
    let mut retried = false;

    loop {
        let outcome = tokio::select! {
            transition = generate(controller, target) => Some(transition),
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(transition) = outcome else {
            controller.abandon();
            bail!("Interrupted");
        };

        match transition {
            Transition::Applied(step) if step == target => return Ok(()),
            Transition::RolledBack(_) => {
                let Some(failure) = controller.session().error().cloned() else {
                    bail!("Generation failed");
                };

                if failure.needs_credential_reselect() && !retried {
                    warn!("API key rejected: {}", failure);
                    // The rollback step is the starting step of the same
                    // generation, so it can be retried as is.
                    if controller.reselect_credential().await.is_applied() {
                        retried = true;
                        continue;
                    }
                }

                bail!("{} ({})", failure, failure.kind());
            }
            other => bail!("Unexpected transition: {:?}", other),
        }
    }
}

async fn generate(controller: &mut WorkflowController, target: WorkflowStep) -> Transition {
    match target {
        WorkflowStep::ConfirmComposite => controller.generate_composite().await,
        _ => controller.generate_video().await,
    }
}

fn expect_applied(transition: Transition, controller: &WorkflowController) -> Result<()> {
    match transition {
        Transition::Applied(_) => Ok(()),
        Transition::Ignored(violation) => bail!("{}", violation),
        Transition::RolledBack(_) => match controller.session().error() {
            Some(failure) => bail!("{}", failure),
            None => bail!("Step failed"),
        },
    }
}

async fn print_progress(mut progress: watch::Receiver<Option<String>>) {
    while progress.changed().await.is_ok() {
        if let Some(message) = progress.borrow_and_update().clone() {
            eprintln!("  {}", message);
        }
    }
}
