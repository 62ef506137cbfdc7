//! `vdetect` command-line uploader.
//!
//! Sends an image or video to the detection backend, shows upload and
//! processing progress, prints the detection summary and saves the
//! annotated result. With `--frame`, runs single-frame detection on an
//! image instead.

mod logging;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use vdetect_client::{ClientConfig, DetectClient};
use vdetect_models::{MediaKind, SelectedFile};
use vdetect_ui::UploadController;

use crate::terminal::{render_frame_text, OutputFormat, TerminalSurface};

/// Exit status used after Ctrl-C.
const INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "vdetect", version, about = "Upload an image or video for object detection")]
struct Cli {
    /// Image or video file to upload
    file: PathBuf,

    /// Backend base URL
    #[arg(long, env = "VDETECT_SERVER_URL")]
    server: Option<String>,

    /// Directory the annotated result is saved to
    #[arg(long, short, env = "VDETECT_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Print the summary without downloading the result
    #[arg(long)]
    no_download: bool,

    /// Print the result view as JSON
    #[arg(long, conflicts_with = "html")]
    json: bool,

    /// Print the result view as HTML fragments
    #[arg(long)]
    html: bool,

    /// Run single-frame detection on an image; nothing is saved
    #[arg(long)]
    frame: bool,
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.html {
            OutputFormat::Html
        } else {
            OutputFormat::Text
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env_with_server(cli.server.as_deref())
        .context("Invalid client configuration")?;
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = build_config(&cli)?;
    info!(server = %config.server_url, "Starting vdetect");

    let client = DetectClient::new(config.clone()).context("Failed to build HTTP client")?;

    let file = SelectedFile::from_path(&cli.file)
        .await
        .with_context(|| format!("Cannot read {}", cli.file.display()))?;

    if cli.frame {
        return detect_frame(&client, &file, cli.json).await;
    }

    let controller = UploadController::new(TerminalSurface::new(cli.output_format()), client.clone());
    controller.initialize();

    tokio::select! {
        outcome = upload_and_show(&controller, file) => {
            if !outcome {
                return Ok(ExitCode::FAILURE);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted");
            controller.reset_view();
            return Ok(ExitCode::from(INTERRUPTED));
        }
    }

    if cli.no_download || !controller.download_current_result() {
        return Ok(ExitCode::SUCCESS);
    }

    if let Some((url, _)) = controller.surface().take_download() {
        let path = client
            .download(&url, &config.output_dir)
            .await
            .context("Failed to download result")?;
        println!("Saved result to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

async fn detect_frame(client: &DetectClient, file: &SelectedFile, json: bool) -> Result<ExitCode> {
    if file.media_kind() != Some(MediaKind::Image) {
        anyhow::bail!("--frame needs an image file, got {}", file.mime_type);
    }

    let image = file.read_bytes().await.context("Failed to read image")?;
    let frame = client
        .detect_frame(&image)
        .await
        .context("Frame detection failed")?;

    if !frame.success {
        anyhow::bail!(
            "Frame detection failed: {}",
            frame.error.as_deref().unwrap_or("unknown error")
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    } else {
        print!("{}", render_frame_text(&frame));
    }
    Ok(ExitCode::SUCCESS)
}

/// Upload `file` and wait for the result view. The surface has already
/// shown any error by the time this returns `false`.
async fn upload_and_show(
    controller: &UploadController<TerminalSurface, DetectClient>,
    file: SelectedFile,
) -> bool {
    match controller.validate_and_upload(file).await {
        Ok(()) => controller.wait_for_result().await,
        Err(e) => {
            warn!("Upload did not complete: {}", e);
            false
        }
    }
}
