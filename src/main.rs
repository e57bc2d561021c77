//! Vision Logger - interactive session shell
//!
//! Thin presentation stand-in over the library: credential entry, view
//! switching, capture trigger, log rendering and exports. All state is
//! session-scoped and gone on exit.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visionlog::camera::SyntheticCamera;
use visionlog::capture_controller::CaptureOutcome;
use visionlog::config::AppConfig;
use visionlog::export::{save_export, ExportFormat};
use visionlog::state::AppState;
use visionlog::view::{self, AppView};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visionlog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Vision Logger v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::default();
    tracing::info!(
        gemini_base_url = %config.gemini_base_url,
        gemini_model = %config.gemini_model,
        export_dir = %config.export_dir.display(),
        "Configuration loaded"
    );

    let state = AppState::new(config);
    let source = SyntheticCamera::default();

    run_shell(state, source).await
}

async fn run_shell(state: AppState, source: SyntheticCamera) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current_view = AppView::ApiSetup;

    // Credential entry gate. The line buffer is handed to the holder by
    // &mut and comes back cleared.
    println!("Enter your Gemini API key to continue:");
    while !state.credential.is_set().await {
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let mut buffer = line;
        if let Err(e) = state.credential.accept(&mut buffer).await {
            println!("{}", e.user_message());
            println!("Enter your Gemini API key to continue:");
        }
    }

    current_view = enter_camera(&state, &source, current_view).await;
    print_help();

    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => {}
            "capture" => match state.controller.capture_and_analyze().await {
                CaptureOutcome::Logged(id) => {
                    println!("Logged ({} records).", state.log.len().await);
                    tracing::debug!(id = %id, "Shell capture complete");
                }
                CaptureOutcome::Failed(message) => println!("{message}"),
                CaptureOutcome::Ignored => {
                    println!("Capture unavailable in the current state.")
                }
                CaptureOutcome::Discarded => {}
            },
            "camera" => {
                current_view = enter_camera(&state, &source, current_view).await;
            }
            "logs" => {
                // Leaving the capture screen releases the camera
                if current_view == AppView::Camera {
                    state.controller.teardown().await;
                }
                current_view = view::route(state.credential.is_set().await, AppView::History);
                render_log(&state).await;
            }
            "export json" => export(&state, ExportFormat::Json).await,
            "export csv" => export(&state, ExportFormat::Csv).await,
            "clear" => {
                println!("Clear all local logs? This cannot be undone. Type 'yes' to confirm:");
                match lines.next_line().await? {
                    Some(answer) if answer.trim() == "yes" => {
                        state.log.clear().await;
                        println!("Logs cleared.");
                    }
                    _ => println!("Clear cancelled."),
                }
            }
            "quit" => break,
            other => {
                println!("Unknown command: {other}");
                print_help();
            }
        }
    }

    if current_view == AppView::Camera {
        state.controller.teardown().await;
    }
    tracing::info!("Session ended");
    Ok(())
}

async fn enter_camera(state: &AppState, source: &SyntheticCamera, current: AppView) -> AppView {
    let next = view::route(state.credential.is_set().await, AppView::Camera);
    if next != AppView::Camera {
        return current;
    }

    match state.controller.start(source, state.config.facing).await {
        Ok(()) => println!("Camera streaming. Type 'capture' to analyze a frame."),
        Err(e) => println!("{}", e.user_message()),
    }
    next
}

async fn render_log(state: &AppState) {
    let records = state.log.snapshot().await;
    if records.is_empty() {
        println!("No logs available yet. Capture an image to start logging.");
        return;
    }

    println!("Local Logs ({}):", records.len());
    for record in &records {
        println!(
            "[{}] ID: {}  image: {} ({} base64 chars)",
            record.display_timestamp(),
            record.id_label(),
            record.image.media_type,
            record.image.data.len()
        );
        println!("{}", record.description);
        println!();
    }
}

async fn export(state: &AppState, format: ExportFormat) {
    match save_export(&state.config.export_dir, &state.log, format).await {
        Ok(path) => println!("Exported to {}", path.display()),
        Err(e) => println!("Export failed: {e}"),
    }
}

fn print_help() {
    println!(
        "Commands: capture | camera | logs | export json | export csv | clear | quit"
    );
}
