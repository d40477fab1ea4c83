//! Terminal translator
//!
//! Interactive mode: a full-screen text box whose content is submitted to a
//! detect-then-translate pipeline and replaced with the reply. Pipe mode:
//! stdin through the same pipeline, reply on stdout.

mod app;
mod editor;
mod history;
mod llm;
mod session;
mod settings;

use llm::{DetectTranslate, TranslatePipeline};
use settings::Settings;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let debug = std::env::var("TERMTRANS_ENV").is_ok_and(|v| v == "development");
    let interactive = std::io::stdin().is_terminal();

    let path = settings::settings_path(debug)?;
    init_logging(interactive, &path)?;

    let settings = load_or_configure(&path, interactive)?;

    if interactive {
        app::run(&settings).await?;
        return Ok(());
    }

    // Pipe mode: one shot through the pipeline, reply on stdout.
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let input = input.trim();
    if input.is_empty() {
        return Ok(());
    }

    let pipeline = DetectTranslate::from_settings(&settings);
    let reply = pipeline.run(input).await?;
    println!("{reply}");
    Ok(())
}

/// Load settings, falling back to the wizard in interactive mode when the
/// file is missing or unreadable. Pipe mode cannot prompt, so it exits with
/// guidance instead.
fn load_or_configure(
    path: &Path,
    interactive: bool,
) -> Result<Settings, Box<dyn std::error::Error>> {
    if path.exists() {
        match settings::load(path) {
            Ok(settings) => return Ok(settings),
            Err(e) if interactive => {
                eprintln!("Failed to load settings from {}: {e}", path.display());
                println!("Let's re-configure your app.");
            }
            Err(e) => {
                eprintln!("Failed to load settings from {}: {e}", path.display());
                eprintln!("Run 'ttt' in interactive mode to re-configure.");
                return Err(e.into());
            }
        }
    } else if interactive {
        println!("Settings file not found at {}.", path.display());
        println!("Let's configure your app.");
    } else {
        eprintln!("Settings not found at {}", path.display());
        eprintln!("Run 'ttt' in interactive mode first to configure.");
        return Err(Box::from("settings not configured"));
    }

    let settings = settings::run_wizard(None)?;
    settings::save(path, &settings)?;
    tracing::info!(path = %path.display(), "settings written");
    Ok(settings)
}

/// Interactive mode logs to a file next to the settings (stderr would tear
/// the alternate screen); pipe mode logs to stderr.
fn init_logging(interactive: bool, settings_path: &Path) -> std::io::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "termtrans=info".into());

    if interactive {
        let log_path = settings_path
            .parent()
            .map_or_else(|| Path::new("termtrans.log").to_path_buf(), |dir| dir.join("termtrans.log"));
        if let Some(dir) = log_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}
