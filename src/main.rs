//! plate-reader - License plate recognition upload service
//!
//! Accepts a vehicle image over HTTP, locates a plate-shaped region with an
//! edge/contour heuristic and reads it with Tesseract OCR.

mod config;
mod error;
mod server;
mod storage;
mod vision;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;
use crate::server::AppState;
use crate::vision::TesseractCli;

/// plate-reader - License plate recognition upload service
#[derive(Parser, Debug)]
#[command(name = "plate-reader")]
#[command(about = "Upload a vehicle image and read its license plate")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind)
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory for stored uploads (overrides server.upload_dir)
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Tesseract executable (overrides ocr.tesseract_cmd)
    #[arg(long)]
    tesseract_cmd: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = load_or_create_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    info!("plate-reader starting...");
    info!("Uploads stored in {:?}", config.server.upload_dir);

    if !TesseractCli::new(config.ocr.clone()).is_available() {
        warn!(
            "Tesseract executable {:?} is not available; uploads with a detected plate will fail",
            config.ocr.tesseract_cmd
        );
    }

    let state = AppState::from_config(&config).context("Failed to initialize upload store")?;
    server::serve(Arc::new(state)).await?;

    info!("plate-reader shutdown complete");
    Ok(())
}

/// Load configuration from an explicit path, the platform config directory,
/// or fall back to defaults
fn load_or_create_config(explicit: Option<&std::path::Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return Ok(config);
                }
                Err(e) => warn!("Ignoring invalid configuration {:?}: {}", config_path, e),
            }
        } else {
            match config::save_config(&AppConfig::default(), &config_path) {
                Ok(()) => info!("Wrote default configuration to {:?}", config_path),
                Err(e) => warn!("Could not write default configuration: {}", e),
            }
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// Apply command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(dir) = &args.upload_dir {
        config.server.upload_dir = dir.clone();
    }
    if let Some(cmd) = &args.tesseract_cmd {
        config.ocr.tesseract_cmd = cmd.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "plate-reader",
            "--bind",
            "0.0.0.0:9000",
            "--upload-dir",
            "/tmp/plates",
            "--tesseract-cmd",
            "/usr/local/bin/tesseract",
        ]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.upload_dir, PathBuf::from("/tmp/plates"));
        assert_eq!(config.ocr.tesseract_cmd, PathBuf::from("/usr/local/bin/tesseract"));
        assert_eq!(config.locator.max_candidates, 10);
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let args = Args::parse_from(["plate-reader"]);
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args);

        assert_eq!(config.server.bind, AppConfig::default().server.bind);
        assert!(!args.print_config);
    }

    #[test]
    fn test_explicit_config_must_load() {
        let result = load_or_create_config(Some(std::path::Path::new("/nonexistent/plates.toml")));
        assert!(result.is_err());
    }
}
