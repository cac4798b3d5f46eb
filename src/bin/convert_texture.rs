//! convert_texture
//!
//! Packs each input image into a sibling `.texture` container: a flipped
//! mipmap chain down to 1 pixel on the short side, every level ETC1
//! compressed by `etc1tool`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use runner_export::{ExportConfig, TextureConverter};
use runner_format::logging::{self, TracingConfig};

/// Convert images to ETC1 `.texture` containers
#[derive(Parser)]
#[command(name = "convert_texture")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Export settings (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source images
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ExportConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExportConfig::default(),
    };
    config.validate().context("Invalid export settings")?;

    let converter = TextureConverter::from_config(&config);
    for file in &cli.files {
        converter
            .convert_file(file)
            .with_context(|| format!("Failed to convert {}", file.display()))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // texture progress is reported at info level
    logging::init_with_config(TracingConfig::from_verbosity(cli.verbose.saturating_add(1)));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
