//! # recompress - Main Entry Point
//!
//! Parses the command line, sets up `tracing`, builds the `Config` (file
//! values overridden by flags) and runs one recompression.
//!
//! ## Example:
//! ```bash
//! recompress photo.png photo.webp --webp-quality 85 --verbose
//! recompress --check-tools
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use image_recompressor::progress;
use image_recompressor::tool_resolver::ToolPathResolver;
use image_recompressor::{AlphaDetection, Compressor, Config, JpegRecompressor};

#[derive(Parser)]
#[command(name = "recompress")]
#[command(about = "Recompress a JPEG or PNG to WebP, keeping the original when WebP is not smaller")]
struct Args {
    /// Source image (JPEG or PNG)
    #[arg(required_unless_present_any = ["check_tools", "save_config"])]
    input: Option<PathBuf>,

    /// Destination file
    #[arg(required_unless_present_any = ["check_tools", "save_config"])]
    output: Option<PathBuf>,

    /// Configuration file (JSON); defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quality passed to the lossy JPEG recompressor (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// JPEG quality used when converting opaque PNGs (1-100)
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// WebP quality (1-100)
    #[arg(short, long)]
    webp_quality: Option<u8>,

    /// oxipng optimization level (0-6)
    #[arg(long)]
    png_level: Option<u8>,

    /// JPEG recompressor: mozjpeg or jpegtran
    #[arg(long)]
    jpeg_tool: Option<JpegRecompressor>,

    /// Alpha detection: pixel-scan or color-model
    #[arg(long)]
    alpha: Option<AlphaDetection>,

    /// Timeout for each external tool, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Write the effective configuration to this file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Print which external tools are available and exit
    #[arg(long)]
    check_tools: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(quality) = self.quality {
            config.recompress_quality = quality;
        }
        if let Some(quality) = self.jpeg_quality {
            config.jpeg_quality = quality;
        }
        if let Some(quality) = self.webp_quality {
            config.webp_quality = quality;
        }
        if let Some(level) = self.png_level {
            config.png_optimization_level = level;
        }
        if let Some(tool) = self.jpeg_tool {
            config.jpeg_recompressor = tool;
        }
        if let Some(alpha) = self.alpha {
            config.alpha_detection = alpha;
        }
        if let Some(timeout) = self.timeout {
            config.tool_timeout_secs = timeout;
        }
    }
}

async fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config.clone().or_else(Config::default_path) {
        Some(path) => Config::from_file(&path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args).await?;

    if let Some(ref path) = args.save_config {
        config.save_to_file(path).await?;
        info!("Saved configuration to {}", path.display());
    }

    if args.check_tools {
        println!("{}", ToolPathResolver::new(config.tools.clone()).tools_report());
        return Ok(());
    }

    let (Some(input), Some(output)) = (args.input.as_deref(), args.output.as_deref()) else {
        return Ok(());
    };

    if !input.exists() {
        return Err(anyhow::anyhow!("Input file does not exist: {}", input.display()));
    }

    let compressor = Compressor::new(config)?;
    let spinner = progress::spinner(&format!("Recompressing {}", input.display()));

    match compressor.compress(input, output).await {
        Ok(report) => {
            spinner.finish_and_clear();
            println!("{}", progress::format_report(input, output, &report));
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Failed to recompress {}: {}", input.display(), e);
            Err(e.into())
        }
    }
}
