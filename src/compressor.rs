//! # Recompression Orchestrator
//!
//! One linear pipeline per file:
//!
//! ```text
//! read -> sniff -> decode
//!      -> PNG?  alpha ? oxipng (stays PNG) : JPEG encode (becomes JPEG)
//!      -> JPEG? cjpeg / jpegtran
//!      -> WebP encode
//!      -> commit: smaller of {WebP candidate, original}
//! ```
//!
//! Nothing is retried and the first error aborts the run. The commit is the
//! only write to the output path.
//!
//! ## Example
//! ```no_run
//! use image_recompressor::{Compressor, Config};
//! use std::path::Path;
//!
//! # async fn run() -> image_recompressor::Result<()> {
//! let compressor = Compressor::new(Config::default())?;
//! let report = compressor.compress(Path::new("photo.png"), Path::new("photo.webp")).await?;
//! println!("{:?} -> {} bytes", report.commit, report.output_size);
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{Config, JpegRecompressor};
use crate::error::{CompressError, Result};
use crate::file_manager::FileManager;
use crate::image_processor::{self, DecodedImage, SourceFormat};
use crate::tool_resolver::{Tool, ToolPathResolver};
use crate::tool_runner::ToolCommand;

/// Branch taken through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// PNG with transparency, optimized losslessly and kept as PNG
    AlphaPng,
    /// Opaque PNG converted to JPEG, then recompressed
    OpaquePngToJpeg,
    /// JPEG source, recompressed
    Jpeg,
}

/// What ended up at the output path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The WebP candidate was smaller and was written
    Webp,
    /// The candidate was not smaller; the original was copied verbatim
    Original,
}

/// Outcome of a successful `compress` call
#[derive(Debug, Clone)]
pub struct CompressionReport {
    pub route: Route,
    pub commit: Commit,
    pub original_size: u64,
    pub candidate_size: u64,
    pub output_size: u64,
    pub width: u32,
    pub height: u32,
}

impl CompressionReport {
    pub fn reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.original_size, self.output_size)
    }
}

/// Adaptive single-image recompressor
pub struct Compressor {
    config: Config,
    resolver: ToolPathResolver,
}

impl Compressor {
    /// Compressor resolving tools from the config, the bundled dir and `PATH`
    pub fn new(config: Config) -> Result<Self> {
        let resolver = ToolPathResolver::new(config.tools.clone());
        Self::with_resolver(config, resolver)
    }

    pub fn with_resolver(config: Config, resolver: ToolPathResolver) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CompressError::Config(e.to_string()))?;
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &ToolPathResolver {
        &self.resolver
    }

    /// Recompress `input` into `output`.
    ///
    /// The committed file is never larger than the input: when the WebP
    /// candidate is not strictly smaller, the original is copied instead.
    pub async fn compress(&self, input: &Path, output: &Path) -> Result<CompressionReport> {
        info!("Recompressing {} -> {}", input.display(), output.display());

        let source = FileManager::read_source(input).await?;
        let original_size = source.len() as u64;
        let decoded = image_processor::decode(&source)?;
        let (width, height) = decoded.dimensions();
        debug!("Decoded {} {}x{} ({} bytes)", decoded.format, width, height, original_size);

        let (prepared, route) = match decoded.format {
            SourceFormat::Jpeg => {
                let image = self.recompress_jpeg(&source).await?;
                (DecodedImage::new(image, SourceFormat::Jpeg), Route::Jpeg)
            }
            SourceFormat::Png => self.prepare(decoded).await?,
        };
        info!("Route for {}: {:?}", input.display(), route);

        let candidate = image_processor::encode_webp(&prepared.image, self.config.webp_quality)?;
        let candidate_size = candidate.len() as u64;

        let commit = Self::commit(input, output, &candidate, original_size)?;

        let output_size = match commit {
            Commit::Webp => candidate_size,
            Commit::Original => original_size,
        };
        info!(
            "Committed {:?}: {} -> {} ({:.1}% saved)",
            commit,
            FileManager::format_size(original_size),
            FileManager::format_size(output_size),
            FileManager::calculate_reduction(original_size, output_size)
        );

        Ok(CompressionReport {
            route,
            commit,
            original_size,
            candidate_size,
            output_size,
            width,
            height,
        })
    }

    /// Write the candidate if strictly smaller than the original, otherwise
    /// copy the original verbatim with its permissions.
    fn commit(input: &Path, output: &Path, candidate: &[u8], original_size: u64) -> Result<Commit> {
        if candidate.len() as u64 >= original_size {
            warn!(
                "WebP candidate ({} bytes) is not smaller than the original ({} bytes), copying original",
                candidate.len(),
                original_size
            );
            FileManager::copy_preserving_permissions(input, output)?;
            Ok(Commit::Original)
        } else {
            FileManager::write_atomic(output, candidate)?;
            Ok(Commit::Webp)
        }
    }

    /// Run the format-dependent passes on an already decoded image.
    ///
    /// PNGs with transparency go through the PNG optimizer and stay PNG;
    /// every other image is (re)encoded as JPEG and recompressed. No file is
    /// read or written.
    pub async fn prepare(&self, decoded: DecodedImage) -> Result<(DecodedImage, Route)> {
        match decoded.format {
            SourceFormat::Png if self.config.alpha_detection.has_alpha(&decoded.image) => {
                debug!("PNG has transparency ({:?})", self.config.alpha_detection);
                let image = self.optimize_png(&decoded.image).await?;
                Ok((DecodedImage::new(image, SourceFormat::Png), Route::AlphaPng))
            }
            format => {
                let jpeg = image_processor::encode_jpeg(&decoded.image, self.config.jpeg_quality)?;
                let image = self.recompress_jpeg(&jpeg).await?;
                let route = match format {
                    SourceFormat::Png => Route::OpaquePngToJpeg,
                    SourceFormat::Jpeg => Route::Jpeg,
                };
                Ok((DecodedImage::new(image, SourceFormat::Jpeg), route))
            }
        }
    }

    fn command(&self, tool: Tool) -> Result<ToolCommand> {
        let program = self.resolver.resolve(tool).ok_or_else(|| {
            CompressError::external(
                tool.name(),
                format!(
                    "not found for platform {} (install with: {})",
                    self.resolver.platform(),
                    tool.install_hint()
                ),
            )
        })?;
        Ok(ToolCommand::new(tool.name(), program, self.config.tool_timeout()))
    }

    /// Lossless PNG pass; the optimizer's output must decode as PNG
    async fn optimize_png(&self, image: &image::DynamicImage) -> Result<image::DynamicImage> {
        let png = image_processor::encode_png(image)?;
        let command = self
            .command(Tool::Oxipng)?
            .args(["-o", &self.config.png_optimization_level.to_string()])
            .args(["--strip", "safe", "--stdout", "-"]);

        let optimized = command.run(&png).await?;
        debug!("oxipng: {} -> {} bytes", png.len(), optimized.len());

        image_processor::decode_as(&optimized, SourceFormat::Png).map_err(|e| {
            CompressError::external(command.name(), format!("output is not a valid PNG: {}", e))
        })
    }

    /// JPEG pass with the configured recompressor; its output must decode as JPEG
    async fn recompress_jpeg(&self, jpeg: &[u8]) -> Result<image::DynamicImage> {
        let command = match self.config.jpeg_recompressor {
            JpegRecompressor::Mozjpeg => self
                .command(Tool::Cjpeg)?
                .args(["-quality", &self.config.recompress_quality.to_string()]),
            JpegRecompressor::Jpegtran => self
                .command(Tool::Jpegtran)?
                .args(["-optimize", "-progressive", "-copy", "none"]),
        };

        let recompressed = command.run(jpeg).await?;
        debug!("{}: {} -> {} bytes", command.name(), jpeg.len(), recompressed.len());

        image_processor::decode_as(&recompressed, SourceFormat::Jpeg).map_err(|e| {
            CompressError::external(command.name(), format!("output is not a valid JPEG: {}", e))
        })
    }
}
