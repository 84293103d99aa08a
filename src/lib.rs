//! # Image Recompressor Library
//!
//! Re-encodes a single JPEG or PNG into WebP when that makes it smaller,
//! otherwise keeps a verbatim copy of the original.
//!
//! ## Modules:
//! - `compressor`: the orchestrator (sniff → alpha probe → external passes → WebP → commit)
//! - `image_processor`: in-memory decode/encode of JPEG, PNG and WebP
//! - `alpha`: alpha-detection strategies
//! - `tool_runner`: bounded stdin/stdout subprocess runs
//! - `tool_resolver`: locating `cjpeg`, `jpegtran`, `oxipng`
//! - `platform`: platform identifiers used for tool lookup
//! - `config`: settings, validation, JSON persistence
//! - `file_manager`: source reading and atomic commit
//! - `progress`: CLI feedback
//! - `error`: `CompressError`
//!
//! ## Usage:
//! ```no_run
//! use image_recompressor::{Compressor, Config};
//! use std::path::Path;
//!
//! # async fn run() -> image_recompressor::Result<()> {
//! let compressor = Compressor::new(Config::default())?;
//! compressor.compress(Path::new("in.jpg"), Path::new("out.webp")).await?;
//! # Ok(())
//! # }
//! ```

pub mod alpha;
pub mod compressor;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod platform;
pub mod progress;
pub mod tool_resolver;
pub mod tool_runner;

pub use alpha::AlphaDetection;
pub use compressor::{Commit, CompressionReport, Compressor, Route};
pub use config::{Config, JpegRecompressor, ToolPaths};
pub use error::{CompressError, Result};
pub use image_processor::{DecodedImage, SourceFormat};
pub use platform::Platform;
