//! # Error Types Module
//!
//! Defines `CompressError`, the single error type returned by the library.
//!
//! ## Categories:
//! - `Io`: read/write/copy failures on the source or destination
//! - `UnsupportedFormat`: the container is neither JPEG nor PNG
//! - `Decode`: malformed image bytes in the source file
//! - `Encode`: in-memory JPEG/PNG/WebP encoding failed
//! - `ExternalTool`: missing binary, non-zero exit, timeout or unusable output
//! - `Config`: invalid configuration values
//!
//! Errors are never recovered locally: every step propagates with `?` and
//! the CLI logs the error and exits non-zero.
//!
//! ## Example:
//! ```rust
//! use image_recompressor::CompressError;
//!
//! let err = CompressError::external("oxipng", "exited with status 1");
//! assert!(err.to_string().contains("oxipng"));
//! ```

/// Errors produced while recompressing an image
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Image encode error: {0}")]
    Encode(String),

    #[error("External tool '{tool}' failed: {reason}")]
    ExternalTool { tool: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CompressError {
    /// Shorthand for an `ExternalTool` error
    pub fn external(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
