//! # Configuration Management Module
//!
//! Holds every knob of the recompressor in one `Config` struct, replacing
//! hard-coded quality constants and per-platform tool paths.
//!
//! ## Parameters:
//! - `jpeg_quality`: quality used when an opaque PNG is converted to JPEG (1-100, default: 90)
//! - `recompress_quality`: quality passed to `cjpeg` (1-100, default: 75)
//! - `webp_quality`: quality of the final WebP candidate (1-100, default: 90)
//! - `png_optimization_level`: `oxipng -o` level (0-6, default: 2)
//! - `jpeg_recompressor`: `mozjpeg` (lossy `cjpeg`) or `jpegtran` (lossless)
//! - `alpha_detection`: `pixel_scan` or `color_model`
//! - `tool_timeout_secs`: upper bound for every external tool run (default: 60)
//! - `tools`: tool name -> platform -> executable path
//!
//! ## Example:
//! ```json
//! {
//!   "webp_quality": 85,
//!   "tools": {
//!     "cjpeg": { "linux": "./cjpeg_linux", "darwin": "./cjpeg_mac", "windows": "./cjpeg.exe" }
//!   }
//! }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub use crate::alpha::AlphaDetection;
use crate::platform::Platform;

/// External JPEG pass applied to every JPEG-routed image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JpegRecompressor {
    /// mozjpeg `cjpeg`, lossy at `recompress_quality`
    #[default]
    Mozjpeg,
    /// `jpegtran`, lossless optimize + progressive
    Jpegtran,
}

impl FromStr for JpegRecompressor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mozjpeg" | "cjpeg" => Ok(JpegRecompressor::Mozjpeg),
            "jpegtran" => Ok(JpegRecompressor::Jpegtran),
            other => Err(format!("unknown JPEG recompressor: {}", other)),
        }
    }
}

/// Executable paths keyed by tool name, then by platform id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolPaths(BTreeMap<String, BTreeMap<String, PathBuf>>);

impl ToolPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` as the executable of `tool` on `platform`
    pub fn set(&mut self, tool: &str, platform: &str, path: impl Into<PathBuf>) -> &mut Self {
        self.0
            .entry(tool.to_string())
            .or_default()
            .insert(platform.to_string(), path.into());
        self
    }

    pub fn get(&self, tool: &str, platform: Platform) -> Option<&Path> {
        self.0
            .get(tool)
            .and_then(|by_platform| by_platform.get(platform.id()))
            .map(PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Binaries shipped next to the application, one per platform:
    /// `<dir>/cjpeg_linux`, `<dir>/cjpeg_mac`, `<dir>/cjpeg.exe`, and the
    /// same for `jpegtran` and `oxipng`.
    pub fn bundled_in(dir: &Path) -> Self {
        let mut paths = Self::new();
        for tool in ["cjpeg", "jpegtran", "oxipng"] {
            paths
                .set(tool, "linux", dir.join(format!("{}_linux", tool)))
                .set(tool, "darwin", dir.join(format!("{}_mac", tool)))
                .set(tool, "windows", dir.join(format!("{}.exe", tool)));
        }
        paths
    }
}

/// Configuration for image recompression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JPEG quality used when converting an opaque PNG (1-100)
    pub jpeg_quality: u8,
    /// Quality passed to the lossy JPEG recompressor (1-100)
    pub recompress_quality: u8,
    /// WebP quality (1-100)
    pub webp_quality: u8,
    /// oxipng optimization level (0-6)
    pub png_optimization_level: u8,
    /// Which external JPEG pass to run
    pub jpeg_recompressor: JpegRecompressor,
    /// How PNG transparency is detected
    pub alpha_detection: AlphaDetection,
    /// Timeout for each external tool run, in seconds
    pub tool_timeout_secs: u64,
    /// Injected executable paths (tool -> platform -> path)
    pub tools: ToolPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            recompress_quality: 75,
            webp_quality: 90,
            png_optimization_level: 2,
            jpeg_recompressor: JpegRecompressor::Mozjpeg,
            alpha_detection: AlphaDetection::PixelScan,
            tool_timeout_secs: 60,
            tools: ToolPaths::default(),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(anyhow::anyhow!("JPEG quality must be between 1 and 100"));
        }

        if self.recompress_quality == 0 || self.recompress_quality > 100 {
            return Err(anyhow::anyhow!("Recompress quality must be between 1 and 100"));
        }

        if self.webp_quality == 0 || self.webp_quality > 100 {
            return Err(anyhow::anyhow!("WebP quality must be between 1 and 100"));
        }

        if self.png_optimization_level > 6 {
            return Err(anyhow::anyhow!("PNG optimization level must be between 0 and 6"));
        }

        if self.tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Tool timeout must be greater than 0 seconds"));
        }

        Ok(())
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// `<user config dir>/recompress/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("recompress").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.jpeg_quality = 90;
        config.webp_quality = 101;
        assert!(config.validate().is_err());

        config.webp_quality = 90;
        config.png_optimization_level = 7;
        assert!(config.validate().is_err());

        config.png_optimization_level = 6;
        config.tool_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.recompress_quality, 75);
        assert_eq!(config.webp_quality, 90);
        assert_eq!(config.png_optimization_level, 2);
        assert_eq!(config.jpeg_recompressor, JpegRecompressor::Mozjpeg);
        assert_eq!(config.alpha_detection, AlphaDetection::PixelScan);
        assert_eq!(config.tool_timeout(), Duration::from_secs(60));
        assert!(config.tools.is_empty());
    }

    #[test]
    fn test_tool_paths_lookup() {
        let mut tools = ToolPaths::new();
        tools.set("oxipng", "linux", "/opt/bin/oxipng");

        assert_eq!(tools.get("oxipng", Platform::Linux), Some(Path::new("/opt/bin/oxipng")));
        assert_eq!(tools.get("oxipng", Platform::Windows), None);
        assert_eq!(tools.get("cjpeg", Platform::Linux), None);
    }

    #[test]
    fn test_bundled_layout() {
        let tools = ToolPaths::bundled_in(Path::new("/app"));
        assert_eq!(tools.get("cjpeg", Platform::Linux), Some(Path::new("/app/cjpeg_linux")));
        assert_eq!(tools.get("cjpeg", Platform::Darwin), Some(Path::new("/app/cjpeg_mac")));
        assert_eq!(tools.get("oxipng", Platform::Windows), Some(Path::new("/app/oxipng.exe")));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "webp_quality": 80, "alpha_detection": "color_model",
                 "tools": { "cjpeg": { "linux": "./cjpeg_linux" } } }"#,
        )
        .unwrap();

        assert_eq!(config.webp_quality, 80);
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.alpha_detection, AlphaDetection::ColorModel);
        assert_eq!(config.tools.get("cjpeg", Platform::Linux), Some(Path::new("./cjpeg_linux")));
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let mut original_config = Config {
            webp_quality: 70,
            png_optimization_level: 4,
            jpeg_recompressor: JpegRecompressor::Jpegtran,
            tool_timeout_secs: 5,
            ..Default::default()
        };
        original_config.tools.set("jpegtran", "darwin", "/usr/local/bin/jpegtran");

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.webp_quality, 70);
        assert_eq!(loaded_config.png_optimization_level, 4);
        assert_eq!(loaded_config.jpeg_recompressor, JpegRecompressor::Jpegtran);
        assert_eq!(loaded_config.tool_timeout_secs, 5);
        assert_eq!(loaded_config.tools, original_config.tools);
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(config.webp_quality, 90);
    }

    #[tokio::test]
    async fn test_invalid_file_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        tokio::fs::write(&path, r#"{ "recompress_quality": 0 }"#).await.unwrap();
        assert!(Config::from_file(&path).await.is_err());
    }
}
