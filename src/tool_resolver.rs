//! # Tool Path Resolver
//!
//! Finds the executable for each external tool. Lookup order:
//! 1. Path injected through `Config::tools` for the current platform
//! 2. Bundled tools directory (`$TOOLS_DIR`, or `tools/` next to the executable)
//! 3. System `PATH`

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::ToolPaths;
use crate::platform::Platform;

/// External binaries the recompressor shells out to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// mozjpeg encoder, lossy
    Cjpeg,
    /// libjpeg lossless optimizer
    Jpegtran,
    /// Lossless PNG optimizer
    Oxipng,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Cjpeg, Tool::Jpegtran, Tool::Oxipng];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Cjpeg => "cjpeg",
            Tool::Jpegtran => "jpegtran",
            Tool::Oxipng => "oxipng",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::Cjpeg => "JPEG recompression (mozjpeg, lossy)",
            Tool::Jpegtran => "JPEG optimization (lossless)",
            Tool::Oxipng => "PNG optimization (lossless)",
        }
    }

    /// Installation hint for Linux users
    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Cjpeg => "build mozjpeg from https://github.com/mozilla/mozjpeg (provides cjpeg)",
            Tool::Jpegtran => "sudo apt-get install libjpeg-turbo-progs",
            Tool::Oxipng => "cargo install oxipng  # or download from: https://github.com/shssoichiro/oxipng/releases",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tool path resolver
#[derive(Debug, Clone)]
pub struct ToolPathResolver {
    configured: ToolPaths,
    tools_dir: Option<PathBuf>,
    platform: Platform,
    search_path: bool,
}

impl ToolPathResolver {
    /// Resolver for the host platform with the bundled directory auto-detected
    pub fn new(configured: ToolPaths) -> Self {
        Self {
            configured,
            tools_dir: Self::detect_bundled_tools_dir(),
            platform: Platform::current(),
            search_path: true,
        }
    }

    /// Resolver restricted to the injected paths: no bundled dir, no `PATH`
    pub fn isolated(configured: ToolPaths, platform: Platform) -> Self {
        Self {
            configured,
            tools_dir: None,
            platform,
            search_path: false,
        }
    }

    pub fn with_tools_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tools_dir = Some(dir.into());
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn detect_bundled_tools_dir() -> Option<PathBuf> {
        if let Some(tools_dir) = env::var_os("TOOLS_DIR") {
            let tools_path = PathBuf::from(tools_dir);
            debug!("Checking TOOLS_DIR environment variable: {:?}", tools_path);
            if tools_path.is_dir() {
                return Some(tools_path);
            }
        }

        let exe_path = env::current_exe().ok()?;
        let tools_path = exe_path.parent()?.join("tools");
        debug!("Checking bundled tools path: {:?}", tools_path);
        tools_path.is_dir().then_some(tools_path)
    }

    /// Resolve the path to a specific tool
    pub fn resolve(&self, tool: Tool) -> Option<PathBuf> {
        if let Some(path) = self.configured.get(tool.name(), self.platform) {
            debug!("Using configured {} for {}: {:?}", tool, self.platform, path);
            return Some(path.to_path_buf());
        }

        if let Some(ref tools_dir) = self.tools_dir {
            if let Some(bundled) = self.find_bundled(tools_dir, tool) {
                debug!("Using bundled tool: {} -> {:?}", tool, bundled);
                return Some(bundled);
            }
        }

        if self.search_path {
            if let Some(system_path) = self.find_in_system_path(tool) {
                debug!("Using system tool: {} -> {:?}", tool, system_path);
                return Some(system_path);
            }
        }

        warn!("Tool not found: {}", tool);
        None
    }

    fn executable_name(&self, tool: Tool) -> String {
        format!("{}{}", tool.name(), self.platform.executable_suffix())
    }

    /// `<dir>/<platform>/<tool>` first, then `<dir>/<tool>`
    fn find_bundled(&self, tools_dir: &Path, tool: Tool) -> Option<PathBuf> {
        let file_name = self.executable_name(tool);
        [
            tools_dir.join(self.platform.id()).join(&file_name),
            tools_dir.join(&file_name),
        ]
        .into_iter()
        .find(|path| path.is_file())
    }

    fn find_in_system_path(&self, tool: Tool) -> Option<PathBuf> {
        let file_name = self.executable_name(tool);
        env::split_paths(&env::var_os("PATH")?)
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Get a report of tool availability
    pub fn tools_report(&self) -> String {
        let mut report = String::new();
        report.push_str("Tool Path Resolver Report\n");
        report.push_str(&format!("Platform: {} ({})\n", self.platform, Platform::system_info()));
        report.push_str(&format!("Bundled tools dir: {:?}\n", self.tools_dir));
        report.push_str("\nTool Availability:\n");

        for tool in Tool::ALL {
            match self.resolve(tool) {
                Some(path) if path.is_file() => {
                    report.push_str(&format!("  ✅ {} -> {:?} - {}\n", tool, path, tool.description()));
                }
                Some(path) => {
                    report.push_str(&format!("  ❌ {} -> {:?} (configured path does not exist)\n", tool, path));
                }
                None => {
                    report.push_str(&format!("  ❌ {} (install with: {})\n", tool, tool.install_hint()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configured_path_wins() {
        let mut paths = ToolPaths::new();
        paths.set("oxipng", "linux", "/custom/oxipng");
        let resolver = ToolPathResolver::isolated(paths, Platform::Linux);

        assert_eq!(resolver.resolve(Tool::Oxipng), Some(PathBuf::from("/custom/oxipng")));
        assert_eq!(resolver.resolve(Tool::Cjpeg), None);
    }

    #[test]
    fn test_configured_path_is_platform_specific() {
        let mut paths = ToolPaths::new();
        paths.set("cjpeg", "windows", "C:\\tools\\cjpeg.exe");
        let resolver = ToolPathResolver::isolated(paths, Platform::Darwin);

        assert_eq!(resolver.resolve(Tool::Cjpeg), None);
    }

    #[test]
    fn test_bundled_dir_layouts() {
        let temp_dir = TempDir::new().unwrap();
        let platform_dir = temp_dir.path().join("linux");
        std::fs::create_dir_all(&platform_dir).unwrap();
        std::fs::write(platform_dir.join("cjpeg"), b"").unwrap();
        std::fs::write(temp_dir.path().join("oxipng"), b"").unwrap();

        let resolver = ToolPathResolver::isolated(ToolPaths::new(), Platform::Linux)
            .with_tools_dir(temp_dir.path());

        assert_eq!(resolver.resolve(Tool::Cjpeg), Some(platform_dir.join("cjpeg")));
        assert_eq!(resolver.resolve(Tool::Oxipng), Some(temp_dir.path().join("oxipng")));
        assert_eq!(resolver.resolve(Tool::Jpegtran), None);
    }

    #[test]
    fn test_windows_suffix() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("oxipng.exe"), b"").unwrap();

        let resolver = ToolPathResolver::isolated(ToolPaths::new(), Platform::Windows)
            .with_tools_dir(temp_dir.path());

        assert_eq!(resolver.resolve(Tool::Oxipng), Some(temp_dir.path().join("oxipng.exe")));
    }

    #[test]
    fn test_report_lists_every_tool() {
        let resolver = ToolPathResolver::isolated(ToolPaths::new(), Platform::Linux);
        let report = resolver.tools_report();
        for tool in Tool::ALL {
            assert!(report.contains(tool.name()));
        }
    }
}
