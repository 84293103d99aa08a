//! # Platform identification
//!
//! External tool paths are keyed by a platform identifier (`linux`,
//! `darwin`, `windows`, or the raw `std::env::consts::OS` value for anything
//! else). This module computes that identifier for the host and knows the
//! executable suffix each platform uses.

use std::fmt;

/// Host platform, as used for tool path lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
    Other(&'static str),
}

impl Platform {
    /// Platform of the running process
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a platform
    pub fn from_os(os: &'static str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::Darwin,
            "windows" => Platform::Windows,
            other => Platform::Other(other),
        }
    }

    /// Identifier used as key in `ToolPaths`
    pub fn id(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Windows => "windows",
            Platform::Other(os) => os,
        }
    }

    /// Suffix appended to executable names
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }

    /// Get system information for debugging
    pub fn system_info() -> SystemInfo {
        SystemInfo {
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            family: std::env::consts::FAMILY,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// System information structure
#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.os, self.arch, self.family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_ids() {
        assert_eq!(Platform::from_os("linux").id(), "linux");
        assert_eq!(Platform::from_os("macos").id(), "darwin");
        assert_eq!(Platform::from_os("windows").id(), "windows");
        assert_eq!(Platform::from_os("freebsd").id(), "freebsd");
    }

    #[test]
    fn test_executable_suffix() {
        assert_eq!(Platform::Windows.executable_suffix(), ".exe");
        assert_eq!(Platform::Linux.executable_suffix(), "");
        assert_eq!(Platform::Darwin.executable_suffix(), "");
    }

    #[test]
    fn test_current_matches_os() {
        let current = Platform::current();
        assert_eq!(current, Platform::from_os(std::env::consts::OS));
        assert_eq!(current.to_string(), current.id());
    }

    #[test]
    fn test_system_info() {
        let info = Platform::system_info();
        assert!(!info.os.is_empty());
        assert!(!info.arch.is_empty());
        assert!(!info.family.is_empty());
    }
}
