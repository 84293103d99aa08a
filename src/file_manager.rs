//! # File Management Module
//!
//! Filesystem side of the recompressor: reading the source and the commit
//! step, which is the only place that touches the output path.
//!
//! ## Commit:
//! - `write_atomic()`: writes the WebP candidate
//! - `copy_preserving_permissions()`: copies the original byte for byte
//!
//! Both write a temporary file inside the destination directory and rename it
//! over the output path, so readers see either the previous file or the
//! complete new one.
//!
//! ## Utilities:
//! - `format_size()`: converts bytes to a readable form (KB, MB, GB)
//! - `calculate_reduction()`: percentage saved

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Manages file operations for a single recompression
pub struct FileManager;

impl FileManager {
    /// Read the whole source file, refusing anything that is not a regular file
    pub async fn read_source(path: &Path) -> io::Result<Vec<u8>> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        tokio::fs::read(path).await
    }

    fn temp_file_beside(path: &Path) -> io::Result<NamedTempFile> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tempfile::Builder::new()
            .prefix(".recompress-")
            .tempfile_in(dir)
    }

    /// Write `bytes` to `path` through a temp file + rename
    pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut temp = Self::temp_file_beside(path)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o644))?;
        }

        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Copy `source` to `destination` verbatim, with the source's permission bits
    pub fn copy_preserving_permissions(source: &Path, destination: &Path) -> io::Result<()> {
        let metadata = fs::metadata(source)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", source.display()),
            ));
        }

        let mut temp = Self::temp_file_beside(destination)?;
        let mut reader = fs::File::open(source)?;
        io::copy(&mut reader, temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        fs::set_permissions(temp.path(), metadata.permissions())?;

        temp.persist(destination).map_err(|e| e.error)?;
        Ok(())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_source_rejects_directory() {
        let temp_dir = TempDir::new().unwrap();
        let err = FileManager::read_source(temp_dir.path()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out.webp");
        fs::write(&out, b"old contents that are longer").unwrap();

        FileManager::write_atomic(&out, b"new").unwrap();

        assert_eq!(fs::read(&out).unwrap(), b"new");
        let leftovers = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_atomic_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("missing").join("out.webp");
        assert!(FileManager::write_atomic(&out, b"x").is_err());
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in.jpg");
        let destination = temp_dir.path().join("out.jpg");
        fs::write(&source, b"\xFF\xD8original bytes").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o640)).unwrap();

        FileManager::copy_preserving_permissions(&source, &destination).unwrap();

        assert_eq!(fs::read(&destination).unwrap(), fs::read(&source).unwrap());
        let mode = fs::metadata(&destination).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
        assert_eq!(FileManager::format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_calculate_reduction() {
        assert_eq!(FileManager::calculate_reduction(0, 10), 0.0);
        assert_eq!(FileManager::calculate_reduction(200, 50), 75.0);
        assert!(FileManager::calculate_reduction(100, 150) < 0.0);
    }
}
