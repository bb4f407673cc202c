//! Artifact persistence boundary
//!
//! Exported reports leave the library through `ArtifactWriter`; anything
//! the host wants stored next to them (screenshots, save files) can go
//! through the same interface. The filesystem implementation writes flat
//! files with timestamped names and sweeps reports past the retention
//! period.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use chrono::Local;

/// Destination for exported artifacts
pub trait ArtifactWriter: Send + Sync {
    /// Persist `contents` under `name` inside `dir`, returning the final path
    fn write(&self, name: &str, contents: &[u8], dir: &Path) -> Result<PathBuf>;
}

/// Writes artifacts to the local filesystem
#[derive(Debug, Default)]
pub struct FileArtifactWriter;

impl ArtifactWriter for FileArtifactWriter {
    fn write(&self, name: &str, contents: &[u8], dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create artifact directory {}", dir.display()))?;

        let path = dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write artifact {}", path.display()))?;

        Ok(path)
    }
}

/// Generate a timestamped report file name
pub fn report_file_name(prefix: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("{}-{}.log", prefix, timestamp)
}

/// Delete report files older than the retention period
///
/// Only files matching `{prefix}-*.log` are considered; anything else in
/// the directory is left alone. Returns the number of files deleted.
pub fn cleanup_old_reports(dir: &Path, prefix: &str, retention_days: u64) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let file_prefix = format!("{}-", prefix);
    let mut deleted = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if name.starts_with(&file_prefix) && name.ends_with(".log") => {}
            _ => continue,
        }

        if let Ok(metadata) = entry.metadata() {
            if let Ok(modified) = metadata.modified() {
                if modified < cutoff && fs::remove_file(&path).is_ok() {
                    deleted += 1;
                }
            }
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("nested").join("reports");

        let path = FileArtifactWriter
            .write("capture-test.log", b"contents", &dest)
            .unwrap();

        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "contents");
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();

        FileArtifactWriter
            .write("capture-test.log", b"old", temp_dir.path())
            .unwrap();
        let path = FileArtifactWriter
            .write("capture-test.log", b"new", temp_dir.path())
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_report_file_name_format() {
        let name = report_file_name("capture");
        assert!(name.starts_with("capture-"));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_cleanup_nonexistent_dir() {
        let count = cleanup_old_reports(Path::new("/nonexistent/path/for/testing"), "capture", 7)
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_ignores_foreign_files() {
        let temp_dir = TempDir::new().unwrap();

        let other_file = temp_dir.path().join("notes.txt");
        File::create(&other_file)
            .unwrap()
            .write_all(b"test")
            .unwrap();

        let wrong_prefix = temp_dir.path().join("other-2026-01-01_00-00-00.log");
        File::create(&wrong_prefix)
            .unwrap()
            .write_all(b"test")
            .unwrap();

        let count = cleanup_old_reports(temp_dir.path(), "capture", 7).unwrap();
        assert_eq!(count, 0);
        assert!(other_file.exists());
        assert!(wrong_prefix.exists());
    }

    #[test]
    fn test_cleanup_keeps_recent_reports() {
        let temp_dir = TempDir::new().unwrap();

        let report = temp_dir.path().join("capture-2026-01-21_14-30-45.log");
        File::create(&report).unwrap().write_all(b"dump").unwrap();

        let count = cleanup_old_reports(temp_dir.path(), "capture", 7).unwrap();
        assert_eq!(count, 0);
        assert!(report.exists());
    }

    #[test]
    fn test_cleanup_deletes_old_reports() {
        let temp_dir = TempDir::new().unwrap();

        let report = temp_dir.path().join("capture-2020-01-01_00-00-00.log");
        File::create(&report).unwrap().write_all(b"dump").unwrap();

        // Backdate the mtime so the file falls past the retention cutoff
        let old = SystemTime::now() - Duration::from_secs(30 * 24 * 60 * 60);
        fs::OpenOptions::new()
            .write(true)
            .open(&report)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let count = cleanup_old_reports(temp_dir.path(), "capture", 7).unwrap();
        assert_eq!(count, 1);
        assert!(!report.exists());
    }
}
