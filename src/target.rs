//! Target file collaborator: read, backup, and atomic write.
//!
//! The engine never touches the file system; everything path-shaped goes
//! through [`TargetFile`]. Backups are taken unconditionally before any
//! modification decision is acted upon, so the pre-patch content survives an
//! interruption between backup and final write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// Sortable, second-resolution stamp used in backup file names.
const STAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]-[minute]-[second]");

#[derive(Debug, Error)]
pub enum TargetError {
    /// Checked before any processing; surfaced immediately.
    #[error("target file not found: {path}")]
    Missing { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Provider of backup stamps, injected so tests can supply a fixed value.
pub trait BackupStamp {
    fn stamp(&self) -> String;
}

/// Wall-clock stamper used in production. Local time when the offset is
/// available, UTC otherwise.
pub struct SystemClock;

impl BackupStamp for SystemClock {
    fn stamp(&self) -> String {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        now.format(STAMP_FORMAT)
            .unwrap_or_else(|_| now.unix_timestamp().to_string())
    }
}

/// One target source file, resolved relative to a project root.
#[derive(Debug, Clone)]
pub struct TargetFile {
    path: PathBuf,
}

impl TargetFile {
    /// Resolve `relative` against `root` and verify the file exists.
    pub fn resolve(root: &Path, relative: &Path) -> Result<Self, TargetError> {
        let path = root.join(relative);
        if !path.is_file() {
            return Err(TargetError::Missing { path });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full current content.
    pub fn read(&self) -> Result<String, TargetError> {
        fs::read_to_string(&self.path).map_err(|source| TargetError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Write `content` to a stamped sibling backup file and return its path.
    ///
    /// The backup always holds the untouched original, byte for byte.
    pub fn backup(
        &self,
        content: &str,
        stamper: &dyn BackupStamp,
    ) -> Result<PathBuf, TargetError> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup_path = self
            .path
            .with_file_name(format!("{}.backup-{}", file_name, stamper.stamp()));

        fs::write(&backup_path, content).map_err(|source| TargetError::Io {
            path: backup_path.clone(),
            source,
        })?;
        Ok(backup_path)
    }

    /// Overwrite the target atomically: tempfile in the same directory,
    /// fsync, rename, then an mtime bump so watching dev servers reload.
    pub fn write(&self, content: &str) -> Result<(), TargetError> {
        atomic_write(&self.path, content.as_bytes()).map_err(|source| TargetError::Io {
            path: self.path.clone(),
            source,
        })?;

        let now = filetime::FileTime::now();
        filetime::set_file_mtime(&self.path, now).map_err(|source| TargetError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        )
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
