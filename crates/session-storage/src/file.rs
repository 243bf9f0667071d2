//! File-backed token store with atomic writes.

use crate::{StorageResult, TokenPair, TokenStore};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

/// Token store backed by a single JSON document on disk.
///
/// The document holds both tokens, so a reader can never observe a pair
/// that is half-replaced. Writes go through a temp file in the same
/// directory which is fsynced and renamed over the target; the temp file is
/// removed if any step fails. The file is created with mode 0600 on unix.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store for the given document path.
    ///
    /// The parent directory is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> StorageResult<Option<TokenPair>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let pair: TokenPair = serde_json::from_str(&raw)?;
        Ok(Some(pair))
    }

    fn store(&self, pair: &TokenPair) -> StorageResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(pair)?;
        atomic_write(&self.path, &content)?;

        debug!(path = %self.path.display(), "Token pair persisted");
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Token pair cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `content` to `path` via a fsynced temp file and rename.
fn atomic_write(path: &Path, content: &str) -> StorageResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "token path has no file name")
        })?;

    let tmp_name = format!(
        ".{}.opsdesk.tmp.{}",
        file_name,
        std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    );
    let tmp_path = dir.join(tmp_name);

    let write_result = (|| -> Result<(), io::Error> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, path)?;

        if let Ok(parent_dir) = fs::File::open(dir) {
            let _ = parent_dir.sync_all();
        }

        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }

    Ok(())
}
