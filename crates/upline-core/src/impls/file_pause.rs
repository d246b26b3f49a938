//! FilePauseFlag - 再起動をまたいで保持される一時停止フラグ
//!
//! JSON ファイル `{"is_paused": bool}` に保存します。
//! ファイルが無ければ「一時停止していない」とみなします。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::ports::PauseFlag;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PauseFile {
    #[serde(default)]
    is_paused: bool,
}

/// Durable pause flag backed by a small JSON file.
///
/// Reads are served from memory; `set_paused` writes through before updating
/// the cached value, so a failed write leaves the flag unchanged.
#[derive(Debug)]
pub struct FilePauseFlag {
    path: PathBuf,
    paused: AtomicBool,
}

impl FilePauseFlag {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        let paused = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str::<PauseFile>(&contents)?.is_paused
        } else {
            false
        };
        tracing::debug!(path = %path.display(), paused, "pause flag loaded");
        Ok(Self {
            path,
            paused: AtomicBool::new(paused),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_paused(&self, paused: bool) -> Result<(), UploadError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(&PauseFile { is_paused: paused })?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;

        self.paused.store(paused, Ordering::SeqCst);
        Ok(())
    }
}

impl PauseFlag for FilePauseFlag {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_means_not_paused() {
        let dir = tempdir().unwrap();
        let flag = FilePauseFlag::open(dir.path().join("pause.json")).unwrap();
        assert!(!flag.is_paused());
    }

    #[test]
    fn set_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("pause.json");

        let flag = FilePauseFlag::open(&path).unwrap();
        flag.set_paused(true).unwrap();
        assert!(flag.is_paused());

        let reopened = FilePauseFlag::open(&path).unwrap();
        assert!(reopened.is_paused());

        reopened.set_paused(false).unwrap();
        assert!(!FilePauseFlag::open(&path).unwrap().is_paused());
    }

    #[test]
    fn empty_object_defaults_to_not_paused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pause.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(!FilePauseFlag::open(&path).unwrap().is_paused());
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pause.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FilePauseFlag::open(&path).unwrap_err();
        assert!(matches!(err, UploadError::Json(_)));
    }
}
