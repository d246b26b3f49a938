//! Upload lane configuration, loaded from `upline.toml`.
//!
//! Keys missing from the file fall back to defaults. `UPLINE_PAUSE_FILE`
//! overrides `pause_file`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PAUSE_FILE_ENV: &str = "UPLINE_PAUSE_FILE";

/// ConfigError は設定の読み込み・検証エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// UploadConfig はアップロードレーンの設定
///
/// ファイルに無いキーは既定値になります。0 は不正値として `validate` で弾きます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Bound of the request channel into the control task.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,

    /// Events kept per lagging subscriber.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Length of one simulated transfer.
    #[serde(default = "default_transfer_duration_ms")]
    pub transfer_duration_ms: u64,

    /// How often the simulated transfer checks for cancellation.
    #[serde(default = "default_cancel_poll_ms")]
    pub cancel_poll_ms: u64,

    /// Durable pause flag location; in-memory flag when unset.
    #[serde(default)]
    pub pause_file: Option<PathBuf>,
}

fn default_command_capacity() -> usize {
    64
}

fn default_event_capacity() -> usize {
    256
}

fn default_transfer_duration_ms() -> u64 {
    3000
}

fn default_cancel_poll_ms() -> u64 {
    100
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            command_capacity: default_command_capacity(),
            event_capacity: default_event_capacity(),
            transfer_duration_ms: default_transfer_duration_ms(),
            cancel_poll_ms: default_cancel_poll_ms(),
            pause_file: None,
        }
    }
}

impl UploadConfig {
    /// `path` から読み込む。ファイルが無ければ既定値
    ///
    /// 環境変数による上書きと検証まで済ませて返します。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(PAUSE_FILE_ENV)
            && !path.is_empty()
        {
            self.pause_file = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_capacity == 0 {
            return Err(ConfigError::Invalid("command_capacity must be > 0".into()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be > 0".into()));
        }
        if self.cancel_poll_ms == 0 {
            return Err(ConfigError::Invalid("cancel_poll_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn transfer_duration(&self) -> Duration {
        Duration::from_millis(self.transfer_duration_ms)
    }

    pub fn cancel_poll(&self) -> Duration {
        Duration::from_millis(self.cancel_poll_ms)
    }
}
