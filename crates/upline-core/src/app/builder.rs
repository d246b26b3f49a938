//! UploadServiceBuilder - 協調者のワイヤリング
//!
//! # Fail-fast 設計
//! - queue / connectivity / transfer は必須。欠けていれば build() が BuildError を返す
//! - pause は省略可: config.pause_file があれば FilePauseFlag、無ければメモリ上のフラグ
//! - lifecycle は省略可: TracingLifecycle

use std::sync::Arc;

use super::service::UploadService;
use super::supervisor::Collaborators;
use crate::config::{ConfigError, UploadConfig};
use crate::error::UploadError;
use crate::impls::{BroadcastEventSink, FilePauseFlag, MemoryPauseFlag, TracingLifecycle};
use crate::ports::{ConnectivityOracle, PauseFlag, ServiceLifecycle, Transfer, UploadQueue};

/// BuildError はサービス構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot open pause flag: {0}")]
    PauseFlag(#[from] UploadError),
}

/// # 使用例
/// ```ignore
/// let handle = UploadServiceBuilder::new()
///     .queue(queue)
///     .connectivity(net)
///     .transfer(transfer)
///     .build()?
///     .start();
/// ```
#[derive(Default)]
pub struct UploadServiceBuilder {
    config: UploadConfig,
    queue: Option<Arc<dyn UploadQueue>>,
    connectivity: Option<Arc<dyn ConnectivityOracle>>,
    pause: Option<Arc<dyn PauseFlag>>,
    transfer: Option<Arc<dyn Transfer>>,
    lifecycle: Option<Arc<dyn ServiceLifecycle>>,
}

impl UploadServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: UploadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn queue(mut self, queue: Arc<dyn UploadQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivityOracle>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn pause(mut self, pause: Arc<dyn PauseFlag>) -> Self {
        self.pause = Some(pause);
        self
    }

    pub fn transfer(mut self, transfer: Arc<dyn Transfer>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn lifecycle(mut self, lifecycle: Arc<dyn ServiceLifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn build(self) -> Result<UploadService, BuildError> {
        self.config.validate()?;

        let queue = self.queue.ok_or(BuildError::Missing("queue"))?;
        let connectivity = self
            .connectivity
            .ok_or(BuildError::Missing("connectivity"))?;
        let transfer = self.transfer.ok_or(BuildError::Missing("transfer"))?;

        let pause: Arc<dyn PauseFlag> = match (self.pause, &self.config.pause_file) {
            (Some(pause), _) => pause,
            (None, Some(path)) => Arc::new(FilePauseFlag::open(path)?),
            (None, None) => Arc::new(MemoryPauseFlag::default()),
        };
        let lifecycle = self
            .lifecycle
            .unwrap_or_else(|| Arc::new(TracingLifecycle));

        let events = BroadcastEventSink::new(self.config.event_capacity);
        let deps = Collaborators {
            queue,
            connectivity,
            pause,
            lifecycle,
            events: Arc::new(events.clone()),
        };
        Ok(UploadService::new(deps, transfer, events, self.config))
    }
}
