//! Dispatch port - ジョブを実行レーンに渡す
//!
//! Supervisor は `Dispatch` 越しに Executor を呼びます。
//! テストでは記録するだけの実装に差し替えられます。

use tokio_util::sync::CancellationToken;

use crate::domain::{TaskId, UploadJob};
use crate::error::UploadError;

/// Handle to one dispatched task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, token: CancellationToken) -> Self {
        Self { id, token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Request interruption. Best-effort: the task stops at its next checkpoint.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Single-concurrency task runner.
///
/// Callers must not submit while a previous task's terminal report is still
/// outstanding; the runner does not check.
pub trait Dispatch: Send + Sync {
    fn submit(&self, job: UploadJob) -> Result<TaskHandle, UploadError>;
}
