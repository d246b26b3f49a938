//! Events - Executor から Supervisor への通知と、外部 observer 向けのイベント
//!
//! グローバルなイベントバスは使いません。
//! - `JobTransition`: Executor -> Supervisor（mpsc で control line に載せる）
//! - `UploadEvent`: Service -> 任意の observer（EventSink 経由）

use serde::{Deserialize, Serialize};

use super::ids::TaskId;
use super::job::JobSnapshot;
use super::state::UploadState;

/// One state change of a dispatched job, tagged with the dispatch that made it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTransition {
    pub task: TaskId,
    pub job: JobSnapshot,
}

impl JobTransition {
    pub fn state(&self) -> UploadState {
        self.job.state
    }
}

/// ExecutorReport は Executor から control line への通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorReport {
    /// The job changed state.
    Transition(JobTransition),

    /// The job was no longer `Waiting` when its task started; nothing ran.
    Skipped { task: TaskId, job: JobSnapshot },
}

impl ExecutorReport {
    pub fn task(&self) -> TaskId {
        match self {
            ExecutorReport::Transition(t) => t.task,
            ExecutorReport::Skipped { task, .. } => *task,
        }
    }
}

/// Text for the "uploading N" progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressNotice {
    pub title: String,
    pub job: JobSnapshot,
    pub completed: u64,
}

impl ProgressNotice {
    /// The notification counts the job being uploaded, so it is one ahead of `completed`.
    pub fn new(job: JobSnapshot, completed: u64) -> Self {
        Self {
            title: format!("uploading {}", completed + 1),
            job,
            completed,
        }
    }
}

/// UploadEvent は observer 全員に配られるイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    JobStateChanged(JobTransition),
    PauseStateChanged { paused: bool },
    ForegroundEntered,
    Stopped { completed: u64 },
}
