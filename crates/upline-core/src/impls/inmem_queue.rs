//! InMemoryUploadQueue - 開発用のジョブキュー
//!
//! # 実装詳細
//! - 挿入順の `Vec<UploadJob>` を Mutex で保護
//! - `peek_next` は最初の Waiting ジョブを返すだけで、取り除かない
//! - ジョブの状態は UploadJob 自身が持つので、Executor の更新がそのまま見える

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{UploadJob, UploadState};
use crate::observability::QueueCounts;
use crate::ports::UploadQueue;

#[derive(Debug, Default)]
pub struct InMemoryUploadQueue {
    jobs: Mutex<Vec<UploadJob>>,
}

impl InMemoryUploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `Waiting` job and append it.
    pub fn push(&self, name: impl Into<String>) -> UploadJob {
        let job = UploadJob::new(name);
        self.push_job(job.clone());
        job
    }

    pub fn push_job(&self, job: UploadJob) {
        self.lock().push(job);
    }

    pub fn jobs(&self) -> Vec<UploadJob> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop completed jobs, returning how many were removed.
    pub fn remove_finished(&self) -> usize {
        let mut jobs = self.lock();
        let before = jobs.len();
        jobs.retain(|job| job.state() != UploadState::Completed);
        before - jobs.len()
    }

    pub fn counts_by_state(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for job in self.lock().iter() {
            counts.record(job.state());
        }
        counts
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UploadJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UploadQueue for InMemoryUploadQueue {
    fn peek_next(&self) -> Option<UploadJob> {
        self.lock()
            .iter()
            .find(|job| job.state().is_dispatchable())
            .cloned()
    }
}
