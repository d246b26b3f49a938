//! UploadJob - アップロード 1 件（ID と共有される可変状態）

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UploadId;
use super::state::UploadState;
use crate::error::UploadError;

#[derive(Debug)]
struct JobCell {
    state: UploadState,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct JobInner {
    id: UploadId,
    name: String,
    created_at: DateTime<Utc>,
    cell: Mutex<JobCell>,
}

/// UploadJob はアップロード 1 件
///
/// # 設計
/// - clone は安価で、すべての clone が同じジョブを指す（キューと Executor で状態が食い違わない）
/// - 状態変更は `transition` を通す。遷移の可否は `UploadState::can_transition_to` がジョブ自身のロック下で判定する
/// - ロックを `.await` をまたいで保持しない
#[derive(Clone)]
pub struct UploadJob {
    inner: Arc<JobInner>,
}

impl UploadJob {
    /// Waiting 状態の新しいジョブ
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(JobInner {
                id: UploadId::generate(),
                name: name.into(),
                created_at: now,
                cell: Mutex::new(JobCell {
                    state: UploadState::Waiting,
                    updated_at: now,
                }),
            }),
        }
    }

    pub fn id(&self) -> UploadId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn state(&self) -> UploadState {
        self.cell().state
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.cell().updated_at
    }

    /// Move to `next`, returning the previous state.
    ///
    /// The check and the write happen under one lock, so two callers can never
    /// both move the same job out of `Waiting`.
    pub fn transition(&self, next: UploadState) -> Result<UploadState, UploadError> {
        let mut cell = self.cell();
        let from = cell.state;
        if !from.can_transition_to(next) {
            return Err(UploadError::InvalidTransition {
                id: self.inner.id,
                from,
                to: next,
            });
        }
        cell.state = next;
        cell.updated_at = Utc::now();
        Ok(from)
    }

    /// 失敗したジョブを列に戻す（`Error -> Waiting`）
    ///
    /// ジョブソース向け。コア自身は呼びません。
    pub fn retry(&self) -> Result<(), UploadError> {
        self.transition(UploadState::Waiting).map(|_| ())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let cell = self.cell();
        JobSnapshot {
            id: self.inner.id,
            name: self.inner.name.clone(),
            state: cell.state,
            updated_at: cell.updated_at,
        }
    }

    pub fn same_job(&self, other: &UploadJob) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn cell(&self) -> MutexGuard<'_, JobCell> {
        // JobCell has no invariant a panicking writer could break halfway.
        self.inner
            .cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for UploadJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadJob")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

/// JobSnapshot は通知に載せるジョブの時点コピー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: UploadId,
    pub name: String,
    pub state: UploadState,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_waiting() {
        let job = UploadJob::new("IMG_0001.jpg");
        assert_eq!(job.state(), UploadState::Waiting);
        assert_eq!(job.name(), "IMG_0001.jpg");
        assert_eq!(job.created_at(), job.updated_at());
    }

    #[test]
    fn clones_share_state() {
        let job = UploadJob::new("a");
        let other = job.clone();

        job.transition(UploadState::InProgress).unwrap();

        assert_eq!(other.state(), UploadState::InProgress);
        assert!(job.same_job(&other));
    }

    #[test]
    fn transition_returns_previous_state() {
        let job = UploadJob::new("a");
        let prev = job.transition(UploadState::InProgress).unwrap();
        assert_eq!(prev, UploadState::Waiting);
    }

    #[test]
    fn illegal_transition_is_rejected_and_state_kept() {
        let job = UploadJob::new("a");

        let err = job.transition(UploadState::Completed).unwrap_err();

        assert!(matches!(
            err,
            UploadError::InvalidTransition {
                from: UploadState::Waiting,
                to: UploadState::Completed,
                ..
            }
        ));
        assert_eq!(job.state(), UploadState::Waiting);
    }

    #[test]
    fn claiming_twice_fails() {
        let job = UploadJob::new("a");
        assert!(job.transition(UploadState::InProgress).is_ok());
        assert!(job.transition(UploadState::InProgress).is_err());
    }

    #[test]
    fn retry_only_from_error() {
        let job = UploadJob::new("a");
        assert!(job.retry().is_err());

        job.transition(UploadState::InProgress).unwrap();
        job.transition(UploadState::Error).unwrap();
        job.retry().unwrap();

        assert_eq!(job.state(), UploadState::Waiting);
    }

    #[test]
    fn snapshot_captures_current_state() {
        let job = UploadJob::new("a");
        job.transition(UploadState::InProgress).unwrap();

        let snap = job.snapshot();
        job.transition(UploadState::Completed).unwrap();

        assert_eq!(snap.state, UploadState::InProgress);
        assert_eq!(snap.id, job.id());
        assert_eq!(job.state(), UploadState::Completed);
    }
}
