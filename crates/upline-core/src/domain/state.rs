//! State - アップロードジョブと Supervisor の状態

use std::fmt;

use serde::{Deserialize, Serialize};

/// UploadState はジョブ 1 件の状態
///
/// 状態遷移:
/// - Waiting -> InProgress -> Completed
/// - Waiting -> InProgress -> Error
/// - InProgress -> Waiting（接続断またはキャンセル。後で再試行）
/// - Error -> Waiting（ジョブソースによる明示的な retry）
///
/// `Completed` は終端。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    /// 待機中（dispatch 可能）
    Waiting,

    /// Executor が転送中
    InProgress,

    /// Transferred successfully.
    Completed,

    /// Transfer failed.
    Error,
}

impl UploadState {
    /// Is this transition one the lifecycle allows?
    pub fn can_transition_to(self, next: UploadState) -> bool {
        use UploadState::*;
        matches!(
            (self, next),
            (Waiting, InProgress)
                | (InProgress, Completed)
                | (InProgress, Error)
                | (InProgress, Waiting)
                | (Error, Waiting)
        )
    }

    /// Terminal from the supervisor's point of view (triggers next-or-finish).
    pub fn is_finished(self) -> bool {
        matches!(self, UploadState::Completed | UploadState::Error)
    }

    /// Eligible for `peek_next`.
    pub fn is_dispatchable(self) -> bool {
        matches!(self, UploadState::Waiting)
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadState::Waiting => write!(f, "waiting"),
            UploadState::InProgress => write!(f, "in_progress"),
            UploadState::Completed => write!(f, "completed"),
            UploadState::Error => write!(f, "error"),
        }
    }
}

/// Supervisor の状態
///
/// - Idle: 実行中のタスクなし
/// - Active: 1 件 dispatch 済みで、その終端通知を待っている
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorPhase {
    Idle,
    Active,
}
