//! PauseFlag port - ユーザーによる一時停止フラグ
//!
//! Supervisor からは読み取り専用です。変更は `notify_pause_state_changed`
//! という離散的なシグナルで届きます（ポーリングしない）。

/// PauseFlag は現在の一時停止状態を返す
pub trait PauseFlag: Send + Sync {
    fn is_paused(&self) -> bool;
}
