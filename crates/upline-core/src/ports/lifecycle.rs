//! ServiceLifecycle port - ホストプロセスへのライフサイクルのヒント

use crate::domain::ProgressNotice;

/// ServiceLifecycle はホストプロセスへの外向きのヒント
pub trait ServiceLifecycle: Send + Sync {
    /// Stay alive and show that uploads are running.
    fn enter_foreground(&self);

    /// Nothing left to do; the host may stop its background presence.
    fn stop_self(&self);

    /// 「uploading N」の進捗表示を更新する
    fn render_progress(&self, notice: &ProgressNotice);
}
