//! TracingLifecycle - ライフサイクルのヒントをログとして出す
//!
//! OS の通知やフォアグラウンドサービスの代わりです。

use crate::domain::ProgressNotice;
use crate::ports::ServiceLifecycle;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLifecycle;

impl ServiceLifecycle for TracingLifecycle {
    fn enter_foreground(&self) {
        tracing::info!("entering foreground upload mode");
    }

    fn stop_self(&self) {
        tracing::info!("upload lane idle, host may stop");
    }

    fn render_progress(&self, notice: &ProgressNotice) {
        tracing::info!(
            job = %notice.job.id,
            name = %notice.job.name,
            completed = notice.completed,
            "{}",
            notice.title
        );
    }
}
