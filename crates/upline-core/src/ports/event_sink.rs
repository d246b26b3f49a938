//! EventSink port - observer へのイベント配送

use crate::domain::UploadEvent;

/// EventSink は UploadEvent を外部へ流す
///
/// 呼び出しは control line 上で行われるため、ブロックしてはいけません。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: UploadEvent);
}

/// 何もしない EventSink
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: UploadEvent) {}
}
