//! Impls - ports の実装（開発用・テスト用・デモ用）
//!
//! # 含まれる実装
//! - **InMemoryUploadQueue**: 挿入順のジョブキュー
//! - **ManualConnectivity / MemoryPauseFlag**: 手動で切り替えるフラグ
//! - **FilePauseFlag**: JSON ファイルに保存される一時停止フラグ
//! - **SimulatedTransfer**: 一定時間待つだけの転送
//! - **TracingLifecycle**: ライフサイクルのヒントをログに出す
//! - **BroadcastEventSink**: tokio broadcast による配送

pub mod broadcast_sink;
pub mod file_pause;
pub mod flags;
pub mod inmem_queue;
pub mod simulated_transfer;
pub mod tracing_lifecycle;

pub use self::broadcast_sink::BroadcastEventSink;
pub use self::file_pause::FilePauseFlag;
pub use self::flags::{ManualConnectivity, MemoryPauseFlag};
pub use self::inmem_queue::InMemoryUploadQueue;
pub use self::simulated_transfer::SimulatedTransfer;
pub use self::tracing_lifecycle::TracingLifecycle;
