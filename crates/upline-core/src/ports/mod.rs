//! Ports - 抽象化レイヤー
//!
//! Supervisor と Executor が依存する外部協調者を trait として定義します。
//! 実装は `impls` に置きます（インメモリ・ファイル・シミュレーション）。

pub mod connectivity;
pub mod dispatch;
pub mod event_sink;
pub mod lifecycle;
pub mod pause;
pub mod queue;
pub mod transfer;

pub use self::connectivity::ConnectivityOracle;
pub use self::dispatch::{Dispatch, TaskHandle};
pub use self::event_sink::{EventSink, NoopEventSink};
pub use self::lifecycle::ServiceLifecycle;
pub use self::pause::PauseFlag;
pub use self::queue::UploadQueue;
pub use self::transfer::Transfer;
