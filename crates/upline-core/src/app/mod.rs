//! App - アプリケーション層
//!
//! ports を組み合わせてアップロードレーンを実装します。
//!
//! # 主要コンポーネント
//! - **UploadServiceBuilder**: 協調者の構築とワイヤリング
//! - **UploadSupervisor**: レーンの状態機械（Idle / Active）
//! - **UploadExecutor**: 同時実行数 1 の転送ワーカー
//! - **UploadService**: Supervisor を単一の control task 上で動かす

pub mod builder;
pub mod executor;
pub mod service;
pub mod supervisor;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, UploadServiceBuilder};
pub use self::executor::UploadExecutor;
pub use self::service::{UploadService, UploadServiceHandle};
pub use self::supervisor::{Collaborators, SupervisorStatus, UploadAll, UploadSupervisor};
