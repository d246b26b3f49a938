//! upline-core
//!
//! Single-lane upload queue supervisor.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, job, state, events, errors）
//! - **ports**: 抽象化レイヤー（UploadQueue, ConnectivityOracle, PauseFlag, Transfer, Dispatch, など）
//! - **app**: アプリケーションロジック（builder, supervisor, executor, service）
//! - **impls**: 実装（InMemoryUploadQueue, FilePauseFlag, SimulatedTransfer, など）
//! - **config**: `upline.toml` の読み込み
//! - **observability**: キューの集計ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;

pub use crate::app::{UploadAll, UploadServiceBuilder, UploadServiceHandle};
pub use crate::config::UploadConfig;
pub use crate::domain::{UploadEvent, UploadJob, UploadState};
pub use crate::error::UploadError;
