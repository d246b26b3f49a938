//! Transfer port - 実際のアップロード処理（コアの対象外）
//!
//! コアは転送を「キャンセル可能で失敗しうる不透明な処理」として扱います。

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{TransferError, UploadJob};

/// Transfer はジョブ 1 件分の転送を行う
///
/// Implementations should check `cancel` at every checkpoint and return
/// `TransferError::Cancelled` promptly once it fires. The executor also races
/// the token, so a transfer that never checks is dropped at its next `.await`.
#[async_trait]
pub trait Transfer: Send + Sync {
    async fn transfer(&self, job: &UploadJob, cancel: CancellationToken)
    -> Result<(), TransferError>;
}
