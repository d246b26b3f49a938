//! Errors - ジョブ単位のエラーと分類
//!
//! ここのエラーはどれもパイプラインにとって致命的ではありません。
//! Supervisor は必ず next-or-finish か Idle/stop に戻ります。

use thiserror::Error;

/// ErrorKind はジョブ単位の失敗の運用分類
///
/// - Transfer: 転送自体の失敗（ジョブは Error、次へ進む）
/// - Connectivity: ネットワーク断（ジョブは Waiting に戻り、カウントしない）
/// - Cancelled: pause による協調的キャンセル（ジョブは Waiting に戻り、通知は Supervisor が無視する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transfer,
    Connectivity,
    Cancelled,
}

/// Failure reported by a `Transfer` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The remote side rejected or failed the upload.
    #[error("transfer failed: {0}")]
    Failed(String),

    /// The transfer noticed the network went away.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The transfer observed its cancellation token.
    #[error("transfer cancelled")]
    Cancelled,
}

impl TransferError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Failed(_) => ErrorKind::Transfer,
            TransferError::ConnectionLost(_) => ErrorKind::Connectivity,
            TransferError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
