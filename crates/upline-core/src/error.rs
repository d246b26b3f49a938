use thiserror::Error;

use crate::domain::{UploadId, UploadState};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: UploadId,
        from: UploadState,
        to: UploadState,
    },

    #[error("executor worker has shut down")]
    ExecutorClosed,

    #[error("upload service has shut down")]
    ServiceClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
