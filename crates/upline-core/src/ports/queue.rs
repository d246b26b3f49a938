//! UploadQueue port - 保留中ジョブの供給元
//!
//! 並び順や削除のポリシーは外部のジョブソース側の責務です。
//! コアは FIFO や優先度を押し付けません。

use crate::domain::UploadJob;

/// UploadQueue は次に処理するジョブを覗き見る
pub trait UploadQueue: Send + Sync {
    /// Next job in `Waiting`, without removing it.
    ///
    /// Must be free of side effects and safe to call repeatedly; `None` when
    /// nothing is waiting.
    fn peek_next(&self) -> Option<UploadJob>;
}
