//! SimulatedTransfer - 実転送の代わりに一定時間待つだけの Transfer
//!
//! 待機は `poll` ごとに区切り、その都度キャンセルを確認します。

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

use crate::domain::{TransferError, UploadJob};
use crate::ports::Transfer;

#[derive(Debug, Clone)]
pub struct SimulatedTransfer {
    duration: Duration,
    poll: Duration,
    failing: HashSet<String>,
}

impl SimulatedTransfer {
    pub fn new(duration: Duration, poll: Duration) -> Self {
        Self {
            duration,
            poll,
            failing: HashSet::new(),
        }
    }

    /// Jobs with these names fail once their simulated time has elapsed.
    pub fn with_failures<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.extend(names.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl Transfer for SimulatedTransfer {
    async fn transfer(
        &self,
        job: &UploadJob,
        cancel: CancellationToken,
    ) -> Result<(), TransferError> {
        let deadline = Instant::now() + self.duration;
        loop {
            if cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(self.poll.min(deadline - now)).await;
        }

        if self.failing.contains(job.name()) {
            return Err(TransferError::failed(format!(
                "simulated failure for {}",
                job.name()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn completes_after_duration() {
        let transfer = SimulatedTransfer::new(Duration::from_secs(3), Duration::from_millis(100));
        let job = UploadJob::new("a");

        let start = Instant::now();
        transfer.transfer(&job, CancellationToken::new()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn observes_cancellation_at_checkpoint() {
        let transfer = SimulatedTransfer::new(Duration::from_secs(60), Duration::from_millis(100));
        let job = UploadJob::new("a");
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(250)).await;
                token.cancel();
            })
        };

        let start = Instant::now();
        let err = transfer.transfer(&job, token).await.unwrap_err();
        canceller.await.unwrap();

        assert_eq!(err, TransferError::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn configured_names_fail() {
        let transfer = SimulatedTransfer::new(Duration::from_millis(10), Duration::from_millis(5))
            .with_failures(["broken.jpg"]);

        let ok = transfer
            .transfer(&UploadJob::new("fine.jpg"), CancellationToken::new())
            .await;
        let err = transfer
            .transfer(&UploadJob::new("broken.jpg"), CancellationToken::new())
            .await;

        assert!(ok.is_ok());
        assert!(matches!(err, Err(TransferError::Failed(_))));
    }
}
