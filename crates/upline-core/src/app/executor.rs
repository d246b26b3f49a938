//! Executor - 単一レーンのアップロード実行
//!
//! # フロー（1 ジョブあたり）
//! 1. Waiting -> InProgress（通知）
//! 2. Transfer 実行（キャンセルトークンと競合させる）
//! 3. 接続あり: Completed / 接続なし: Waiting / 失敗: Error（通知）
//!
//! Executor 自身はリトライしません。再試行はキューの再走査で Supervisor が行います。

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    ErrorKind, ExecutorReport, JobTransition, TaskId, TransferError, UploadJob, UploadState,
};
use crate::error::UploadError;
use crate::ports::{ConnectivityOracle, Dispatch, TaskHandle, Transfer};

struct Submission {
    task: TaskId,
    job: UploadJob,
    token: CancellationToken,
}

/// Runs submitted jobs one after another on a single background task.
///
/// - Every task token is a child of the executor's shutdown token, so
///   `shutdown_and_join` also interrupts the in-flight transfer.
/// - Reports go out on `reports` in the order the transitions happen.
pub struct UploadExecutor {
    tx: mpsc::UnboundedSender<Submission>,
    shutdown: CancellationToken,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl UploadExecutor {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn spawn(
        transfer: Arc<dyn Transfer>,
        connectivity: Arc<dyn ConnectivityOracle>,
        reports: mpsc::UnboundedSender<ExecutorReport>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let worker = Worker {
            transfer,
            connectivity,
            reports,
        };
        let join = tokio::spawn(worker.run(rx, shutdown.clone()));

        Self {
            tx,
            shutdown,
            join: Mutex::new(Some(join)),
        }
    }

    /// Stop taking work, cancel the in-flight transfer and wait for the worker.
    pub async fn shutdown_and_join(&self) {
        self.shutdown.cancel();
        let join = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(join) = join {
            let _ = join.await;
        }
    }
}

impl Dispatch for UploadExecutor {
    fn submit(&self, job: UploadJob) -> Result<TaskHandle, UploadError> {
        if self.shutdown.is_cancelled() {
            return Err(UploadError::ExecutorClosed);
        }
        let task = TaskId::generate();
        let token = self.shutdown.child_token();
        tracing::debug!(task = %task, job = %job.id(), "task submitted");
        self.tx
            .send(Submission {
                task,
                job,
                token: token.clone(),
            })
            .map_err(|_| UploadError::ExecutorClosed)?;
        Ok(TaskHandle::new(task, token))
    }
}

impl Drop for UploadExecutor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct Worker {
    transfer: Arc<dyn Transfer>,
    connectivity: Arc<dyn ConnectivityOracle>,
    reports: mpsc::UnboundedSender<ExecutorReport>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Submission>, shutdown: CancellationToken) {
        loop {
            let submission = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = rx.recv() => match next {
                    Some(submission) => submission,
                    None => break,
                },
            };
            self.run_one(submission).await;
        }
        tracing::debug!("executor worker stopped");
    }

    async fn run_one(&self, Submission { task, job, token }: Submission) {
        if token.is_cancelled() {
            tracing::debug!(task = %task, job = %job.id(), "task cancelled before start");
            return;
        }

        if let Err(err) = job.transition(UploadState::InProgress) {
            tracing::warn!(task = %task, job = %job.id(), %err, "job not waiting, skipped");
            self.report(ExecutorReport::Skipped {
                task,
                job: job.snapshot(),
            });
            return;
        }
        tracing::info!(task = %task, job = %job.id(), name = job.name(), "upload started");
        self.report_transition(task, &job);

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(TransferError::Cancelled),
            result = self.transfer.transfer(&job, token.child_token()) => result,
        };

        let next = self.settle(task, &job, outcome);
        if let Err(err) = job.transition(next) {
            tracing::warn!(task = %task, job = %job.id(), %err, "job changed under the executor");
            self.report(ExecutorReport::Skipped {
                task,
                job: job.snapshot(),
            });
            return;
        }
        self.report_transition(task, &job);
    }

    /// 転送結果から終端状態を決める
    fn settle(
        &self,
        task: TaskId,
        job: &UploadJob,
        outcome: Result<(), TransferError>,
    ) -> UploadState {
        match outcome {
            Ok(()) if self.connectivity.is_connected() => {
                tracing::info!(task = %task, job = %job.id(), "upload completed");
                UploadState::Completed
            }
            Ok(()) => {
                tracing::info!(task = %task, job = %job.id(), "connectivity lost, deferring upload");
                UploadState::Waiting
            }
            Err(err) => match err.kind() {
                ErrorKind::Cancelled => {
                    tracing::info!(task = %task, job = %job.id(), "upload interrupted");
                    UploadState::Waiting
                }
                ErrorKind::Connectivity => {
                    tracing::info!(task = %task, job = %job.id(), %err, "connectivity lost, deferring upload");
                    UploadState::Waiting
                }
                ErrorKind::Transfer if !self.connectivity.is_connected() => {
                    tracing::info!(task = %task, job = %job.id(), %err, "transfer failed while offline, deferring upload");
                    UploadState::Waiting
                }
                ErrorKind::Transfer => {
                    tracing::warn!(task = %task, job = %job.id(), %err, "upload failed");
                    UploadState::Error
                }
            },
        }
    }

    fn report_transition(&self, task: TaskId, job: &UploadJob) {
        self.report(ExecutorReport::Transition(JobTransition {
            task,
            job: job.snapshot(),
        }));
    }

    fn report(&self, report: ExecutorReport) {
        if self.reports.send(report).is_err() {
            tracing::debug!("report receiver dropped");
        }
    }
}
