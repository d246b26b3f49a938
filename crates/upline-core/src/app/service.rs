//! Service - Supervisor を 1 本の control line 上で動かす
//!
//! # 設計
//! - Supervisor の状態を書き換えるのはこの control task だけ（single writer）
//! - Executor からの通知は mpsc で control task に集約してから処理する
//! - 外部からの要求（upload all / pause 変更 / status / shutdown）も同じ task に届く
//! - そのため Supervisor 自体にはロックが要らない

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use super::executor::UploadExecutor;
use super::supervisor::{Collaborators, SupervisorStatus, UploadAll, UploadSupervisor};
use crate::config::UploadConfig;
use crate::domain::{ExecutorReport, UploadEvent};
use crate::error::UploadError;
use crate::impls::BroadcastEventSink;
use crate::ports::{EventSink, Transfer};

enum Command {
    UploadAll(oneshot::Sender<UploadAll>),
    PauseStateChanged,
    Status(oneshot::Sender<SupervisorStatus>),
    Shutdown(oneshot::Sender<()>),
}

/// A wired but not yet started upload lane. Built by `UploadServiceBuilder`.
pub struct UploadService {
    deps: Collaborators,
    transfer: Arc<dyn Transfer>,
    events: BroadcastEventSink,
    config: UploadConfig,
}

impl UploadService {
    pub(crate) fn new(
        deps: Collaborators,
        transfer: Arc<dyn Transfer>,
        events: BroadcastEventSink,
        config: UploadConfig,
    ) -> Self {
        Self {
            deps,
            transfer,
            events,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Spawn the executor and the control task. Must be called inside a tokio runtime.
    pub fn start(self) -> UploadServiceHandle {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let executor = Arc::new(UploadExecutor::spawn(
            self.transfer,
            Arc::clone(&self.deps.connectivity),
            report_tx,
        ));
        let supervisor = UploadSupervisor::new(self.deps, executor.clone());

        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_capacity);
        let control = ControlLoop {
            supervisor,
            executor,
            events: self.events.clone(),
        };
        tokio::spawn(control.run(cmd_rx, report_rx));
        tracing::debug!("upload service started");

        UploadServiceHandle {
            tx: cmd_tx,
            events: self.events,
        }
    }
}

/// Cheap, cloneable front door to a running service.
#[derive(Clone)]
pub struct UploadServiceHandle {
    tx: mpsc::Sender<Command>,
    events: BroadcastEventSink,
}

impl UploadServiceHandle {
    /// Start draining the queue if possible.
    ///
    /// `UploadAll::keep_alive()` tells the host whether to stay up.
    pub async fn request_upload_all(&self) -> Result<UploadAll, UploadError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::UploadAll(reply)).await?;
        rx.await.map_err(|_| UploadError::ServiceClosed)
    }

    /// Signal that the pause flag changed. The supervisor reads the new value itself.
    pub async fn notify_pause_state_changed(&self) -> Result<(), UploadError> {
        self.send(Command::PauseStateChanged).await
    }

    pub async fn status(&self) -> Result<SupervisorStatus, UploadError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status(reply)).await?;
        rx.await.map_err(|_| UploadError::ServiceClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Cancel the in-flight upload, stop the executor and wait for both.
    pub async fn shutdown(&self) -> Result<(), UploadError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown(reply)).await?;
        rx.await.map_err(|_| UploadError::ServiceClosed)
    }

    async fn send(&self, command: Command) -> Result<(), UploadError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| UploadError::ServiceClosed)
    }
}

struct ControlLoop {
    supervisor: UploadSupervisor,
    executor: Arc<UploadExecutor>,
    events: BroadcastEventSink,
}

impl ControlLoop {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut reports: mpsc::UnboundedReceiver<ExecutorReport>,
    ) {
        let mut shutdown_reply = None;
        loop {
            // reports first: state should be current before answering requests
            tokio::select! {
                biased;
                Some(report) = reports.recv() => self.on_report(report),
                command = commands.recv() => match command {
                    Some(Command::UploadAll(reply)) => {
                        let answer = self.supervisor.request_upload_all();
                        let _ = reply.send(answer);
                    }
                    Some(Command::PauseStateChanged) => self.supervisor.on_pause_state_changed(),
                    Some(Command::Status(reply)) => {
                        let _ = reply.send(self.supervisor.status());
                    }
                    Some(Command::Shutdown(reply)) => {
                        shutdown_reply = Some(reply);
                        break;
                    }
                    None => break,
                },
            }
        }

        self.supervisor.shutdown();
        self.executor.shutdown_and_join().await;
        tracing::info!(
            completed = self.supervisor.completed_count(),
            "upload service stopped"
        );
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    fn on_report(&mut self, report: ExecutorReport) {
        if let ExecutorReport::Transition(transition) = &report {
            self.events
                .emit(UploadEvent::JobStateChanged(transition.clone()));
        }
        self.supervisor.on_executor_report(report);
    }
}
