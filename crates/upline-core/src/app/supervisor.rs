//! Supervisor - アップロードレーンの状態機械
//!
//! すべての操作は同期的でブロックしません。呼び出しは必ず 1 本の control line
//! 上から行います（`app::service` がそれを保証します）。そのため内部状態には
//! ロックがありません。
//!
//! # 遷移
//! - Idle --request_upload_all / resume--> Active（ジョブがあり、アップロード可能な場合）
//! - Active --Completed / Error--> next-or-finish
//! - Active --Waiting（接続断）--> Idle（キューは再走査しない）
//! - Active --pause--> Idle（実行中タスクをキャンセル）
//! - 中断済みタスクの Completed はカウントのみ、Waiting は Idle かつ再開済みなら拾い直す

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{
    ExecutorReport, JobTransition, ProgressNotice, SupervisorPhase, TaskId, UploadEvent, UploadJob,
    UploadState,
};
use crate::ports::{
    ConnectivityOracle, Dispatch, EventSink, PauseFlag, ServiceLifecycle, TaskHandle, UploadQueue,
};

/// Answer to `request_upload_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadAll {
    /// A job was dispatched.
    Started,
    /// A job is already in flight; nothing new was dispatched.
    AlreadyActive,
    /// Paused, offline or nothing queued.
    NothingToDo,
}

impl UploadAll {
    /// Should the host keep itself alive?
    pub fn keep_alive(self) -> bool {
        !matches!(self, UploadAll::NothingToDo)
    }
}

/// Snapshot of the supervisor, for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorStatus {
    pub phase: SupervisorPhase,
    pub is_running: bool,
    pub is_uploading: bool,
    pub completed_count: u64,
    pub current_task: Option<TaskId>,
}

/// External collaborators of the supervisor.
#[derive(Clone)]
pub struct Collaborators {
    pub queue: Arc<dyn UploadQueue>,
    pub connectivity: Arc<dyn ConnectivityOracle>,
    pub pause: Arc<dyn PauseFlag>,
    pub lifecycle: Arc<dyn ServiceLifecycle>,
    pub events: Arc<dyn EventSink>,
}

pub struct UploadSupervisor {
    deps: Collaborators,
    dispatcher: Arc<dyn Dispatch>,

    is_running: bool,
    completed_count: u64,
    current_task: Option<TaskHandle>,
}

impl UploadSupervisor {
    pub fn new(deps: Collaborators, dispatcher: Arc<dyn Dispatch>) -> Self {
        Self {
            deps,
            dispatcher,
            is_running: false,
            completed_count: 0,
            current_task: None,
        }
    }

    pub fn phase(&self) -> SupervisorPhase {
        if self.is_uploading() {
            SupervisorPhase::Active
        } else {
            SupervisorPhase::Idle
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.current_task.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn completed_count(&self) -> u64 {
        self.completed_count
    }

    pub fn status(&self) -> SupervisorStatus {
        SupervisorStatus {
            phase: self.phase(),
            is_running: self.is_running,
            is_uploading: self.is_uploading(),
            completed_count: self.completed_count,
            current_task: self.current_task.as_ref().map(TaskHandle::id),
        }
    }

    /// Uploading is possible only when not paused and online.
    pub fn can_upload(&self) -> bool {
        !self.deps.pause.is_paused() && self.deps.connectivity.is_connected()
    }

    /// Start draining the queue.
    ///
    /// Idempotent while a job is in flight.
    pub fn request_upload_all(&mut self) -> UploadAll {
        if self.is_uploading() {
            tracing::debug!("upload already in progress");
            return UploadAll::AlreadyActive;
        }

        if self.can_upload()
            && let Some(job) = self.deps.queue.peek_next()
        {
            self.enter_foreground();
            if self.dispatch(job) {
                return UploadAll::Started;
            }
        }

        tracing::debug!("nothing to upload");
        self.finish();
        UploadAll::NothingToDo
    }

    /// React to one executor report.
    pub fn on_executor_report(&mut self, report: ExecutorReport) {
        match report {
            ExecutorReport::Transition(transition) => self.on_job_state_changed(transition),
            ExecutorReport::Skipped { task, job } if self.is_current(task) => {
                tracing::warn!(job = %job.id, state = %job.state, "dispatched job was skipped");
                self.current_task = None;
                self.start_next_or_finish();
            }
            ExecutorReport::Skipped { task, .. } => {
                tracing::debug!(task = %task, "abandoned task was skipped");
                self.resume_if_idle();
            }
        }
    }

    /// Job-state-changed handler.
    ///
    /// Only a job that truly finished (Completed or Error) re-evaluates the
    /// queue. A job reverted to Waiting ends this run without looking for more
    /// work; it is picked up by the next `request_upload_all` or resume.
    pub fn on_job_state_changed(&mut self, transition: JobTransition) {
        if !self.is_current(transition.task) {
            self.on_abandoned_transition(transition);
            return;
        }

        match transition.state() {
            UploadState::InProgress => {
                let notice = ProgressNotice::new(transition.job, self.completed_count);
                self.deps.lifecycle.render_progress(&notice);
            }
            UploadState::Completed => {
                self.completed_count += 1;
                self.current_task = None;
                self.start_next_or_finish();
            }
            UploadState::Error => {
                self.current_task = None;
                self.start_next_or_finish();
            }
            UploadState::Waiting => {
                tracing::info!(job = %transition.job.id, "upload deferred until next request");
                self.finish();
            }
        }
    }

    /// Pause/resume signal. The new value is read from the pause flag.
    pub fn on_pause_state_changed(&mut self) {
        let paused = self.deps.pause.is_paused();
        self.deps
            .events
            .emit(UploadEvent::PauseStateChanged { paused });

        if paused {
            tracing::info!("uploading paused");
            self.stop_uploading();
        } else if self.is_uploading() {
            tracing::debug!("resume while a job is in flight");
        } else {
            tracing::info!("uploading resumed");
            self.start_next_or_finish();
        }
    }

    /// Cancel whatever is running and go idle.
    pub fn shutdown(&mut self) {
        self.stop_uploading();
    }

    /// 中断済みタスクの通知
    ///
    /// キャンセルが間に合わず転送が終わっていれば Completed をカウントする（次は dispatch しない）。
    /// Waiting に戻ったジョブは、resume がそのジョブを見落としていた場合に拾い直す。
    fn on_abandoned_transition(&mut self, transition: JobTransition) {
        match transition.state() {
            UploadState::Completed => {
                self.completed_count += 1;
                tracing::info!(
                    task = %transition.task,
                    job = %transition.job.id,
                    completed = self.completed_count,
                    "abandoned task completed its upload"
                );
            }
            UploadState::Waiting => {
                tracing::debug!(
                    task = %transition.task,
                    job = %transition.job.id,
                    "abandoned job requeued"
                );
                self.resume_if_idle();
            }
            UploadState::InProgress | UploadState::Error => {
                tracing::debug!(
                    task = %transition.task,
                    state = %transition.state(),
                    "ignoring transition from abandoned task"
                );
            }
        }
    }

    /// Idle で pause も接続断もなければ next-or-finish をやり直す
    fn resume_if_idle(&mut self) {
        if !self.is_uploading() && self.can_upload() {
            self.start_next_or_finish();
        }
    }

    fn start_next_or_finish(&mut self) {
        if self.can_upload()
            && let Some(job) = self.deps.queue.peek_next()
        {
            if !self.is_running {
                self.enter_foreground();
            }
            if self.dispatch(job) {
                return;
            }
        }
        self.finish();
    }

    fn stop_uploading(&mut self) {
        if let Some(task) = self.current_task.take() {
            tracing::info!(task = %task.id(), "cancelling current upload");
            task.cancel();
        }
        self.finish();
    }

    fn dispatch(&mut self, job: UploadJob) -> bool {
        let job_id = job.id();
        match self.dispatcher.submit(job) {
            Ok(handle) => {
                tracing::debug!(task = %handle.id(), job = %job_id, "job dispatched");
                self.current_task = Some(handle);
                true
            }
            Err(err) => {
                tracing::error!(job = %job_id, %err, "dispatch failed");
                false
            }
        }
    }

    fn enter_foreground(&mut self) {
        self.is_running = true;
        self.deps.lifecycle.enter_foreground();
        self.deps.events.emit(UploadEvent::ForegroundEntered);
    }

    /// Go idle and tell the host it may stop.
    fn finish(&mut self) {
        self.current_task = None;
        self.is_running = false;
        self.deps.lifecycle.stop_self();
        self.deps.events.emit(UploadEvent::Stopped {
            completed: self.completed_count,
        });
    }

    fn is_current(&self, task: TaskId) -> bool {
        self.current_task.as_ref().is_some_and(|t| t.id() == task)
    }
}
