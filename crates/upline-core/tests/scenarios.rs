//! End-to-end runs of the upload lane through `UploadServiceHandle`.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, broadcast};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use upline_core::app::{UploadAll, UploadServiceBuilder, UploadServiceHandle};
use upline_core::domain::{
    ProgressNotice, SupervisorPhase, TransferError, UploadEvent, UploadJob, UploadState,
};
use upline_core::error::UploadError;
use upline_core::impls::{InMemoryUploadQueue, ManualConnectivity, MemoryPauseFlag};
use upline_core::ports::{ServiceLifecycle, Transfer};

const WAIT: Duration = Duration::from_secs(5);

/// Each transfer finishes when a permit is released, or fails when cancelled.
struct GatedTransfer {
    gate: Semaphore,
}

impl GatedTransfer {
    fn closed() -> Self {
        Self {
            gate: Semaphore::new(0),
        }
    }

    fn open(permits: usize) -> Self {
        Self {
            gate: Semaphore::new(permits),
        }
    }

    fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }
}

#[async_trait]
impl Transfer for GatedTransfer {
    async fn transfer(
        &self,
        _job: &UploadJob,
        cancel: CancellationToken,
    ) -> Result<(), TransferError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(TransferError::Cancelled),
            permit = self.gate.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    Ok(())
                }
                Err(_) => Err(TransferError::failed("gate closed")),
            },
        }
    }
}

#[derive(Default)]
struct RecordingLifecycle {
    hints: Mutex<Vec<String>>,
}

impl RecordingLifecycle {
    fn hints(&self) -> Vec<String> {
        self.hints.lock().unwrap().clone()
    }

    fn push(&self, hint: impl Into<String>) {
        self.hints.lock().unwrap().push(hint.into());
    }
}

impl ServiceLifecycle for RecordingLifecycle {
    fn enter_foreground(&self) {
        self.push("foreground");
    }

    fn stop_self(&self) {
        self.push("stop");
    }

    fn render_progress(&self, notice: &ProgressNotice) {
        self.push(notice.title.clone());
    }
}

struct Lane {
    handle: UploadServiceHandle,
    events: broadcast::Receiver<UploadEvent>,
    queue: Arc<InMemoryUploadQueue>,
    net: Arc<ManualConnectivity>,
    pause: Arc<MemoryPauseFlag>,
    transfer: Arc<GatedTransfer>,
    lifecycle: Arc<RecordingLifecycle>,
}

fn start_lane(names: &[&str], transfer: GatedTransfer) -> Lane {
    let queue = Arc::new(InMemoryUploadQueue::new());
    for name in names {
        queue.push(*name);
    }
    let net = Arc::new(ManualConnectivity::new(true));
    let pause = Arc::new(MemoryPauseFlag::new(false));
    let transfer = Arc::new(transfer);
    let lifecycle = Arc::new(RecordingLifecycle::default());

    let handle = UploadServiceBuilder::new()
        .queue(queue.clone())
        .connectivity(net.clone())
        .pause(pause.clone())
        .transfer(transfer.clone())
        .lifecycle(lifecycle.clone())
        .build()
        .unwrap()
        .start();
    // subscribe before anything can happen
    let events = handle.subscribe();

    Lane {
        handle,
        events,
        queue,
        net,
        pause,
        transfer,
        lifecycle,
    }
}

impl Lane {
    async fn wait_for(&mut self, pred: impl Fn(&UploadEvent) -> bool) -> UploadEvent {
        timeout(WAIT, async {
            loop {
                let event = self.events.recv().await.expect("event stream broke");
                if pred(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    async fn wait_for_job(&mut self, name: &str, state: UploadState) {
        self.wait_for(|e| {
            matches!(e, UploadEvent::JobStateChanged(t) if t.job.name == name && t.state() == state)
        })
        .await;
    }

    async fn wait_stopped(&mut self) -> u64 {
        match self
            .wait_for(|e| matches!(e, UploadEvent::Stopped { .. }))
            .await
        {
            UploadEvent::Stopped { completed } => completed,
            _ => unreachable!(),
        }
    }

    fn job(&self, name: &str) -> UploadJob {
        self.queue
            .jobs()
            .into_iter()
            .find(|j| j.name() == name)
            .unwrap()
    }
}

#[tokio::test]
async fn scenario_a_drains_queue_in_order() {
    let mut lane = start_lane(&["J1", "J2"], GatedTransfer::open(2));

    let answer = lane.handle.request_upload_all().await.unwrap();
    assert_eq!(answer, UploadAll::Started);
    assert!(answer.keep_alive());

    let mut order = Vec::new();
    let completed = loop {
        match lane.wait_for(|_| true).await {
            UploadEvent::JobStateChanged(t) => order.push((t.job.name, t.job.state)),
            UploadEvent::Stopped { completed } => break completed,
            _ => {}
        }
    };

    assert_eq!(completed, 2);
    assert_eq!(
        order,
        vec![
            ("J1".to_string(), UploadState::InProgress),
            ("J1".to_string(), UploadState::Completed),
            ("J2".to_string(), UploadState::InProgress),
            ("J2".to_string(), UploadState::Completed),
        ]
    );

    let status = lane.handle.status().await.unwrap();
    assert_eq!(status.phase, SupervisorPhase::Idle);
    assert_eq!(status.completed_count, 2);
    assert!(!status.is_running);
    assert_eq!(
        lane.lifecycle.hints(),
        vec!["foreground", "uploading 1", "uploading 2", "stop"]
    );
}

#[tokio::test]
async fn scenario_b_connectivity_lost_mid_transfer() {
    let mut lane = start_lane(&["J1", "J2"], GatedTransfer::closed());

    lane.handle.request_upload_all().await.unwrap();
    lane.wait_for_job("J1", UploadState::InProgress).await;

    lane.net.set_connected(false);
    lane.transfer.release(1);

    lane.wait_for_job("J1", UploadState::Waiting).await;
    assert_eq!(lane.wait_stopped().await, 0);

    let status = lane.handle.status().await.unwrap();
    assert_eq!(status.phase, SupervisorPhase::Idle);
    assert_eq!(status.completed_count, 0);
    assert_eq!(lane.job("J1").state(), UploadState::Waiting);
    assert_eq!(lane.job("J2").state(), UploadState::Waiting);

    // coming back online alone dispatches nothing
    lane.net.set_connected(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = lane.handle.status().await.unwrap();
    assert_eq!(status.phase, SupervisorPhase::Idle);
    assert_eq!(lane.job("J1").state(), UploadState::Waiting);

    // a new request picks J1 up again
    lane.transfer.release(2);
    assert_eq!(
        lane.handle.request_upload_all().await.unwrap(),
        UploadAll::Started
    );
    assert_eq!(lane.wait_stopped().await, 2);
}

#[tokio::test]
async fn scenario_c_pause_cancels_in_flight_job() {
    let mut lane = start_lane(&["J1", "J2"], GatedTransfer::closed());

    lane.handle.request_upload_all().await.unwrap();
    lane.wait_for_job("J1", UploadState::InProgress).await;

    lane.pause.set_paused(true);
    lane.handle.notify_pause_state_changed().await.unwrap();

    let paused = lane
        .wait_for(|e| matches!(e, UploadEvent::PauseStateChanged { .. }))
        .await;
    assert_eq!(paused, UploadEvent::PauseStateChanged { paused: true });
    assert_eq!(lane.wait_stopped().await, 0);

    // the cancelled transfer hands its job back
    lane.wait_for_job("J1", UploadState::Waiting).await;

    let status = lane.handle.status().await.unwrap();
    assert_eq!(status.phase, SupervisorPhase::Idle);
    assert!(status.current_task.is_none());
    assert_eq!(lane.job("J2").state(), UploadState::Waiting);
    assert_eq!(lane.lifecycle.hints().last().map(String::as_str), Some("stop"));

    // paused: a request is turned away
    assert_eq!(
        lane.handle.request_upload_all().await.unwrap(),
        UploadAll::NothingToDo
    );
}

#[tokio::test]
async fn scenario_d_empty_queue_is_nothing_to_do() {
    let lane = start_lane(&[], GatedTransfer::closed());

    let answer = lane.handle.request_upload_all().await.unwrap();

    assert_eq!(answer, UploadAll::NothingToDo);
    assert!(!answer.keep_alive());
    assert!(!lane.lifecycle.hints().iter().any(|h| h == "foreground"));

    let status = lane.handle.status().await.unwrap();
    assert!(!status.is_running);
    assert_eq!(status.phase, SupervisorPhase::Idle);
}

#[tokio::test]
async fn scenario_e_resume_dispatches_without_request() {
    let mut lane = start_lane(&["J1"], GatedTransfer::closed());
    lane.pause.set_paused(true);

    assert_eq!(
        lane.handle.request_upload_all().await.unwrap(),
        UploadAll::NothingToDo
    );

    lane.pause.set_paused(false);
    lane.handle.notify_pause_state_changed().await.unwrap();

    lane.wait_for(|e| matches!(e, UploadEvent::ForegroundEntered))
        .await;
    lane.wait_for_job("J1", UploadState::InProgress).await;

    lane.transfer.release(1);
    assert_eq!(lane.wait_stopped().await, 1);
    assert_eq!(lane.job("J1").state(), UploadState::Completed);
}

#[tokio::test]
async fn at_most_one_job_in_flight() {
    let names = ["a", "b", "c", "d", "e"];
    let mut lane = start_lane(&names, GatedTransfer::open(names.len()));

    lane.handle.request_upload_all().await.unwrap();

    let mut in_flight = HashSet::new();
    let completed = loop {
        match lane.wait_for(|_| true).await {
            UploadEvent::JobStateChanged(t) => {
                if t.state() == UploadState::InProgress {
                    in_flight.insert(t.job.id);
                } else {
                    in_flight.remove(&t.job.id);
                }
                assert!(in_flight.len() <= 1, "two jobs in flight: {in_flight:?}");
                assert!(lane.queue.counts_by_state().in_progress <= 1);
            }
            UploadEvent::Stopped { completed } => break completed,
            _ => {}
        }
    };

    assert_eq!(completed, names.len() as u64);
    assert_eq!(lane.queue.counts_by_state().completed, names.len());
}

#[tokio::test]
async fn shutdown_cancels_and_closes_handle() {
    let mut lane = start_lane(&["J1"], GatedTransfer::closed());

    lane.handle.request_upload_all().await.unwrap();
    lane.wait_for_job("J1", UploadState::InProgress).await;

    lane.handle.shutdown().await.unwrap();

    assert_eq!(lane.job("J1").state(), UploadState::Waiting);
    assert!(matches!(
        lane.handle.status().await,
        Err(UploadError::ServiceClosed)
    ));
}
