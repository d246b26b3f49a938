use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use upline_core::UploadServiceHandle;
use upline_core::app::UploadServiceBuilder;
use upline_core::config::UploadConfig;
use upline_core::domain::UploadEvent;
use upline_core::impls::{
    FilePauseFlag, InMemoryUploadQueue, ManualConnectivity, MemoryPauseFlag, SimulatedTransfer,
};
use upline_core::ports::PauseFlag;

/// Drain a queue of simulated uploads through the upload lane.
#[derive(Debug, Parser)]
#[command(name = "upline", version)]
struct Args {
    /// Path to upline.toml.
    #[arg(long, default_value = "upline.toml")]
    config: PathBuf,

    /// Number of jobs to enqueue.
    #[arg(long, default_value_t = 3)]
    jobs: usize,

    /// Override transfer_duration_ms from the config.
    #[arg(long)]
    transfer_ms: Option<u64>,

    /// Start with connectivity down.
    #[arg(long)]
    offline: bool,

    /// Pause uploading after this many milliseconds.
    #[arg(long)]
    pause_after_ms: Option<u64>,

    /// Resume uploading after this many milliseconds.
    #[arg(long)]
    resume_after_ms: Option<u64>,
}

/// Pause flag the demo can flip, durable or not.
#[derive(Clone)]
enum DemoPause {
    File(Arc<FilePauseFlag>),
    Memory(Arc<MemoryPauseFlag>),
}

impl DemoPause {
    fn open(config: &UploadConfig) -> anyhow::Result<Self> {
        match &config.pause_file {
            Some(path) => {
                let flag = FilePauseFlag::open(path)
                    .with_context(|| format!("open pause file {}", path.display()))?;
                Ok(Self::File(Arc::new(flag)))
            }
            None => Ok(Self::Memory(Arc::new(MemoryPauseFlag::default()))),
        }
    }

    fn as_port(&self) -> Arc<dyn PauseFlag> {
        match self {
            Self::File(flag) => flag.clone(),
            Self::Memory(flag) => flag.clone(),
        }
    }

    fn set(&self, paused: bool) -> anyhow::Result<()> {
        match self {
            Self::File(flag) => flag.set_paused(paused)?,
            Self::Memory(flag) => flag.set_paused(paused),
        }
        Ok(())
    }
}

/// After `delay`, flip the pause flag and tell the service.
fn schedule_pause(handle: UploadServiceHandle, pause: DemoPause, delay: Duration, paused: bool) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(err) = pause.set(paused) {
            tracing::error!(%err, paused, "cannot set pause flag");
            return;
        }
        if let Err(err) = handle.notify_pause_state_changed().await {
            tracing::error!(%err, "cannot notify pause change");
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // (A) 設定と協調者を用意
    let mut config = UploadConfig::load(&args.config)
        .with_context(|| format!("load config {}", args.config.display()))?;
    if let Some(ms) = args.transfer_ms {
        config.transfer_duration_ms = ms;
    }

    let queue = Arc::new(InMemoryUploadQueue::new());
    for n in 1..=args.jobs {
        queue.push(format!("IMG_{n:04}.jpg"));
    }
    let pause = DemoPause::open(&config)?;
    let transfer = SimulatedTransfer::new(config.transfer_duration(), config.cancel_poll());

    // (B) サービスを起動
    let handle = UploadServiceBuilder::new()
        .config(config)
        .queue(queue.clone())
        .connectivity(Arc::new(ManualConnectivity::new(!args.offline)))
        .pause(pause.as_port())
        .transfer(Arc::new(transfer))
        .build()?
        .start();
    let mut events = handle.subscribe();

    // (C) 一時停止 / 再開のタイマー
    if let Some(ms) = args.pause_after_ms {
        schedule_pause(handle.clone(), pause.clone(), Duration::from_millis(ms), true);
    }
    let mut resume_pending = args.resume_after_ms.is_some();
    if let Some(ms) = args.resume_after_ms {
        schedule_pause(handle.clone(), pause.clone(), Duration::from_millis(ms), false);
    }

    let answer = handle.request_upload_all().await?;
    tracing::info!(?answer, keep_alive = answer.keep_alive(), "upload requested");

    // (D) Stopped が来て、再開待ちもなければ終了
    loop {
        match events.recv().await {
            Ok(event) => {
                tracing::info!(event = %serde_json::to_string(&event)?, "event");
                match event {
                    UploadEvent::PauseStateChanged { paused: false } => resume_pending = false,
                    UploadEvent::Stopped { .. } if !resume_pending => break,
                    _ => {}
                }
            }
            Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "event stream lagged"),
            Err(RecvError::Closed) => break,
        }
    }

    // (E) 最終状態を出力して停止
    let status = handle.status().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    println!("{}", serde_json::to_string_pretty(&queue.counts_by_state())?);
    handle.shutdown().await?;
    Ok(())
}
