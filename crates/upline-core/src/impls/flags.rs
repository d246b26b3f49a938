//! 手動で切り替えられるフラグ（開発・テスト用）

use std::sync::atomic::{AtomicBool, Ordering};

use crate::ports::{ConnectivityOracle, PauseFlag};

/// Connectivity that is whatever it was last set to.
#[derive(Debug)]
pub struct ManualConnectivity {
    connected: AtomicBool,
}

impl ManualConnectivity {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for ManualConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityOracle for ManualConnectivity {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// 再起動で消える一時停止フラグ
#[derive(Debug, Default)]
pub struct MemoryPauseFlag {
    paused: AtomicBool,
}

impl MemoryPauseFlag {
    pub fn new(paused: bool) -> Self {
        Self {
            paused: AtomicBool::new(paused),
        }
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }
}

impl PauseFlag for MemoryPauseFlag {
    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
