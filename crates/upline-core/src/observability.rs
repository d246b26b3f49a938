use serde::{Deserialize, Serialize};

use crate::domain::UploadState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub waiting: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub error: usize,
}

impl QueueCounts {
    pub fn record(&mut self, state: UploadState) {
        match state {
            UploadState::Waiting => self.waiting += 1,
            UploadState::InProgress => self.in_progress += 1,
            UploadState::Completed => self.completed += 1,
            UploadState::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.waiting + self.in_progress + self.completed + self.error
    }
}
