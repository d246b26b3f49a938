//! Domain model (IDs, job, states, events, job-level errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod job;
pub mod state;

pub use self::errors::{ErrorKind, TransferError};
pub use self::events::{ExecutorReport, JobTransition, ProgressNotice, UploadEvent};
pub use self::ids::{TaskId, UploadId};
pub use self::job::{JobSnapshot, UploadJob};
pub use self::state::{SupervisorPhase, UploadState};
