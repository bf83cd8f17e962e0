pub mod activity;
pub mod session;
pub mod subtask;

pub use activity::{Activity, ActivityKind, ActivityPayload};
pub use session::{LoginRequest, RegisterRequest, Session, SessionKey, TokenPair};
pub use subtask::{NewSubtask, Progress, Subtask, SubtaskId, SubtaskPatch, SubtaskStatus, progress_percent};
