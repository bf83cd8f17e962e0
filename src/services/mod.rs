pub mod activity;
pub mod activity_list;
pub mod subtasks;

pub use activity::ActivityService;
pub use activity_list::{ActivityListService, sort_newest_first};
pub use subtasks::{MutationKind, MutationRecord, MutationState, PendingMutation, SubtaskService};

use crate::error::AppError;

/// Lifecycle of data fetched for one screen.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Turns a fetch result into the next state, handing the error back
    /// to the caller so it can react (e.g. redirect on an expired session).
    pub(crate) fn settle(result: Result<T, AppError>) -> (Self, Result<(), AppError>) {
        match result {
            Ok(data) => (LoadState::Ready(data), Ok(())),
            Err(e) => (LoadState::Failed(e.user_message()), Err(e)),
        }
    }
}
