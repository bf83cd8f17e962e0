use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ActivityApi;
use crate::error::AppError;
use crate::models::Activity;

use super::LoadState;

/// All activities of the current session, newest first.
pub struct ActivityListService {
    api: Arc<dyn ActivityApi>,
    state: LoadState<Vec<Activity>>,
}

impl ActivityListService {
    pub fn new(api: Arc<dyn ActivityApi>) -> Self {
        Self {
            api,
            state: LoadState::Loading,
        }
    }

    pub fn state(&self) -> &LoadState<Vec<Activity>> {
        &self.state
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        self.state = LoadState::Loading;

        let result = self.api.list_activities().await.map(|mut activities| {
            sort_newest_first(&mut activities);
            activities
        });
        if let Err(e) = &result {
            warn!("Failed to load activities: {}", e);
        }

        let (state, outcome) = LoadState::settle(result);
        if let LoadState::Ready(activities) = &state {
            info!("loaded {} activities", activities.len());
        }
        self.state = state;
        outcome
    }
}

/// Sorts by creation timestamp, descending. Records without one go last;
/// equal keys keep the server's order.
pub fn sort_newest_first(activities: &mut [Activity]) {
    activities.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
