use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ActivityApi;
use crate::error::AppError;
use crate::models::{Activity, ActivityPayload};

use super::LoadState;

/// One activity, keyed by id.
pub struct ActivityService {
    api: Arc<dyn ActivityApi>,
    id: i64,
    state: LoadState<Activity>,
}

impl ActivityService {
    pub fn new(api: Arc<dyn ActivityApi>, id: i64) -> Self {
        Self {
            api,
            id,
            state: LoadState::Loading,
        }
    }

    pub fn state(&self) -> &LoadState<Activity> {
        &self.state
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        self.state = LoadState::Loading;
        let result = self.api.get_activity(self.id).await;
        if let Err(e) = &result {
            warn!("Failed to load activity {}: {}", self.id, e);
        }
        let (state, outcome) = LoadState::settle(result);
        self.state = state;
        outcome
    }

    /// Identity-key change: forget the old record and fetch the new one.
    pub async fn switch_to(&mut self, id: i64) -> Result<(), AppError> {
        self.id = id;
        self.load().await
    }

    /// Replaces the whole record (PUT) and keeps the server's version.
    pub async fn replace(&mut self, payload: &ActivityPayload) -> Result<Activity, AppError> {
        let updated = self.api.replace_activity(self.id, payload).await?;
        info!("activity {} updated", self.id);
        self.state = LoadState::Ready(updated.clone());
        Ok(updated)
    }

    pub async fn delete(&mut self) -> Result<(), AppError> {
        self.api.delete_activity(self.id).await?;
        info!("activity {} deleted", self.id);
        self.state = LoadState::Failed("La actividad fue eliminada.".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{ApiCall, Failure, InMemoryApi};

    fn two_activities() -> (Arc<InMemoryApi>, i64, i64) {
        let api = Arc::new(InMemoryApi::new());
        let first = api.seed_activity("Parcial 1", "2024-01-01");
        let second = api.seed_activity("Quiz 2", "2024-01-02");
        (api, first, second)
    }

    #[tokio::test]
    async fn switching_fetches_the_new_record_once() {
        let (api, first, second) = two_activities();
        let mut service = ActivityService::new(api.clone(), first);
        service.load().await.unwrap();
        assert_eq!(service.state().data().map(|a| a.id), Some(first));

        service.switch_to(second).await.unwrap();
        let shown = service.state().data().unwrap();
        assert_eq!(shown.id, second);
        assert_eq!(shown.title, "Quiz 2");

        let fetches: Vec<ApiCall> = api
            .calls()
            .into_iter()
            .filter(|c| *c == ApiCall::GetActivity(second))
            .collect();
        assert_eq!(fetches.len(), 1);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn switching_to_a_missing_record_drops_the_old_one() {
        let (api, first, _) = two_activities();
        let mut service = ActivityService::new(api.clone(), first);
        service.load().await.unwrap();

        assert!(service.switch_to(99).await.is_err());
        assert!(matches!(service.state(), LoadState::Failed(_)));
        assert!(service.state().data().is_none());
    }

    #[tokio::test]
    async fn failed_switch_does_not_keep_stale_data() {
        let (api, first, second) = two_activities();
        let mut service = ActivityService::new(api.clone(), first);
        service.load().await.unwrap();

        api.fail_next(Failure::Offline);
        let err = service.switch_to(second).await.unwrap_err();
        assert!(matches!(err, AppError::Connectivity(_)));
        assert_eq!(*service.state(), LoadState::Failed(err.user_message()));
        assert_eq!(api.calls().last(), Some(&ApiCall::GetActivity(second)));
    }
}
