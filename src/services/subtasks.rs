use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::ActivityApi;
use crate::error::AppError;
use crate::models::{NewSubtask, Progress, Subtask, SubtaskId, SubtaskPatch, SubtaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Committed,
    Failed,
}

/// A local change and the request that confirms it.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationKind {
    Add { placeholder: SubtaskId, new: NewSubtask },
    Remove { subtask: Subtask, index: usize },
    Patch { previous: Subtask, patch: SubtaskPatch },
}

impl MutationKind {
    fn target(&self) -> SubtaskId {
        match self {
            MutationKind::Add { placeholder, .. } => *placeholder,
            MutationKind::Remove { subtask, .. } => subtask.id,
            MutationKind::Patch { previous, .. } => previous.id,
        }
    }
}

/// Returned by the `begin_*` methods once the change is visible locally.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub id: Uuid,
    pub kind: MutationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub id: Uuid,
    pub target: SubtaskId,
    pub state: MutationState,
    pub error: Option<String>,
}

/// Subtasks of one activity, with optimistic mutations.
///
/// Without an activity id the service works on drafts: every change stays
/// local and commits at once. Otherwise each change is applied locally,
/// sent, and rolled back if the server refuses it.
pub struct SubtaskService {
    api: Arc<dyn ActivityApi>,
    activity_id: Option<i64>,
    items: Vec<Subtask>,
    mutations: Vec<MutationRecord>,
}

impl SubtaskService {
    pub fn new(api: Arc<dyn ActivityApi>, activity_id: Option<i64>) -> Self {
        Self {
            api,
            activity_id,
            items: Vec::new(),
            mutations: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Subtask] {
        &self.items
    }

    pub fn mutations(&self) -> &[MutationRecord] {
        &self.mutations
    }

    pub fn is_saving(&self) -> bool {
        self.mutations.iter().any(|m| m.state == MutationState::Pending)
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.items)
    }

    pub fn get(&self, id: SubtaskId) -> Option<&Subtask> {
        self.items.iter().find(|s| s.id == id)
    }

    pub async fn load(&mut self) -> Result<(), AppError> {
        let Some(activity_id) = self.activity_id else {
            return Ok(());
        };
        self.items = self
            .api
            .list_subtasks(activity_id)
            .await
            .inspect_err(|e| warn!("Failed to load subtasks of activity {}: {}", activity_id, e))?;
        Ok(())
    }

    pub fn begin_add(&mut self, new: NewSubtask) -> PendingMutation {
        let placeholder = SubtaskId::new_draft();
        self.items.push(Subtask::from_new(placeholder, self.activity_id, &new));
        self.record(MutationKind::Add { placeholder, new })
    }

    pub fn begin_remove(&mut self, id: SubtaskId) -> Result<PendingMutation, AppError> {
        let index = self.index_of(id)?;
        let subtask = self.items.remove(index);
        Ok(self.record(MutationKind::Remove { subtask, index }))
    }

    pub fn begin_set_status(&mut self, id: SubtaskId, status: SubtaskStatus) -> Result<PendingMutation, AppError> {
        let index = self.index_of(id)?;
        let previous = self.items[index].clone();
        self.items[index].status = status;
        Ok(self.record(MutationKind::Patch {
            previous,
            patch: SubtaskPatch::status(status),
        }))
    }

    pub fn begin_toggle(&mut self, id: SubtaskId) -> Result<PendingMutation, AppError> {
        let index = self.index_of(id)?;
        let next = self.items[index].status.toggled();
        self.begin_set_status(id, next)
    }

    /// Issues the request behind a mutation. Draft ids and draft mode never
    /// reach the network.
    pub async fn send(&self, mutation: &PendingMutation) -> Result<Option<Subtask>, AppError> {
        let Some(activity_id) = self.activity_id else {
            return Ok(None);
        };

        match &mutation.kind {
            MutationKind::Add { new, .. } => self.api.create_subtask(activity_id, new).await.map(Some),
            MutationKind::Remove { subtask, .. } => match subtask.id.remote() {
                Some(id) => self.api.delete_subtask(activity_id, id).await.map(|_| None),
                None => Ok(None),
            },
            MutationKind::Patch { previous, patch } => match previous.id.remote() {
                Some(id) => self.api.patch_subtask(activity_id, id, patch).await.map(|_| None),
                None => Ok(None),
            },
        }
    }

    /// Commits a mutation or rolls its local change back.
    pub fn settle(
        &mut self,
        mutation: PendingMutation,
        result: Result<Option<Subtask>, AppError>,
    ) -> Result<(), AppError> {
        match result {
            Ok(confirmed) => {
                if let (MutationKind::Add { placeholder, .. }, Some(server)) = (&mutation.kind, confirmed) {
                    if let Some(slot) = self.items.iter_mut().find(|s| s.id == *placeholder) {
                        *slot = server;
                    }
                }
                self.mark(mutation.id, MutationState::Committed, None);
                debug!("mutation {} committed", mutation.id);
                Ok(())
            }
            Err(e) => {
                self.rollback(&mutation.kind);
                self.mark(mutation.id, MutationState::Failed, Some(e.user_message()));
                warn!("mutation {} failed, local change rolled back: {}", mutation.id, e);
                Err(e)
            }
        }
    }

    /// Adds a subtask; returns its final id (server id, or a draft id in draft mode).
    pub async fn add(&mut self, new: NewSubtask) -> Result<SubtaskId, AppError> {
        let mutation = self.begin_add(new);
        let placeholder = mutation.kind.target();
        let result = self.send(&mutation).await;
        let final_id = match &result {
            Ok(Some(server)) => server.id,
            _ => placeholder,
        };
        self.settle(mutation, result)?;
        Ok(final_id)
    }

    pub async fn remove(&mut self, id: SubtaskId) -> Result<(), AppError> {
        let mutation = self.begin_remove(id)?;
        let result = self.send(&mutation).await;
        self.settle(mutation, result)
    }

    pub async fn set_status(&mut self, id: SubtaskId, status: SubtaskStatus) -> Result<(), AppError> {
        let mutation = self.begin_set_status(id, status)?;
        let result = self.send(&mutation).await;
        self.settle(mutation, result)
    }

    /// Flips completion and returns the new status.
    pub async fn toggle(&mut self, id: SubtaskId) -> Result<SubtaskStatus, AppError> {
        let mutation = self.begin_toggle(id)?;
        let status = match &mutation.kind {
            MutationKind::Patch { patch, .. } => patch.estado.unwrap_or_default(),
            _ => SubtaskStatus::default(),
        };
        let result = self.send(&mutation).await;
        self.settle(mutation, result)?;
        Ok(status)
    }

    /// Binds drafted subtasks to a freshly created activity and posts them.
    ///
    /// Subtasks the server refuses are dropped and reported in the log; an
    /// expired session stops the loop. Returns how many were created.
    pub async fn attach(&mut self, activity_id: i64) -> Result<usize, AppError> {
        self.activity_id = Some(activity_id);
        let drafts = std::mem::take(&mut self.items);
        let mut created = 0;

        for draft in drafts {
            let Some(new) = draft.as_new_subtask() else {
                warn!("Skipping incomplete draft subtask {}", draft.id);
                continue;
            };
            let mutation = self.begin_add(new);
            let result = self.send(&mutation).await;
            let stop = matches!(&result, Err(e) if e.requires_login());
            match self.settle(mutation, result) {
                Ok(()) => created += 1,
                Err(e) if stop => return Err(e),
                Err(_) => {}
            }
        }

        info!("attached {} subtasks to activity {}", created, activity_id);
        Ok(created)
    }

    fn index_of(&self, id: SubtaskId) -> Result<usize, AppError> {
        self.items
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("subtarea {}", id)))
    }

    fn record(&mut self, kind: MutationKind) -> PendingMutation {
        let mutation = PendingMutation {
            id: Uuid::new_v4(),
            kind,
        };
        self.mutations.push(MutationRecord {
            id: mutation.id,
            target: mutation.kind.target(),
            state: MutationState::Pending,
            error: None,
        });
        mutation
    }

    fn mark(&mut self, id: Uuid, state: MutationState, error: Option<String>) {
        if let Some(record) = self.mutations.iter_mut().find(|m| m.id == id) {
            record.state = state;
            record.error = error;
        }
    }

    fn rollback(&mut self, kind: &MutationKind) {
        match kind {
            MutationKind::Add { placeholder, .. } => {
                self.items.retain(|s| s.id != *placeholder);
            }
            MutationKind::Remove { subtask, index } => {
                let at = (*index).min(self.items.len());
                self.items.insert(at, subtask.clone());
            }
            MutationKind::Patch { previous, .. } => {
                if let Some(slot) = self.items.iter_mut().find(|s| s.id == previous.id) {
                    *slot = previous.clone();
                }
            }
        }
    }
}
