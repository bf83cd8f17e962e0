use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::ActivityApi;
use super::decode::parse_timestamp;
use crate::error::AppError;
use crate::models::{
    Activity, ActivityKind, ActivityPayload, LoginRequest, NewSubtask, RegisterRequest, Subtask,
    SubtaskId, SubtaskPatch, SubtaskStatus, TokenPair,
};

/// Every request the in-memory server saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Login(String),
    Register(String),
    ListActivities,
    GetActivity(i64),
    CreateActivity(ActivityPayload),
    ReplaceActivity(i64, ActivityPayload),
    DeleteActivity(i64),
    ListSubtasks(i64),
    CreateSubtask(i64, NewSubtask),
    PatchSubtask(i64, i64, SubtaskPatch),
    DeleteSubtask(i64, i64),
}

/// Outcome forced onto the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unauthorized,
    Status(u16),
    Offline,
}

impl Failure {
    fn into_error(self) -> AppError {
        match self {
            Failure::Unauthorized => AppError::SessionExpired,
            Failure::Status(status) => AppError::Request {
                status,
                message: format!("El servidor respondió {}.", status),
            },
            Failure::Offline => AppError::Connectivity("connection refused".to_string()),
        }
    }
}

#[derive(Default)]
struct Inner {
    activities: Vec<Activity>,
    subtasks: Vec<Subtask>,
    users: HashMap<String, String>,
    next_id: i64,
    calls: Vec<ApiCall>,
    fail_next: Option<Failure>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_subtasks(&self, activity: &Activity) -> Activity {
        let mut activity = activity.clone();
        activity.subtasks = self
            .subtasks
            .iter()
            .filter(|s| s.activity_id == Some(activity.id))
            .cloned()
            .collect();
        activity
    }

    fn find_activity(&self, id: i64) -> Result<&Activity, AppError> {
        self.activities
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::request(404, None, "No se pudo cargar la actividad."))
    }
}

/// A REST server held in memory: same contract as [`super::HttpApiClient`],
/// no network. Useful for exercising services and pages.
#[derive(Default)]
pub struct InMemoryApi {
    inner: Mutex<Inner>,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Logs the call and applies any forced failure.
    fn begin(&self, call: ApiCall) -> Result<MutexGuard<'_, Inner>, AppError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        match inner.fail_next.take() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(inner),
        }
    }

    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.lock().users.insert(username.to_string(), password.to_string());
        self
    }

    pub fn fail_next(&self, failure: Failure) {
        self.lock().fail_next = Some(failure);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn seed_activity(&self, title: &str, created: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.activities.push(Activity {
            id,
            title: title.to_string(),
            kind: ActivityKind::Other,
            course: "General".to_string(),
            description: None,
            event_at: None,
            due_date: None,
            created_at: parse_timestamp(created),
            subtasks: Vec::new(),
        });
        id
    }

    pub fn seed_subtask(&self, activity_id: i64, name: &str, status: SubtaskStatus) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.subtasks.push(Subtask {
            id: SubtaskId::Remote(id),
            activity_id: Some(activity_id),
            name: name.to_string(),
            status,
            target_date: None,
            estimated_hours: Some(1.0),
        });
        id
    }

    pub fn activity(&self, id: i64) -> Option<Activity> {
        let inner = self.lock();
        inner.find_activity(id).ok().map(|a| inner.with_subtasks(a))
    }

    pub fn subtasks_of(&self, activity_id: i64) -> Vec<Subtask> {
        self.lock()
            .subtasks
            .iter()
            .filter(|s| s.activity_id == Some(activity_id))
            .cloned()
            .collect()
    }
}

fn apply_payload(activity: &mut Activity, payload: &ActivityPayload) {
    activity.title = payload.titulo.clone();
    activity.kind = payload.tipo;
    activity.course = payload.curso.clone();
    activity.description = Some(payload.descripcion.clone()).filter(|d| !d.is_empty());
    activity.event_at = payload.fecha_evento;
    activity.due_date = payload.fecha_limite;
}

#[async_trait]
impl ActivityApi for InMemoryApi {
    async fn login(&self, req: &LoginRequest) -> Result<TokenPair, AppError> {
        let inner = self.begin(ApiCall::Login(req.username.clone()))?;
        match inner.users.get(&req.username) {
            Some(password) if *password == req.password => Ok(TokenPair {
                access: format!("access-{}", req.username),
                refresh: format!("refresh-{}", req.username),
            }),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    async fn register(&self, req: &RegisterRequest) -> Result<(), AppError> {
        let mut inner = self.begin(ApiCall::Register(req.username.clone()))?;
        if inner.users.contains_key(&req.username) {
            return Err(AppError::request(400, Some("El usuario ya existe.".to_string()), ""));
        }
        inner.users.insert(req.username.clone(), req.password.clone());
        Ok(())
    }

    async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        let inner = self.begin(ApiCall::ListActivities)?;
        Ok(inner.activities.iter().map(|a| inner.with_subtasks(a)).collect())
    }

    async fn get_activity(&self, id: i64) -> Result<Activity, AppError> {
        let inner = self.begin(ApiCall::GetActivity(id))?;
        let activity = inner.find_activity(id)?;
        Ok(inner.with_subtasks(activity))
    }

    async fn create_activity(&self, payload: &ActivityPayload) -> Result<Activity, AppError> {
        let mut inner = self.begin(ApiCall::CreateActivity(payload.clone()))?;
        let mut activity = Activity {
            id: inner.next_id(),
            title: String::new(),
            kind: ActivityKind::Other,
            course: String::new(),
            description: None,
            event_at: None,
            due_date: None,
            created_at: Some(Utc::now()),
            subtasks: Vec::new(),
        };
        apply_payload(&mut activity, payload);
        inner.activities.push(activity.clone());
        Ok(activity)
    }

    async fn replace_activity(&self, id: i64, payload: &ActivityPayload) -> Result<Activity, AppError> {
        let mut inner = self.begin(ApiCall::ReplaceActivity(id, payload.clone()))?;
        let updated = match inner.activities.iter_mut().find(|a| a.id == id) {
            Some(activity) => {
                apply_payload(activity, payload);
                activity.clone()
            }
            None => return Err(AppError::request(404, None, "No se pudo cargar la actividad.")),
        };
        Ok(inner.with_subtasks(&updated))
    }

    async fn delete_activity(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.begin(ApiCall::DeleteActivity(id))?;
        inner.find_activity(id)?;
        inner.activities.retain(|a| a.id != id);
        inner.subtasks.retain(|s| s.activity_id != Some(id));
        Ok(())
    }

    async fn list_subtasks(&self, activity_id: i64) -> Result<Vec<Subtask>, AppError> {
        let inner = self.begin(ApiCall::ListSubtasks(activity_id))?;
        inner.find_activity(activity_id)?;
        Ok(inner
            .subtasks
            .iter()
            .filter(|s| s.activity_id == Some(activity_id))
            .cloned()
            .collect())
    }

    async fn create_subtask(&self, activity_id: i64, new: &NewSubtask) -> Result<Subtask, AppError> {
        let mut inner = self.begin(ApiCall::CreateSubtask(activity_id, new.clone()))?;
        inner.find_activity(activity_id)?;
        let id = inner.next_id();
        let subtask = Subtask::from_new(SubtaskId::Remote(id), Some(activity_id), new);
        inner.subtasks.push(subtask.clone());
        Ok(subtask)
    }

    async fn patch_subtask(
        &self,
        activity_id: i64,
        subtask_id: i64,
        patch: &SubtaskPatch,
    ) -> Result<(), AppError> {
        let mut inner = self.begin(ApiCall::PatchSubtask(activity_id, subtask_id, patch.clone()))?;
        let subtask = inner
            .subtasks
            .iter_mut()
            .find(|s| s.id == SubtaskId::Remote(subtask_id) && s.activity_id == Some(activity_id))
            .ok_or_else(|| AppError::request(404, None, "No se encontró la subtarea."))?;

        if let Some(status) = patch.estado {
            subtask.status = status;
        }
        if let Some(name) = &patch.nombre {
            subtask.name = name.clone();
        }
        if let Some(date) = patch.fecha_objetivo {
            subtask.target_date = Some(date);
        }
        if let Some(hours) = patch.horas_estimadas {
            subtask.estimated_hours = Some(hours);
        }
        Ok(())
    }

    async fn delete_subtask(&self, activity_id: i64, subtask_id: i64) -> Result<(), AppError> {
        let mut inner = self.begin(ApiCall::DeleteSubtask(activity_id, subtask_id))?;
        let before = inner.subtasks.len();
        inner
            .subtasks
            .retain(|s| !(s.id == SubtaskId::Remote(subtask_id) && s.activity_id == Some(activity_id)));
        if inner.subtasks.len() == before {
            return Err(AppError::request(404, None, "No se encontró la subtarea."));
        }
        Ok(())
    }
}
