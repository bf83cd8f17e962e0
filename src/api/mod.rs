pub mod decode;
pub mod dto;
pub mod memory;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::{
    Activity, ActivityPayload, LoginRequest, NewSubtask, RegisterRequest, Subtask, SubtaskPatch,
    TokenPair,
};
use crate::session::SessionHandle;

/// The REST API the client talks to.
#[async_trait]
pub trait ActivityApi: Send + Sync {
    async fn login(&self, req: &LoginRequest) -> Result<TokenPair, AppError>;
    async fn register(&self, req: &RegisterRequest) -> Result<(), AppError>;

    async fn list_activities(&self) -> Result<Vec<Activity>, AppError>;
    async fn get_activity(&self, id: i64) -> Result<Activity, AppError>;
    async fn create_activity(&self, payload: &ActivityPayload) -> Result<Activity, AppError>;
    async fn replace_activity(&self, id: i64, payload: &ActivityPayload) -> Result<Activity, AppError>;
    async fn delete_activity(&self, id: i64) -> Result<(), AppError>;

    async fn list_subtasks(&self, activity_id: i64) -> Result<Vec<Subtask>, AppError>;
    async fn create_subtask(&self, activity_id: i64, new: &NewSubtask) -> Result<Subtask, AppError>;
    async fn patch_subtask(
        &self,
        activity_id: i64,
        subtask_id: i64,
        patch: &SubtaskPatch,
    ) -> Result<(), AppError>;
    async fn delete_subtask(&self, activity_id: i64, subtask_id: i64) -> Result<(), AppError>;
}

pub struct HttpApiClient {
    client: Client,
    config: ApiConfig,
    session: SessionHandle,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig, session: SessionHandle) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Sends one authenticated request and returns the parsed body of a 2xx
    /// response (`None` for an empty body).
    ///
    /// The token is read from the session store for every call. `failure` is
    /// the message shown when the server gives no usable error text.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        failure: &str,
    ) -> Result<Option<Value>, AppError> {
        let token = self.session.access_token().await?.ok_or(AppError::NoSession)?;

        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        debug!("{} {}", method, path);
        let response = request.send().await.map_err(|e| {
            warn!("{} {} failed without response: {}", method, path, e);
            AppError::Connectivity(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.expire(&token).await?;
            return Err(AppError::SessionExpired);
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| AppError::Connectivity(e.to_string()))?;

        if !status.is_success() {
            warn!("{} {} returned {}: {}", method, path, status, body_text);
            return Err(AppError::request(
                status.as_u16(),
                dto::server_message(&body_text),
                failure,
            ));
        }

        if body_text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Value>(&body_text)
            .map(Some)
            .map_err(|e| {
                tracing::error!("Failed to parse response of {} {}: {}", method, path, e);
                AppError::Decode(decode::DecodeError::Json(e.to_string()))
            })
    }

    async fn send_expecting(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        failure: &str,
    ) -> Result<Value, AppError> {
        self.send(method, path, body, failure)
            .await?
            .ok_or_else(|| AppError::Decode(decode::DecodeError::Json("empty response body".to_string())))
    }

    async fn post_public(&self, path: &str, body: Value) -> Result<(StatusCode, String), AppError> {
        let response = self
            .client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("POST {} failed without response: {}", path, e);
                AppError::Connectivity(e.to_string())
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            warn!("POST {} body could not be read: {}", path, e);
            AppError::Connectivity(e.to_string())
        })?;
        Ok((status, body_text))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Validation(format!("No se pudo preparar la solicitud: {}", e)))
}

fn activity_path(id: i64) -> String {
    format!("/api/activities/{}/", id)
}

fn subtasks_path(activity_id: i64) -> String {
    format!("/api/activities/{}/subtasks/", activity_id)
}

fn subtask_path(activity_id: i64, subtask_id: i64) -> String {
    format!("/api/activities/{}/subtasks/{}/", activity_id, subtask_id)
}

#[async_trait]
impl ActivityApi for HttpApiClient {
    async fn login(&self, req: &LoginRequest) -> Result<TokenPair, AppError> {
        let (status, body) = self.post_public("/api/auth/login/", to_json(req)?).await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AppError::request(
                status.as_u16(),
                None,
                "Ocurrió un error al iniciar sesión. Por favor intenta de nuevo.",
            ));
        }

        let tokens = serde_json::from_str::<TokenPair>(&body)
            .map_err(|e| AppError::Decode(decode::DecodeError::Json(e.to_string())))?;
        info!("logged in as {}", req.username);
        Ok(tokens)
    }

    async fn register(&self, req: &RegisterRequest) -> Result<(), AppError> {
        let (status, body) = self.post_public("/api/users/register/", to_json(req)?).await?;

        if !status.is_success() {
            return Err(AppError::request(
                status.as_u16(),
                dto::server_message(&body),
                "Error al crear la cuenta. Por favor intenta de nuevo.",
            ));
        }
        info!("registered {}", req.username);
        Ok(())
    }

    async fn list_activities(&self) -> Result<Vec<Activity>, AppError> {
        let body = self
            .send_expecting(Method::GET, "/api/activities/", None, "Error al conectar con el servidor.")
            .await?;
        Ok(decode::decode_activities(&body)?)
    }

    async fn get_activity(&self, id: i64) -> Result<Activity, AppError> {
        let body = self
            .send_expecting(Method::GET, &activity_path(id), None, "No se pudo cargar la actividad.")
            .await?;
        Ok(decode::decode_activity(&body)?)
    }

    async fn create_activity(&self, payload: &ActivityPayload) -> Result<Activity, AppError> {
        let body = self
            .send_expecting(
                Method::POST,
                "/api/activities/",
                Some(to_json(payload)?),
                "Revisa los datos ingresados.",
            )
            .await?;
        let activity = decode::decode_activity(&body)?;
        info!("created activity {}", activity.id);
        Ok(activity)
    }

    async fn replace_activity(&self, id: i64, payload: &ActivityPayload) -> Result<Activity, AppError> {
        let body = self
            .send_expecting(
                Method::PUT,
                &activity_path(id),
                Some(to_json(payload)?),
                "Error al guardar. Verifica la conexión.",
            )
            .await?;
        Ok(decode::decode_activity(&body)?)
    }

    async fn delete_activity(&self, id: i64) -> Result<(), AppError> {
        self.send(Method::DELETE, &activity_path(id), None, "Error al eliminar la actividad.")
            .await?;
        info!("deleted activity {}", id);
        Ok(())
    }

    async fn list_subtasks(&self, activity_id: i64) -> Result<Vec<Subtask>, AppError> {
        let body = self
            .send_expecting(
                Method::GET,
                &subtasks_path(activity_id),
                None,
                "No se pudieron cargar las subtareas.",
            )
            .await?;
        Ok(decode::decode_subtasks(&body, Some(activity_id))?)
    }

    async fn create_subtask(&self, activity_id: i64, new: &NewSubtask) -> Result<Subtask, AppError> {
        let body = self
            .send_expecting(
                Method::POST,
                &subtasks_path(activity_id),
                Some(to_json(new)?),
                "Error al guardar subactividad.",
            )
            .await?;
        Ok(decode::decode_subtask(&body, Some(activity_id))?)
    }

    async fn patch_subtask(
        &self,
        activity_id: i64,
        subtask_id: i64,
        patch: &SubtaskPatch,
    ) -> Result<(), AppError> {
        self.send(
            Method::PATCH,
            &subtask_path(activity_id, subtask_id),
            Some(to_json(patch)?),
            "No se pudo actualizar el estado de la subtarea.",
        )
        .await?;
        Ok(())
    }

    async fn delete_subtask(&self, activity_id: i64, subtask_id: i64) -> Result<(), AppError> {
        self.send(
            Method::DELETE,
            &subtask_path(activity_id, subtask_id),
            None,
            "No se pudo eliminar la subtarea.",
        )
        .await?;
        Ok(())
    }
}
