//! A small REST backend served by axum on an ephemeral port.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::{Value, json};

use actividades::api::HttpApiClient;
use actividades::config::ApiConfig;
use actividades::models::Session;
use actividades::pages::AppContext;
use actividades::session::{MemorySessionStore, SessionHandle};

pub const VALID_TOKEN: &str = "access-ana";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct MockState {
    requests: Mutex<Vec<Recorded>>,
}

impl MockState {
    fn record(&self, method: Method, path: String, headers: &HeaderMap, body: &str) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = serde_json::from_str(body).ok();
        self.requests.lock().unwrap().push(Recorded {
            method,
            path,
            authorization,
            body,
        });
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

type Shared = State<Arc<MockState>>;

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/auth/login/", post(login))
            .route("/api/users/register/", post(register))
            .route("/api/activities/", get(list_activities).post(create_activity))
            .route(
                "/api/activities/{id}/",
                get(get_activity).put(replace_activity).delete(delete_activity),
            )
            .route(
                "/api/activities/{id}/subtasks/",
                get(list_subtasks).post(create_subtask),
            )
            .route(
                "/api/activities/{id}/subtasks/{sid}/",
                patch(patch_subtask).delete(delete_subtask),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Context wired to this server, with a session holding `token`.
    pub async fn context(&self, token: Option<&str>) -> AppContext {
        let session = SessionHandle::new(Arc::new(MemorySessionStore::default()));
        if let Some(token) = token {
            session
                .start(&Session {
                    access_token: token.to_string(),
                    refresh_token: "refresh-ana".to_string(),
                    username: "ana".to_string(),
                })
                .await
                .unwrap();
        }
        let api = HttpApiClient::new(ApiConfig::with_base_url(&self.base_url), session.clone()).unwrap();
        AppContext::new(Arc::new(api), session)
    }
}

/// Answers one request with a 200 whose body stops short of its
/// `Content-Length`, then hangs up.
pub async fn truncated_body_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.ends_with(b"}") {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }
        stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"access\": \"acc")
            .await
            .unwrap();
        stream.shutdown().await.ok();
    });
    format!("http://{}", addr)
}

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", VALID_TOKEN);
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Given token not valid for any token type" })),
        )
            .into_response()),
    }
}

fn activity(id: i64, title: &str, created: &str) -> Value {
    json!({
        "id": id,
        "titulo": title,
        "tipo": "exam",
        "curso": "Cálculo",
        "descripcion": "",
        "fecha_limite": "2024-05-01",
        "fecha_creacion": created,
    })
}

fn subtask(id: i64, name: &str, estado: &str) -> Value {
    json!({
        "id": id,
        "nombre": name,
        "estado": estado,
        "fecha_objetivo": "2024-04-20",
        "horas_estimadas": 2.0,
    })
}

async fn login(State(state): Shared, headers: HeaderMap, body: String) -> Response {
    state.record(Method::POST, "/api/auth/login/".into(), &headers, &body);
    let creds: Value = serde_json::from_str(&body).unwrap_or_default();
    if creds["username"] == "ana" && creds["password"] == "secreto123" {
        Json(json!({ "access": VALID_TOKEN, "refresh": "refresh-ana" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response()
    }
}

async fn register(State(state): Shared, headers: HeaderMap, body: String) -> Response {
    state.record(Method::POST, "/api/users/register/".into(), &headers, &body);
    let req: Value = serde_json::from_str(&body).unwrap_or_default();
    if req["username"] == "ana" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "El usuario ya existe." })),
        )
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({ "message": "ok" }))).into_response()
}

async fn list_activities(State(state): Shared, headers: HeaderMap) -> Response {
    state.record(Method::GET, "/api/activities/".into(), &headers, "");
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!([
        activity(1, "Parcial 1", "2024-01-02T10:00:00Z"),
        activity(2, "Parcial 2", "2024-01-05T10:00:00Z"),
    ]))
    .into_response()
}

async fn create_activity(State(state): Shared, headers: HeaderMap, body: String) -> Response {
    state.record(Method::POST, "/api/activities/".into(), &headers, &body);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut payload: Value = serde_json::from_str(&body).unwrap_or_default();
    if payload["titulo"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "titulo": ["Este campo es obligatorio."] })),
        )
            .into_response();
    }
    payload["id"] = json!(3);
    payload["fecha_creacion"] = json!("2024-02-01T08:00:00Z");
    (StatusCode::CREATED, Json(payload)).into_response()
}

async fn get_activity(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    state.record(Method::GET, format!("/api/activities/{}/", id), &headers, "");
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    if id != 1 {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "No encontrado." }))).into_response();
    }
    let mut record = activity(1, "Parcial 1", "2024-01-02T10:00:00Z");
    record["subtareas"] = json!([subtask(10, "Leer capítulo 2", "pending")]);
    Json(record).into_response()
}

async fn replace_activity(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: String,
) -> Response {
    state.record(Method::PUT, format!("/api/activities/{}/", id), &headers, &body);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut payload: Value = serde_json::from_str(&body).unwrap_or_default();
    payload["id"] = json!(id);
    Json(payload).into_response()
}

async fn delete_activity(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    state.record(Method::DELETE, format!("/api/activities/{}/", id), &headers, "");
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_subtasks(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    state.record(Method::GET, format!("/api/activities/{}/subtasks/", id), &headers, "");
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!({
        "results": [
            subtask(10, "Leer capítulo 2", "pending"),
            subtask(11, "Resolver guía", "done"),
        ]
    }))
    .into_response()
}

async fn create_subtask(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: String,
) -> Response {
    state.record(Method::POST, format!("/api/activities/{}/subtasks/", id), &headers, &body);
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut payload: Value = serde_json::from_str(&body).unwrap_or_default();
    payload["id"] = json!(12);
    (StatusCode::CREATED, Json(payload)).into_response()
}

async fn patch_subtask(
    State(state): Shared,
    headers: HeaderMap,
    Path((id, sid)): Path<(i64, i64)>,
    body: String,
) -> Response {
    state.record(
        Method::PATCH,
        format!("/api/activities/{}/subtasks/{}/", id, sid),
        &headers,
        &body,
    );
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let patch: Value = serde_json::from_str(&body).unwrap_or_default();
    let estado = patch["estado"].as_str().unwrap_or("pending");
    Json(subtask(sid, "Leer capítulo 2", estado)).into_response()
}

async fn delete_subtask(
    State(state): Shared,
    headers: HeaderMap,
    Path((id, sid)): Path<(i64, i64)>,
) -> Response {
    state.record(
        Method::DELETE,
        format!("/api/activities/{}/subtasks/{}/", id, sid),
        &headers,
        "",
    );
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    StatusCode::NO_CONTENT.into_response()
}
