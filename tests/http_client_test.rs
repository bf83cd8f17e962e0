mod common;

use std::sync::Arc;

use axum::http::Method;
use serde_json::json;

use actividades::api::{ActivityApi, HttpApiClient};
use actividades::config::ApiConfig;
use actividades::error::AppError;
use actividades::forms::{LoginForm, RegisterForm};
use actividades::models::{ActivityKind, ActivityPayload, LoginRequest, Session};
use actividades::pages::{self, Outcome, Route};
use actividades::services::ActivityListService;
use actividades::session::{SessionHandle, SqliteSessionStore};

use common::{MockServer, VALID_TOKEN, truncated_body_server};

fn payload(titulo: &str) -> ActivityPayload {
    ActivityPayload {
        titulo: titulo.to_string(),
        tipo: ActivityKind::Quiz,
        curso: "Física".to_string(),
        descripcion: String::new(),
        fecha_evento: None,
        fecha_limite: None,
    }
}

#[tokio::test]
async fn list_sends_bearer_and_sorts_newest_first() {
    let server = MockServer::start().await;
    let ctx = server.context(Some(VALID_TOKEN)).await;

    let mut service = ActivityListService::new(ctx.api.clone());
    service.load().await.unwrap();

    let ids: Vec<i64> = service.state().data().unwrap().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let requests = server.state.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some(format!("Bearer {}", VALID_TOKEN).as_str())
    );
}

#[tokio::test]
async fn rejected_token_clears_session_and_redirects() {
    let server = MockServer::start().await;
    let ctx = server.context(Some("access-vencido")).await;

    let outcome = pages::activities::list(&ctx).await;
    assert!(outcome.redirects_to(Route::Login));
    assert!(!ctx.session.is_active().await.unwrap());
    assert_eq!(ctx.session.current().await.unwrap(), None);
}

#[tokio::test]
async fn missing_session_sends_nothing() {
    let server = MockServer::start().await;
    let ctx = server.context(None).await;

    let err = ctx.api.list_activities().await.unwrap_err();
    assert!(matches!(err, AppError::NoSession));
    assert!(server.state.requests().is_empty());
}

#[tokio::test]
async fn field_errors_become_the_message() {
    let server = MockServer::start().await;
    let ctx = server.context(Some(VALID_TOKEN)).await;

    let err = ctx.api.create_activity(&payload("")).await.unwrap_err();
    match err {
        AppError::Request { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Este campo es obligatorio.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn create_posts_spanish_field_names() {
    let server = MockServer::start().await;
    let ctx = server.context(Some(VALID_TOKEN)).await;

    let created = ctx.api.create_activity(&payload("Quiz 3")).await.unwrap();
    assert_eq!(created.id, 3);
    assert_eq!(created.kind, ActivityKind::Quiz);

    let body = server.state.requests()[0].body.clone().unwrap();
    assert_eq!(body["titulo"], "Quiz 3");
    assert_eq!(body["tipo"], "quiz");
    assert_eq!(body["curso"], "Física");
}

#[tokio::test]
async fn unreachable_server_is_a_connectivity_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let server = MockServer::start().await;
    let ctx = server.context(Some(VALID_TOKEN)).await;
    let api = HttpApiClient::new(ApiConfig::with_base_url(format!("http://{}", addr)), ctx.session.clone()).unwrap();

    let err = api.list_activities().await.unwrap_err();
    assert!(matches!(err, AppError::Connectivity(_)));
    assert!(ctx.session.is_active().await.unwrap());
}

#[tokio::test]
async fn login_body_cut_short_is_a_connectivity_error() {
    let base_url = truncated_body_server().await;
    let server = MockServer::start().await;
    let ctx = server.context(None).await;
    let api = HttpApiClient::new(ApiConfig::with_base_url(base_url), ctx.session.clone()).unwrap();

    let err = api
        .login(&LoginRequest {
            username: "ana".into(),
            password: "secreto123".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Connectivity(_)), "{:?}", err);
    assert!(!ctx.session.is_active().await.unwrap());
}

#[tokio::test]
async fn delete_accepts_empty_204() {
    let server = MockServer::start().await;
    let ctx = server.context(Some(VALID_TOKEN)).await;

    let outcome = pages::edit::delete(&ctx, 1, true).await;
    assert!(outcome.redirects_to(Route::Activities));

    let requests = server.state.requests();
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(requests[0].path, "/api/activities/1/");
}

#[tokio::test]
async fn toggle_patches_only_the_status() {
    let server = MockServer::start().await;
    let ctx = server.context(Some(VALID_TOKEN)).await;

    let Outcome::Render(text) = pages::subtasks::toggle(&ctx, 1, 10).await else {
        panic!("expected the updated list");
    };
    assert!(text.contains("2 de 2 subtareas completadas"));

    let patch = server
        .state
        .requests()
        .into_iter()
        .find(|r| r.method == Method::PATCH)
        .unwrap();
    assert_eq!(patch.path, "/api/activities/1/subtasks/10/");
    assert_eq!(patch.body, Some(json!({ "estado": "done" })));
}

#[tokio::test]
async fn detail_renders_progress() {
    let server = MockServer::start().await;
    let ctx = server.context(Some(VALID_TOKEN)).await;

    let Outcome::Render(text) = pages::detail::show(&ctx, 1).await else {
        panic!("expected the detail screen");
    };
    assert!(text.contains("[Examen] Parcial 1"));
    assert!(text.contains("1 de 2 subtareas completadas"));
    assert!(text.contains("Resolver guía"));
}

#[tokio::test]
async fn login_persists_session_in_sqlite() {
    let server = MockServer::start().await;
    let store = SqliteSessionStore::connect("sqlite::memory:").await.unwrap();
    let session = SessionHandle::new(Arc::new(store));
    let api = HttpApiClient::new(ApiConfig::with_base_url(&server.base_url), session.clone()).unwrap();
    let ctx = pages::AppContext::new(Arc::new(api), session);

    let outcome = pages::auth::login(
        &ctx,
        LoginForm {
            username: "ana".into(),
            password: "secreto123".into(),
        },
    )
    .await;
    assert!(outcome.redirects_to(Route::Today));
    assert_eq!(
        ctx.session.current().await.unwrap(),
        Some(Session {
            access_token: VALID_TOKEN.into(),
            refresh_token: "refresh-ana".into(),
            username: "ana".into(),
        })
    );

    let Outcome::Render(banner) = pages::today::show(&ctx).await else {
        panic!("expected the welcome banner");
    };
    assert!(banner.contains("¡Bienvenido, ana!"));

    assert!(pages::auth::logout(&ctx).await.redirects_to(Route::Login));
    assert!(!ctx.session.is_active().await.unwrap());
}

#[tokio::test]
async fn wrong_password_is_reported() {
    let server = MockServer::start().await;
    let ctx = server.context(None).await;

    let outcome = pages::auth::login(
        &ctx,
        LoginForm {
            username: "ana".into(),
            password: "incorrecta".into(),
        },
    )
    .await;
    assert_eq!(
        outcome,
        Outcome::Failed("✖ Usuario o contraseña incorrectos. Verifica tus datos e intenta de nuevo.".into())
    );
}

#[tokio::test]
async fn duplicate_username_shows_server_error() {
    let server = MockServer::start().await;
    let ctx = server.context(None).await;

    let outcome = pages::auth::register(
        &ctx,
        RegisterForm {
            username: "ana".into(),
            email: "ana@example.edu".into(),
            password: "otra-clave-1".into(),
            confirm_password: "otra-clave-1".into(),
        },
    )
    .await;
    assert_eq!(outcome, Outcome::Failed("✖ El usuario ya existe.".into()));
}
