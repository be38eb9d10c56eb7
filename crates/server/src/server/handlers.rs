//! Axum request handlers for all service endpoints.

use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use common::protocol::{ErrorResponse, HealthResponse, ImportFailure, QueryRequest};
use tracing::{debug, warn};

use super::state::AppState;

/// Name of the multipart field carrying the CSV upload.
const UPLOAD_FIELD: &str = "archivo";

static INDEX_HTML: &str = include_str!("../../static/index.html");

/// `GET /` — the single-page front end.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `POST /api/consultar` — list a registered student's pending courses.
///
/// Query failures are reported in the body's `error` field with `200 OK`;
/// only an unreadable request body is a client error.
pub async fn consultar(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => {
            debug!(error = %rejection, "rejected query body");
            return bad_request("JSON inválido");
        }
    };

    Json(state.queries.check_pending(&req.ci).await).into_response()
}

/// `POST /api/importar` — bulk-register students from an uploaded CSV file.
pub async fn importar(
    State(state): State<AppState>,
    form: Result<Multipart, MultipartRejection>,
) -> Response {
    let mut form = match form {
        Ok(f) => f,
        Err(rejection) => {
            debug!(error = %rejection, "rejected upload");
            return bad_request("error parseando formulario");
        }
    };

    let upload = loop {
        match form.next_field().await {
            Ok(Some(field)) if field.name() == Some(UPLOAD_FIELD) => match field.bytes().await {
                Ok(bytes) => break Some(bytes),
                Err(e) => {
                    debug!(error = %e, "failed to read upload");
                    return bad_request("error parseando formulario");
                }
            },
            Ok(Some(_)) => continue,
            Ok(None) => break None,
            Err(e) => {
                debug!(error = %e, "malformed multipart body");
                return bad_request("error parseando formulario");
            }
        }
    };
    let Some(data) = upload else {
        return bad_request("archivo CSV requerido");
    };

    match state.importer.import_csv(&data).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            warn!(error = %e, "csv upload could not be parsed");
            Json(ImportFailure {
                error: e.to_string(),
            })
            .into_response()
        }
    }
}

/// `GET /health` — liveness and readiness check.
///
/// Returns `200 OK` when the student table can be read and
/// `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.count().await {
        Ok(n) => {
            let body = HealthResponse {
                status: "ok".into(),
                students_registered: Some(n),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "health check could not read the store");
            let body = HealthResponse {
                status: "degraded".into(),
                students_registered: None,
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn bad_request(message: &str) -> Response {
    let err = ErrorResponse::new("bad_request", message);
    (StatusCode::BAD_REQUEST, Json(err)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::PortalClient;
    use crate::store::StudentStore;
    use crate::test_support::{store_with, test_cipher};
    use axum::routing::get;
    use axum::Router;
    use axum::{body::Body, http::Request};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn state() -> AppState {
        let cipher = test_cipher();
        let store = store_with(&cipher, "111", "222").await;
        // Nothing listens here; these tests never reach the portal.
        let portal = PortalClient::new("http://127.0.0.1:9", Duration::from_secs(1));
        AppState::new(store, cipher, portal)
    }

    #[tokio::test]
    async fn health_reports_student_count() {
        let app = Router::new()
            .route("/health", get(health))
            .with_state(state().await);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["students_registered"], 1);
    }

    #[tokio::test]
    async fn health_returns_503_when_store_unreadable() {
        let cipher = test_cipher();
        let store = StudentStore::in_memory().await.unwrap();
        let portal = PortalClient::new("http://127.0.0.1:9", Duration::from_secs(1));
        let state = AppState::new(store.clone(), cipher, portal);
        store.close().await;

        let app = Router::new().route("/health", get(health)).with_state(state);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn index_page_has_both_forms() {
        assert!(INDEX_HTML.contains("/api/consultar"));
        assert!(INDEX_HTML.contains("/api/importar"));
        assert!(INDEX_HTML.contains(&format!("name=\"{UPLOAD_FIELD}\"")));
    }
}
