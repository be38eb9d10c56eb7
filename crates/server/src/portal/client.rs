//! Cookie-bearing HTTP session against the student portal.

use std::time::Duration;

use common::protocol::CourseEntry;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use super::extract::{extract_embedded, ExtractError, Marker};
use super::models::{LoginEnvelope, ProgramListing, StudentProfile};

/// Production portal.
pub const DEFAULT_BASE_URL: &str = "https://portal.upds.edu.bo";

const LOGIN_PATH: &str = "/gapi/request/service/?path=updsnet/access/cliente";
const SESSION_PATH: &str = "/updsnet/5.8/account/tlogin";
const ENROLLMENT_PATH: &str = "/updsnet/5.8/home/registromateria";
const HISTORY_PATH: &str = "/updsnet/5.8/Home/ShowHistoricoRegistro";

const DEFAULT_AUTH_MESSAGE: &str = "credenciales inválidas";

/// Errors from the portal call chain.
///
/// `Display` is the message shown to the student.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The HTTP client could not be built (TLS backend, etc.).
    #[error("error creando cliente HTTP: {0}")]
    Client(#[source] reqwest::Error),

    /// A transport failure on the login, enrollment or history call.
    #[error("{context}: {source}")]
    Request {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The portal rejected the credentials; carries its message.
    #[error("{0}")]
    Authentication(String),

    /// The session-establishment call failed.
    #[error("error creando sesión: {0}")]
    Session(#[source] reqwest::Error),

    /// The expected marker is not in the page.
    #[error("{0}")]
    Extraction(&'static str),

    /// The enrollment page lists no programs.
    #[error("no se encontraron carreras")]
    NoData,

    /// A response body is not the expected JSON.
    #[error("{context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Factory for per-query [`PortalSession`]s.
///
/// Holds configuration only; cheap to clone and share between requests.
#[derive(Clone, Debug)]
pub struct PortalClient {
    base_url: String,
    timeout: Duration,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, timeout }
    }

    /// Start a new session with an empty cookie jar.
    ///
    /// The session must not outlive one student's query.
    pub fn open_session(&self) -> Result<PortalSession, PortalError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=utf-8"),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/html, */*"),
        );

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(PortalError::Client)?;

        Ok(PortalSession {
            http,
            base_url: self.base_url.clone(),
        })
    }
}

/// One student's authenticated conversation with the portal.
///
/// Cookies set by the login response are replayed on every later call made
/// through the same session.
pub struct PortalSession {
    http: reqwest::Client,
    base_url: String,
}

impl PortalSession {
    /// Log in and pin the server-side session to this session's cookie jar.
    ///
    /// # Errors
    ///
    /// [`PortalError::Authentication`] if the portal reports a non-zero status
    /// or no session data; [`PortalError::Session`] if the second call fails.
    pub async fn authenticate(&self, ci: &str, pin: &str) -> Result<StudentProfile, PortalError> {
        const CONTEXT: &str = "error en autenticación";

        let body = self
            .http
            .post(self.url(LOGIN_PATH))
            .body(json!({ "UserName": ci, "Password": pin }).to_string())
            .send()
            .await
            .map_err(|source| PortalError::Request { context: CONTEXT, source })?
            .text()
            .await
            .map_err(|source| PortalError::Request { context: CONTEXT, source })?;

        let envelope: LoginEnvelope = serde_json::from_str(&body).map_err(|source| {
            PortalError::Decode {
                context: "error parseando respuesta login",
                source,
            }
        })?;

        let session_data = match envelope.data.unwrap_or_default().into_iter().next() {
            Some(first) if envelope.status == 0 => first,
            _ => {
                let message = envelope
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_AUTH_MESSAGE.to_owned());
                debug!(status = envelope.status, "portal rejected login");
                return Err(PortalError::Authentication(message));
            }
        };

        let profile: StudentProfile =
            serde_json::from_value(session_data.clone()).map_err(|source| PortalError::Decode {
                context: "error parseando respuesta login",
                source,
            })?;

        self.http
            .post(self.url(SESSION_PATH))
            .body(session_data.to_string())
            .send()
            .await
            .map_err(PortalError::Session)?
            .bytes()
            .await
            .map_err(PortalError::Session)?;

        debug!("portal session established");
        Ok(profile)
    }

    /// Read the student's first program from the enrollment page.
    ///
    /// # Errors
    ///
    /// [`PortalError::Extraction`] if the marker is missing,
    /// [`PortalError::NoData`] if the program list is empty.
    pub async fn fetch_enrollment(&self) -> Result<ProgramListing, PortalError> {
        let html = self
            .get_text(ENROLLMENT_PATH.to_owned(), "error obteniendo registro materia")
            .await?;

        let programs: Vec<ProgramListing> =
            extract_embedded(&html, Marker::Programs).map_err(|e| match e {
                ExtractError::MarkerNotFound(_) => {
                    PortalError::Extraction("no se encontró información de carreras")
                }
                ExtractError::Json { source, .. } => PortalError::Decode {
                    context: "error parseando carreras",
                    source,
                },
            })?;

        programs.into_iter().next().ok_or(PortalError::NoData)
    }

    /// Fetch the full course history for an enrollment.
    pub async fn fetch_course_history(
        &self,
        enrollment_id: i64,
        enrollment_type: i64,
    ) -> Result<Vec<CourseEntry>, PortalError> {
        let path = format!("{HISTORY_PATH}?inscripcion={enrollment_id}&tipo={enrollment_type}");
        let html = self.get_text(path, "error obteniendo histórico").await?;

        extract_embedded(&html, Marker::CourseHistory).map_err(|e| match e {
            ExtractError::MarkerNotFound(_) => {
                PortalError::Extraction("no se encontró datos del histórico")
            }
            ExtractError::Json { source, .. } => PortalError::Decode {
                context: "error parseando materias",
                source,
            },
        })
    }

    async fn get_text(&self, path: String, context: &'static str) -> Result<String, PortalError> {
        self.http
            .get(self.url(&path))
            .send()
            .await
            .map_err(|source| PortalError::Request { context, source })?
            .text()
            .await
            .map_err(|source| PortalError::Request { context, source })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
