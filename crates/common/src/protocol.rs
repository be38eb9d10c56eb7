//! Request and response types exchanged with the browser front end and the
//! student portal.
//!
//! JSON field names follow the front end (`usuario`, `pendientes`, ...) and,
//! for [`CourseEntry`], the portal's own PascalCase names so that entries can
//! be passed through to the page unchanged.

use serde::{Deserialize, Deserializer, Serialize};

/// Grade literal the portal uses for a course that is still in progress.
pub const PENDING_MARKER: &str = "Pendiente";

// ---------------------------------------------------------------------------
// Query endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /api/consultar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Student identifier (CI) as typed by the user. Missing or `null`
    /// reads as empty.
    #[serde(default, deserialize_with = "null_default")]
    pub ci: String,
}

/// Response body for `POST /api/consultar`.
///
/// Either the summary fields or `error` carry meaning, never both. A failed
/// query is still delivered with `200 OK`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Student display name as reported by the portal.
    pub usuario: String,
    /// Campus name.
    pub sede: String,
    /// Program (career) name.
    pub carrera: String,
    /// Number of rows in the course history, pending or not.
    pub total: usize,
    /// Course-history rows still pending, in portal order.
    pub pendientes: Vec<CourseEntry>,
    /// User-facing failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// A result that carries only an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if this result reports a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One row of the portal's course history (`items-data`).
///
/// Missing or `null` fields decode to empty values; the portal is not
/// consistent about which ones it fills in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseEntry {
    #[serde(rename = "IdInscripcionCarrera", deserialize_with = "null_default")]
    pub enrollment_id: i64,
    #[serde(rename = "NotaLiteral", deserialize_with = "null_default")]
    pub grade_literal: String,
    #[serde(rename = "Materia", deserialize_with = "null_default")]
    pub course: String,
    #[serde(rename = "MateriaID", deserialize_with = "null_default")]
    pub course_id: i64,
    #[serde(rename = "RegistroMateriaID", deserialize_with = "null_default")]
    pub course_registration_id: i64,
    #[serde(rename = "Sigla", deserialize_with = "null_default")]
    pub code: String,
    #[serde(rename = "NroPeriodo", deserialize_with = "null_default")]
    pub period_number: i64,
    #[serde(rename = "IdGrupo", deserialize_with = "null_default")]
    pub group_id: i64,
    #[serde(rename = "Grupo", deserialize_with = "null_default")]
    pub group: String,
    #[serde(rename = "SistemaEstudio", deserialize_with = "null_default")]
    pub study_system: String,
    #[serde(rename = "Turno", deserialize_with = "null_default")]
    pub shift: String,
    #[serde(rename = "Descripcion", deserialize_with = "null_default")]
    pub description: String,
    #[serde(rename = "IdGestion", deserialize_with = "null_default")]
    pub term_id: i64,
    #[serde(rename = "NroOrden", deserialize_with = "null_default")]
    pub order_number: i64,
    #[serde(rename = "NroOfertaPeriodo", deserialize_with = "null_default")]
    pub offer_period_number: i64,
    #[serde(rename = "IdDocente", deserialize_with = "null_default")]
    pub instructor_id: i64,
    /// `"<room>: <times>"` when the portal knows the room.
    #[serde(rename = "Horario", deserialize_with = "null_default")]
    pub schedule: String,
    #[serde(rename = "Semestre", deserialize_with = "null_default")]
    pub semester: String,
    #[serde(rename = "ApellidoPaterno", deserialize_with = "null_default")]
    pub instructor_paternal_surname: String,
    #[serde(rename = "ApellidoMaterno", deserialize_with = "null_default")]
    pub instructor_maternal_surname: String,
    #[serde(rename = "NombreDocente", deserialize_with = "null_default")]
    pub instructor_name: String,
    #[serde(rename = "DocumentoIdentidad", deserialize_with = "null_default")]
    pub instructor_document: String,
    #[serde(rename = "NumeroPeriodo", deserialize_with = "null_default")]
    pub term_number: i64,
}

impl CourseEntry {
    /// Returns `true` if the grade literal is exactly [`PENDING_MARKER`].
    pub fn is_pending(&self) -> bool {
        self.grade_literal == PENDING_MARKER
    }
}

/// Keep only the pending entries, preserving their relative order.
pub fn filter_pending(entries: Vec<CourseEntry>) -> Vec<CourseEntry> {
    entries.into_iter().filter(CourseEntry::is_pending).collect()
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Import endpoint
// ---------------------------------------------------------------------------

/// Response body for `POST /api/importar`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Rows stored successfully.
    pub importados: usize,
    /// Rows rejected.
    pub errores: usize,
    /// One `"Fila N: reason"` line per rejected row.
    #[serde(rename = "detalleErrors")]
    pub detalle_errors: Vec<String>,
    /// Students registered after the import.
    #[serde(rename = "totalEnBD")]
    pub total_en_bd: i64,
}

/// Response body for an import whose CSV could not be read at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFailure {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Error body returned with a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    /// Rows in the student table, when it could be read.
    pub students_registered: Option<i64>,
}
