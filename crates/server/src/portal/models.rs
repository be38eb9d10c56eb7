//! Portal response shapes.

use serde::Deserialize;
use serde_json::Value;

/// Envelope returned by the login service.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginEnvelope {
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    /// Session-data objects. Kept raw so the first one can be replayed to the
    /// session endpoint byte-for-byte in content.
    #[serde(default)]
    pub data: Option<Vec<Value>>,
}

/// The fields of a session-data object this service reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    #[serde(rename = "ClienteNombre")]
    pub display_name: Option<String>,
    #[serde(rename = "SedeNombre")]
    pub campus: Option<String>,
}

/// One element of the `carreras-me` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramListing {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "SistemaEnsenanza")]
    pub teaching_system: i64,
    #[serde(rename = "PlanEstudio", default)]
    pub study_plan: Option<StudyPlan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudyPlan {
    #[serde(rename = "Carrera")]
    pub career: Option<Career>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Career {
    #[serde(rename = "Nombre")]
    pub name: Option<String>,
}

impl ProgramListing {
    /// Career name shown to the student; the plan code is not appended.
    pub fn program_name(&self) -> String {
        self.study_plan
            .as_ref()
            .and_then(|p| p.career.as_ref())
            .and_then(|c| c.name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn program_name_reads_nested_career() {
        let p: ProgramListing = serde_json::from_value(json!({
            "ID": 5,
            "SistemaEnsenanza": 1,
            "PlanEstudio": {
                "Nombre": "Plan 2019",
                "Sigla": "P19",
                "Carrera": {"Nombre": "Ingeniería de Sistemas"}
            }
        }))
        .unwrap();
        assert_eq!(p.program_name(), "Ingeniería de Sistemas");
    }

    #[test]
    fn program_name_empty_without_plan() {
        let p: ProgramListing =
            serde_json::from_value(json!({"ID": 5, "SistemaEnsenanza": 1, "PlanEstudio": null}))
                .unwrap();
        assert_eq!(p.program_name(), "");
    }

    #[test]
    fn login_envelope_tolerates_null_data() {
        let e: LoginEnvelope =
            serde_json::from_value(json!({"status": 1, "message": null, "data": null})).unwrap();
        assert!(e.message.is_none());
        assert!(e.data.is_none());
    }

    #[test]
    fn profile_ignores_unknown_fields() {
        let p: StudentProfile = serde_json::from_value(json!({
            "ClienteNombre": "Juan Perez",
            "SedeNombre": "Santa Cruz",
            "ClienteToken": "tok",
            "IdRN": 3
        }))
        .unwrap();
        assert_eq!(p.display_name.as_deref(), Some("Juan Perez"));
        assert_eq!(p.campus.as_deref(), Some("Santa Cruz"));
    }
}
