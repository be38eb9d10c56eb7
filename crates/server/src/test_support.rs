//! Fixtures shared by unit tests: a mock portal and a seeded store.

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::crypto::{CredentialCipher, SecretKey, KEY_LEN};
use crate::store::StudentStore;

pub fn test_cipher() -> CredentialCipher {
    CredentialCipher::new(SecretKey::from_bytes(&[0x42u8; KEY_LEN]).unwrap())
}

/// In-memory store with `ci` registered under `pin`.
pub async fn store_with(cipher: &CredentialCipher, ci: &str, pin: &str) -> StudentStore {
    let store = StudentStore::in_memory().await.unwrap();
    store.upsert(ci, &cipher.encrypt(pin).unwrap()).await.unwrap();
    store
}

/// A session-data object as the login service returns it.
pub fn session_entry() -> Value {
    json!({
        "Type": 1,
        "TypeDescripcion": "Estudiante",
        "SedeNombreCorto": "SCZ",
        "SedeNombre": "Santa Cruz",
        "ClienteToken": "tok-123",
        "ClienteNombre": "Juan Perez",
        "ClienteDNI": "111",
        "ClienteGeneroId": 1,
        "IdRN": 9
    })
}

/// A page embedding `value` under the hidden input `id`, escaped the way the
/// portal escapes it.
pub fn embedded(id: &str, value: &Value) -> String {
    let escaped = value
        .to_string()
        .replace('&', "&amp;")
        .replace('"', "&quot;");
    format!(
        "<html><body>\n<input type=\"hidden\" id=\"{id}\" value=\"{escaped}\" />\n</body></html>"
    )
}

/// Mount successful login and session-establishment responses.
pub async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/gapi/request/service/"))
        .and(query_param("path", "updsnet/access/cliente"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": 0, "message": null, "data": [session_entry()]})),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/updsnet/5.8/account/tlogin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(server)
        .await;
}

/// Mount an enrollment page listing one program.
pub async fn mount_enrollment(server: &MockServer, id: i64, kind: i64, career: &str) {
    let programs = json!([{
        "ID": id,
        "SistemaEnsenanza": kind,
        "PlanEstudio": {"Nombre": "Plan 2020", "Sigla": "P20", "Carrera": {"Nombre": career}}
    }]);
    Mock::given(method("GET"))
        .and(path("/updsnet/5.8/home/registromateria"))
        .respond_with(ResponseTemplate::new(200).set_body_string(embedded("carreras-me", &programs)))
        .mount(server)
        .await;
}

/// Mount a course-history page for the given enrollment.
pub async fn mount_history(server: &MockServer, id: i64, kind: i64, rows: &Value) {
    Mock::given(method("GET"))
        .and(path("/updsnet/5.8/Home/ShowHistoricoRegistro"))
        .and(query_param("inscripcion", id.to_string()))
        .and(query_param("tipo", kind.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(embedded("items-data", rows)))
        .mount(server)
        .await;
}

/// A course-history row.
pub fn course(name: &str, grade: &str) -> Value {
    json!({
        "IdInscripcionCarrera": 5,
        "Materia": name,
        "NotaLiteral": grade,
        "Sigla": "SIS-100",
        "Turno": "Noche",
        "Semestre": "2do Semestre",
        "Descripcion": "Presencial",
        "Horario": "A-12: 19:00-21:15",
        "ApellidoPaterno": "Rojas",
        "ApellidoMaterno": "Vaca",
        "NombreDocente": "Ana",
        "Grupo": null
    })
}
