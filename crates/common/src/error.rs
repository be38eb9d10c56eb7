//! User-facing error taxonomy.

use thiserror::Error;

/// Top-level service error.
///
/// The `Display` text of every variant except [`ServiceError::Configuration`]
/// and [`ServiceError::Internal`] is shown to the student verbatim, so it is
/// written in the front end's language.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad startup configuration. Fatal, never seen by a client.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The CI has no row in the student table.
    #[error("CI no registrado. Importa el CSV primero.")]
    NotRegistered,

    /// The stored PIN could not be decrypted. Deliberately carries no detail.
    #[error("Error desencriptando PIN")]
    Decryption,

    /// The portal call chain failed; the message is the portal's (or ours).
    #[error("{0}")]
    Portal(String),

    /// One CSV row was rejected. `row` is 1-based.
    #[error("Fila {row}: {reason}")]
    ImportRow { row: usize, reason: String },

    /// Anything else, e.g. the database being unreadable.
    #[error("error interno: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_registered_is_guidance() {
        assert_eq!(
            ServiceError::NotRegistered.to_string(),
            "CI no registrado. Importa el CSV primero."
        );
    }

    #[test]
    fn portal_message_is_verbatim() {
        let e = ServiceError::Portal("Usuario bloqueado".into());
        assert_eq!(e.to_string(), "Usuario bloqueado");
    }

    #[test]
    fn import_row_display() {
        let e = ServiceError::ImportRow {
            row: 4,
            reason: "CI o PIN vacío".into(),
        };
        assert_eq!(e.to_string(), "Fila 4: CI o PIN vacío");
    }

    #[test]
    fn decryption_has_no_detail() {
        assert_eq!(ServiceError::Decryption.to_string(), "Error desencriptando PIN");
    }
}
