//! Bulk CSV import of CI/PIN pairs.

use common::protocol::ImportSummary;
use common::ServiceError;
use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{info, warn};

use crate::crypto::CredentialCipher;
use crate::store::StudentStore;

/// The upload could not be read as CSV at all. Row-level problems are
/// reported in the [`ImportSummary`] instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Error leyendo CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Clone, Debug)]
pub struct Importer {
    store: StudentStore,
    cipher: CredentialCipher,
}

impl Importer {
    pub fn new(store: StudentStore, cipher: CredentialCipher) -> Self {
        Self { store, cipher }
    }

    /// Import `ci,pin` rows from `data`.
    ///
    /// The whole upload is parsed before anything is written, so a malformed
    /// file stores nothing. After that, rows are independent: a bad row is
    /// recorded in the summary and the next one is processed.
    pub async fn import_csv(&self, data: &[u8]) -> Result<ImportSummary, ImportError> {
        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data)
            .into_records()
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = ImportSummary::default();
        for (i, record) in records.iter().enumerate() {
            if i == 0 && is_header(record) {
                continue;
            }
            match self.import_row(i + 1, record).await {
                Ok(()) => summary.importados += 1,
                Err(e) => {
                    summary.errores += 1;
                    summary.detalle_errors.push(e.to_string());
                }
            }
        }

        summary.total_en_bd = self.store.count().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to count students after import");
            0
        });
        info!(
            imported = summary.importados,
            rejected = summary.errores,
            total = summary.total_en_bd,
            "csv import finished"
        );
        Ok(summary)
    }

    async fn import_row(&self, row: usize, record: &StringRecord) -> Result<(), ServiceError> {
        let reject = |reason: &str| ServiceError::ImportRow {
            row,
            reason: reason.to_owned(),
        };

        let (Some(ci), Some(pin)) = (record.get(0), record.get(1)) else {
            return Err(reject("faltan columnas"));
        };
        let (ci, pin) = (ci.trim(), pin.trim());
        if ci.is_empty() || pin.is_empty() {
            return Err(reject("CI o PIN vacío"));
        }

        let encrypted = self.cipher.encrypt(pin).map_err(|e| {
            warn!(row, error = %e, "failed to encrypt PIN");
            reject("error encriptando")
        })?;
        self.store.upsert(ci, &encrypted).await.map_err(|e| {
            warn!(row, error = %e, "failed to store student");
            reject("error guardando en BD")
        })
    }
}

fn is_header(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|first| {
        let first = first.trim();
        first.eq_ignore_ascii_case("ci") || first.eq_ignore_ascii_case("carnet")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_cipher;

    async fn importer() -> (Importer, StudentStore, CredentialCipher) {
        let cipher = test_cipher();
        let store = StudentStore::in_memory().await.unwrap();
        (Importer::new(store.clone(), cipher.clone()), store, cipher)
    }

    async fn stored_pin(store: &StudentStore, cipher: &CredentialCipher, ci: &str) -> String {
        cipher.decrypt(&store.encrypted_pin(ci).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn header_skipped_and_short_row_reported() {
        let (imp, store, cipher) = importer().await;
        let summary = imp.import_csv(b"ci,pin\n111,222\n333\n").await.unwrap();

        assert_eq!(summary.importados, 1);
        assert_eq!(summary.errores, 1);
        assert_eq!(summary.detalle_errors, ["Fila 3: faltan columnas"]);
        assert_eq!(summary.total_en_bd, 1);
        assert_eq!(stored_pin(&store, &cipher, "111").await, "222");
        assert!(store.encrypted_pin("333").await.is_err());
    }

    #[tokio::test]
    async fn header_match_is_case_insensitive() {
        let (imp, store, _) = importer().await;
        let summary = imp.import_csv(b"CARNET,PIN\n111,222\n").await.unwrap();

        assert_eq!(summary.importados, 1);
        assert_eq!(summary.errores, 0);
        assert!(store.encrypted_pin("CARNET").await.is_err());
    }

    #[tokio::test]
    async fn first_row_without_header_is_data() {
        let (imp, store, cipher) = importer().await;
        let summary = imp.import_csv(b"111,222\n444,555\n").await.unwrap();

        assert_eq!(summary.importados, 2);
        assert_eq!(summary.total_en_bd, 2);
        assert_eq!(stored_pin(&store, &cipher, "444").await, "555");
    }

    #[tokio::test]
    async fn header_text_after_first_row_is_data() {
        let (imp, store, _) = importer().await;
        let summary = imp.import_csv(b"111,222\nci,pin\n").await.unwrap();

        assert_eq!(summary.importados, 2);
        assert!(store.encrypted_pin("ci").await.is_ok());
    }

    #[tokio::test]
    async fn blank_cells_are_rejected() {
        let (imp, _, _) = importer().await;
        let summary = imp.import_csv(b"ci,pin\n  ,222\n111,   \n").await.unwrap();

        assert_eq!(summary.importados, 0);
        assert_eq!(
            summary.detalle_errors,
            ["Fila 2: CI o PIN vacío", "Fila 3: CI o PIN vacío"]
        );
        assert_eq!(summary.total_en_bd, 0);
    }

    #[tokio::test]
    async fn cells_are_trimmed() {
        let (imp, store, cipher) = importer().await;
        imp.import_csv(b" 111 , 222 \n").await.unwrap();
        assert_eq!(stored_pin(&store, &cipher, "111").await, "222");
    }

    #[tokio::test]
    async fn reimport_replaces_pin() {
        let (imp, store, cipher) = importer().await;
        imp.import_csv(b"111,222\n").await.unwrap();
        let summary = imp.import_csv(b"111,999\n").await.unwrap();

        assert_eq!(summary.total_en_bd, 1);
        assert_eq!(stored_pin(&store, &cipher, "111").await, "999");
    }

    #[tokio::test]
    async fn empty_upload_imports_nothing() {
        let (imp, _, _) = importer().await;
        let summary = imp.import_csv(b"").await.unwrap();
        assert_eq!(summary, ImportSummary::default());
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_reader_error() {
        let (imp, store, _) = importer().await;
        let err = imp.import_csv(b"111,222\n\xff\xfe,1\n").await.unwrap_err();

        assert!(err.to_string().starts_with("Error leyendo CSV: "));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
