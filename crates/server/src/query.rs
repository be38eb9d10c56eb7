//! The "check pending courses" operation.
//!
//! Composes the store, the cipher and the portal client:
//!
//! ```text
//! CI ─► encrypted PIN ─► PIN ─► login ─► enrollment (cache or portal) ─► history ─► filter
//! ```
//!
//! Every failure becomes a [`QueryResult`] carrying only an error message;
//! callers never see a partially filled result.

use common::protocol::{filter_pending, QueryResult};
use common::ServiceError;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::crypto::CredentialCipher;
use crate::portal::{PortalClient, PortalError, PortalSession};
use crate::store::{CachedEnrollment, StoreError, StudentStore};

/// Runs pending-course queries. Cheap to clone.
#[derive(Clone, Debug)]
pub struct QueryService {
    store: StudentStore,
    cipher: CredentialCipher,
    portal: PortalClient,
}

impl QueryService {
    pub fn new(store: StudentStore, cipher: CredentialCipher, portal: PortalClient) -> Self {
        Self {
            store,
            cipher,
            portal,
        }
    }

    /// Look up the stored PIN for `ci` and run the query.
    pub async fn check_pending(&self, ci: &str) -> QueryResult {
        let ci = ci.trim();
        if ci.is_empty() {
            return QueryResult::failure("CI es requerido");
        }

        let span = info_span!("query", session = %Uuid::new_v4(), ci = %ci);
        async {
            match self.stored_pin(ci).await {
                Ok(pin) => self.run(ci, &pin).await,
                Err(e) => QueryResult::failure(e.to_string()),
            }
        }
        .instrument(span)
        .await
    }

    /// Query the portal as `ci` with an already decrypted `pin`.
    pub async fn run(&self, ci: &str, pin: &str) -> QueryResult {
        match self.try_run(ci, pin).await {
            Ok(result) => {
                info!(
                    total = result.total,
                    pending = result.pendientes.len(),
                    "query completed"
                );
                result
            }
            Err(e) => {
                info!(error = %e, "query failed");
                QueryResult::failure(e.to_string())
            }
        }
    }

    async fn stored_pin(&self, ci: &str) -> Result<String, ServiceError> {
        let encrypted = self.store.encrypted_pin(ci).await.map_err(|e| match e {
            StoreError::NotRegistered(_) => ServiceError::NotRegistered,
            StoreError::Database(err) => {
                warn!(error = %err, "failed to read stored PIN");
                ServiceError::Internal("base de datos no disponible".into())
            }
        })?;

        self.cipher.decrypt(&encrypted).map_err(|e| {
            warn!(error = %e, "stored PIN could not be decrypted");
            ServiceError::Decryption
        })
    }

    async fn try_run(&self, ci: &str, pin: &str) -> Result<QueryResult, ServiceError> {
        // Dropped at the end of this call, cookies and all.
        let session = self.portal.open_session().map_err(portal_error)?;

        let profile = session.authenticate(ci, pin).await.map_err(portal_error)?;
        let enrollment = self.enrollment(&session, ci).await?;
        let entries = session
            .fetch_course_history(enrollment.enrollment_id, enrollment.enrollment_type)
            .await
            .map_err(portal_error)?;

        let total = entries.len();
        Ok(QueryResult {
            usuario: profile.display_name.unwrap_or_default(),
            sede: profile.campus.unwrap_or_default(),
            carrera: enrollment.program,
            total,
            pendientes: filter_pending(entries),
            error: None,
        })
    }

    /// Cached enrollment if present, else fetch it and cache it before
    /// returning.
    async fn enrollment(
        &self,
        session: &PortalSession,
        ci: &str,
    ) -> Result<CachedEnrollment, ServiceError> {
        match self.store.cached_enrollment(ci).await {
            Ok(Some(cached)) => {
                debug!(enrollment_id = cached.enrollment_id, "using cached enrollment");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read cached enrollment"),
        }

        let listing = session.fetch_enrollment().await.map_err(portal_error)?;
        let enrollment = CachedEnrollment {
            enrollment_id: listing.id,
            enrollment_type: listing.teaching_system,
            program: listing.program_name(),
        };

        // Best effort: the query succeeds even if this write does not.
        if let Err(e) = self.store.set_cached_enrollment(ci, &enrollment).await {
            warn!(error = %e, "failed to cache enrollment");
        }
        Ok(enrollment)
    }
}

fn portal_error(e: PortalError) -> ServiceError {
    ServiceError::Portal(e.to_string())
}
