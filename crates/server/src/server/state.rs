//! Shared application state injected into every Axum handler.

use crate::crypto::CredentialCipher;
use crate::import::Importer;
use crate::portal::PortalClient;
use crate::query::QueryService;
use crate::store::StudentStore;

/// Application state shared across all request handlers.
///
/// Every field is a cheap clone over a pool handle, an `Arc`-backed key or
/// plain portal settings, so Axum can clone the state per request.
#[derive(Clone, Debug)]
pub struct AppState {
    pub queries: QueryService,
    pub importer: Importer,
    /// Read directly by the health check.
    pub store: StudentStore,
}

impl AppState {
    /// Wire the services over one store and one cipher.
    pub fn new(store: StudentStore, cipher: CredentialCipher, portal: PortalClient) -> Self {
        Self {
            queries: QueryService::new(store.clone(), cipher.clone(), portal),
            importer: Importer::new(store.clone(), cipher),
            store,
        }
    }
}
