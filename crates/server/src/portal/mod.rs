//! Client for the UPDS student portal.
//!
//! # Call chain
//!
//! 1. `POST` credentials to the login service; the reply sets session cookies
//!    and returns session-data objects.
//! 2. `POST` the first session-data object back to `account/tlogin` so the
//!    portal binds its server-side session to those cookies.
//! 3. `GET home/registromateria` and read the `carreras-me` marker (skipped when
//!    the enrollment is cached).
//! 4. `GET Home/ShowHistoricoRegistro` and read the `items-data` marker.
//!
//! No step is retried. All steps run on one [`PortalSession`], created per
//! query and dropped with it.

pub mod client;
pub mod extract;
pub mod models;

pub use client::{PortalClient, PortalError, PortalSession, DEFAULT_BASE_URL};
