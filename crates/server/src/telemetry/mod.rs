//! Structured logging, plus optional span export over OTLP.
//!
//! # Telemetry invariants
//!
//! - **No PINs, ciphertexts or key material** may appear in any span
//!   attribute or log field. CIs may.
//! - Log level is configurable via `RUST_LOG`, else `LOG_LEVEL` (default:
//!   `info`).
//! - Spans leave the process only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

pub mod init;

pub use init::init_telemetry;
