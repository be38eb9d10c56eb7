//! SQLite persistence for registered students.
//!
//! # Schema
//!
//! One table, `estudiantes`, keyed by CI. Besides the encrypted PIN it caches
//! the student's enrollment metadata so a query can skip the portal's
//! enrollment page.
//!
//! # Upgrades
//!
//! Databases created before the cache columns existed hold only `ci` and
//! `pin_encrypted`. [`StudentStore::init`] adds the missing columns in place;
//! it is safe to run on every startup.
//!
//! # Concurrency
//!
//! The pool runs SQLite in WAL mode with a busy timeout, so concurrent
//! requests for different students never fail on lock contention. Writes to
//! the same CI are last-write-wins.

pub mod students;

pub use students::{CachedEnrollment, StoreError, StudentStore};
