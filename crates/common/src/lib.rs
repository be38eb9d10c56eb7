//! Wire types and errors shared by the pending-courses service crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
