//! Limits applied to the router's middleware layers.

use std::time::Duration;

/// Sequential portal calls one query may make.
const PORTAL_CALLS_PER_QUERY: u32 = 4;

/// Headroom over the portal budget for the store and the cipher.
const REQUEST_MARGIN: Duration = Duration::from_secs(30);

/// Largest accepted request body, which bounds CSV uploads.
pub const MAX_UPLOAD_BYTES: usize = 10 << 20;

/// Per-request timeout for all routes, given the timeout of one portal call.
///
/// A query that exhausts every portal timeout still finishes inside this
/// bound and reports the failure in its body.
pub fn request_timeout(portal_timeout: Duration) -> Duration {
    portal_timeout
        .saturating_mul(PORTAL_CALLS_PER_QUERY)
        .saturating_add(REQUEST_MARGIN)
}
