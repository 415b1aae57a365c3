//! HTTP-layer limits.

/// Largest accepted request body. Payloads are JSON only.
pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Default for `HTTP_CONCURRENCY_LIMIT`.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10_000;
