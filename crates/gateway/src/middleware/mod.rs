//! HTTP middleware

pub mod metrics;
pub mod rate_limit;

pub use metrics::track_requests;
pub use rate_limit::{rate_limit_middleware, RateLimit};
