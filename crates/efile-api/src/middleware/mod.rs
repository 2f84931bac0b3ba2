//! # Middleware Stack
//!
//! - [`metrics`]: Prometheus request metrics and case counters.
//!
//! Request tracing uses `tower_http::trace::TraceLayer` directly in
//! [`crate::app`].

pub mod metrics;
