//! # Controller
//!
//! Core controller modules for the Schema Registry Controller.
//!
//! - `backoff`: Fibonacci backoff for unexpected reconcile errors
//! - `credentials`: Secret-backed credential resolution
//! - `reconciler`: Reconciliation logic for both resource kinds
//! - `routing`: Maps dependency changes to the resources that need reconciling
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod credentials;
pub mod reconciler;
pub mod routing;
pub mod server;
