//! # Runtime
//!
//! Process-level wiring: startup, the watch loop, and the error policy.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
