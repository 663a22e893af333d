//! # Configuration
//!
//! Process-wide settings, read once at startup from the environment.

mod controller;

pub use controller::{ControllerConfig, LogFormat};
