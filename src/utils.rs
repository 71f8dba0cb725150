//! Configuration and logging helpers.

pub mod config;
pub mod logging;
