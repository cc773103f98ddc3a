//! CLI library components for minrand.

pub mod commands;
pub mod definition;
pub mod logging;
