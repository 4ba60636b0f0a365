//! CLI command implementations.

pub mod agent;
pub mod control;
pub mod serve;
