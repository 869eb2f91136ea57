//! CLI command implementations.

pub mod experiment;
pub mod models;
pub mod validate;
