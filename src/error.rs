//! Error types for policy evaluation
//!
//! These only surface from parsing and configuration entry points. The
//! standardness decision path folds every anomaly into a verdict instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Script parse error: {0}")]
    ScriptParse(String),

    #[error("Invalid policy configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
