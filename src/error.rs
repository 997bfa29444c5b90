//! Error types for Gatehouse
//!
//! Provides a unified error type for all operations. "Entity may not exist"
//! outcomes are not errors; see [`crate::engine::MutationStatus`].

use thiserror::Error;

/// Result type alias using GatehouseError
pub type Result<T> = std::result::Result<T, GatehouseError>;

/// Unified error type for Gatehouse operations
#[derive(Debug, Error)]
pub enum GatehouseError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Rule Authoring Errors
    // -------------------------------------------------------------------------
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
