//! Error types for the servicelog application.
//!
//! This module defines the error taxonomy shared by the record store, the
//! query projections and the CLI.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the servicelog application.
#[derive(Error, Debug)]
pub enum ServiceLogError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored blob under `key` could not be decoded.
    #[error("Stored data under '{key}' is corrupt: {message}")]
    StorageRead { key: String, message: String },

    /// Record was not found when performing an operation.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A service date did not follow the `MM - DD - YYYY` layout.
    #[error("Invalid service date '{value}': {message}")]
    InvalidDate { value: String, message: String },

    /// A cost could not be read as a decimal amount.
    #[error("Invalid cost '{value}'")]
    InvalidCost { value: String },

    /// The requested state change is not allowed for the record.
    #[error("Cannot {action} record {id}: {message}")]
    InvalidTransition {
        action: &'static str,
        id: String,
        message: String,
    },

    /// A user supplied value could not be understood.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// The reminder collaborator rejected an operation.
    #[error("Reminder error: {message}")]
    ReminderError { message: String },

    /// A blocking storage task was cancelled or panicked.
    #[error("Background task failed: {message}")]
    TaskFailed { message: String },
}
