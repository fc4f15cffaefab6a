// SPDX-FileCopyrightText: 2026 Chatline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chatline pipeline.

use thiserror::Error;

/// The primary error type used across Chatline crates and collaborator traits.
#[derive(Debug, Error)]
pub enum ChatlineError {
    /// Configuration errors (invalid TOML, bad tab definitions, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The message store failed (open, migration, query or encoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A stored message could not be rebuilt from its persisted columns.
    #[error("failed to reconstruct message {id}: {source}")]
    Reconstruct {
        id: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Relay session errors (bind failure, write failure, closed session).
    #[error("relay error: {message}")]
    Relay {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A view that does not exist was addressed.
    #[error("view not found: {0}")]
    ViewNotFound(u32),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A bug or an unexpected runtime failure (thread spawn, task join).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatlineError {
    /// Wrap any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
