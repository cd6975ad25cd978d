// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the hook engine
//!
//! Everything that can go wrong inside the engine is mapped to these unified
//! variants. None of them is ever allowed to escape into the instrumented
//! application call path; callers downgrade them to diagnostics and partial
//! records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all engine operations
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum EngineError {
    #[error("no insertion candidate found on {type_name}: tried {tried:?}")]
    InsertionNotFound { type_name: String, tried: Vec<String> },

    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("accessor {accessor} unavailable on {type_name}")]
    AccessorMissing { type_name: String, accessor: String },

    #[error("dispatch glue failed: {message}")]
    DispatchFailed { message: String },

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl EngineError {
    pub fn insertion_not_found(type_name: impl Into<String>, tried: Vec<String>) -> Self {
        Self::InsertionNotFound {
            type_name: type_name.into(),
            tried,
        }
    }

    pub fn extraction_failed(msg: impl Into<String>) -> Self {
        Self::ExtractionFailed { message: msg.into() }
    }

    pub fn accessor_missing(type_name: impl Into<String>, accessor: impl Into<String>) -> Self {
        Self::AccessorMissing {
            type_name: type_name.into(),
            accessor: accessor.into(),
        }
    }

    pub fn dispatch_failed(msg: impl Into<String>) -> Self {
        Self::DispatchFailed { message: msg.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config { message: msg.into() }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
