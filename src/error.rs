// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for engine construction and boolean evaluation

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the factory, the engines and their kernels
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The requested backend is not compiled in or registered
    #[error("Boolean engine \"{0}\" is not supported.")]
    NotImplemented(String),

    /// A kernel could not produce a result for the given inputs
    #[error("geometry computation failed: {0}")]
    GeometryComputation(String),

    /// Output was requested before a successful run
    #[error("no boolean result available; run the engine first")]
    NoResult,

    /// Engine configuration could not be loaded or is invalid
    #[error("invalid engine configuration: {0}")]
    Config(String),
}

impl EngineError {
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::GeometryComputation(message.into())
    }

    /// Name carried by a `NotImplemented` error
    pub fn requested_engine(&self) -> Option<&str> {
        match self {
            Self::NotImplemented(name) => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_message() {
        let err = EngineError::NotImplemented("cork".into());
        assert_eq!(err.to_string(), "Boolean engine \"cork\" is not supported.");
        assert_eq!(err.requested_engine(), Some("cork"));
    }

    #[test]
    fn test_geometry_error() {
        let err = EngineError::geometry("face 3 references vertex 9");
        assert!(err.to_string().contains("face 3"));
        assert_eq!(err.requested_engine(), None);
    }
}
