//! Error types reported by link engines

use thiserror::Error;

/// Errors a link engine can return synchronously
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Engine or interface record could not be allocated
    #[error("unable to allocate resources")]
    Alloc,

    /// Invalid argument for the current engine state
    #[error("invalid parameter: {0}")]
    Param(String),

    /// Operation not allowed in the engine's current phase
    #[error("operation not allowed in phase {phase}")]
    WrongPhase { phase: &'static str },

    /// The underlying device rejected the operation
    #[error("device error: {0}")]
    Device(String),
}
