//! Error types for simulation operations.

use thiserror::Error;

use crate::session::Phase;

/// Errors encountered while driving a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("State dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot {op} while {phase}")]
    InvalidTransition { op: &'static str, phase: Phase },

    #[error("{model} does not support live tuning")]
    UnsupportedTuning { model: &'static str },

    #[error("Fluid column {index} out of range ({count} columns)")]
    UnknownColumn { index: usize, count: usize },

    #[error(transparent)]
    Core(#[from] sl_core::CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
