//! Error types for the effect chain

use thiserror::Error;

use crate::EffectKind;

/// Reasons an effect order payload is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Wrong order length: expected {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Invalid effect kind tag: {0}")]
    InvalidKind(i64),

    #[error("Effect kind appears more than once: {0:?}")]
    DuplicateKind(EffectKind),
}

/// Core error type
#[derive(Error, Debug)]
pub enum MfxError {
    #[error("Invalid effect order: {0}")]
    Order(#[from] OrderError),

    #[error("Channel mismatch: expected {expected}, got {actual}")]
    ChannelCount { expected: usize, actual: usize },

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type MfxResult<T> = Result<T, MfxError>;
