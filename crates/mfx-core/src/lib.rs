//! mfx-core: Shared types for the multi-effect chain
//!
//! This crate provides the foundational types used across all mfx crates:
//! - `EffectKind` / `EffectOrder` - the effect set and its processing order
//! - `ParamId` / `ParamStore` - enumerated parameters and their lock-free store
//! - `EngineConfig` - scheduler configuration
//! - `MfxError` - error type

mod config;
mod effect;
mod error;
mod ordering;
mod params;
mod sample;

pub use config::*;
pub use effect::*;
pub use error::*;
pub use ordering::*;
pub use params::*;
pub use sample::*;
