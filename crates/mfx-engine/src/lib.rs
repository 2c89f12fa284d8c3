//! mfx-engine: Real-time scheduling for the reorderable effect chain
//!
//! The audio thread owns a `ChainScheduler`; the control thread owns the
//! matching `ChainController`. They share only lock-free state:
//! - `order_channel` - latest-wins SPSC channel carrying effect orders both ways
//! - `ParamStore` - atomic parameter values
//! - `meters` - atomic RMS readings
//! - `analyzer_tap` - rtrb rings of post-chain samples
//!
//! ## Modules
//! - `smoother_bank` - per-chunk smoothing of every continuous effect parameter
//! - `mono_channel` - one channel's effect instances, slot table and filter cache
//! - `scheduler` - block orchestration and the control-side handle

pub mod analyzer_tap;
pub mod meters;
pub mod mono_channel;
pub mod order_channel;
pub mod scheduler;
pub mod smoother_bank;

pub use analyzer_tap::{AnalyzerReader, AnalyzerWriter, analyzer_tap};
pub use meters::{ChainMeters, MeterSnapshot};
pub use mono_channel::{FilterCoeffCache, FilterSettings, MonoChannel, SlotState, SlotTable};
pub use order_channel::{OrderReceiver, OrderSender, SlotWord, order_channel};
pub use scheduler::{ChainController, ChainScheduler};
pub use smoother_bank::{ParamSmootherBank, SmoothedParam};
