//! Finding speculatively-executed instructions in BOOM simulation logs.
//!
//! Decode events are matched against writeback events for the same program
//! counter. A decode that never finds a later writeback was squashed.

pub mod config;
pub mod correlate;
pub mod error;
pub mod event;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod project;
pub mod stats;
pub mod synth;
pub mod trace;

pub use config::*;
pub use correlate::*;
pub use error::*;
pub use event::*;
pub use normalize::*;
pub use parse::*;
pub use pipeline::*;
pub use project::*;
pub use stats::*;
pub use synth::*;
pub use trace::*;
