//! Monte Carlo simulation engine for redundant-array reliability
//! estimation: Weibull failure/repair distributions driving a
//! continuous-time semi-Markov process, three interchangeable importance-
//! sampling strategies, and the statistics to summarize many iterations.
//!
//! This crate performs no I/O and knows nothing about the CLI; see
//! `reliability-cli` for the code-description-file parser and the
//! argument-driven report.

pub mod bitset;
pub mod component;
pub mod erasure_code;
pub mod sector_model;
pub mod simulate;
pub mod simulators;
pub mod state;
pub mod stats;
pub mod weibull;

pub use component::{Component, ComponentState, Event};
pub use erasure_code::{CodeDescription, CodeType, ErasureCode, FaultCheck};
pub use sector_model::SectorFailureModel;
pub use simulate::{run_iteration, EventDriver, IsParms, IterationOutcome, Pattern};
pub use state::{State, SysState};
pub use stats::Samples;
pub use weibull::Weibull;
