//! chanemu Simulation Harness
//!
//! Drives a [`SharedMedium`](chanemu_core::SharedMedium) and a fleet of
//! virtual radios through seeded scenarios that check the emulator's
//! contract end to end:
//! - **Propagation**: a known channel reproduces a known waveform
//! - **Medium**: self-exclusion, reset floor, growth stability
//! - **Concurrency**: radios streaming from independent threads
//!
//! # Usage
//!
//! ```ignore
//! use chanemu_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42, 4).run(ScenarioId::ToneLoopback);
//! assert!(result.passed);
//! ```

mod runner;
mod world;
pub mod scenarios;

pub use runner::{ScenarioResult, ScenarioRunner};
pub use world::{SimConfig, SimWorld};
