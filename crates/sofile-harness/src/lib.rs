//! Conformance harness for sofile streams.
//!
//! This crate provides:
//! - A scenario matrix exercising the stream contract against real files and
//!   shell subprocesses
//! - A runner that times each scenario and emits structured JSONL logs
//! - Byte-wise copy and subprocess echo tools used by the `harness` binary

#![forbid(unsafe_code)]

pub mod error;
pub mod runner;
pub mod scenarios;
pub mod structured_log;
pub mod tools;

pub use error::HarnessError;
pub use runner::{RunReport, ScenarioResult, ScenarioRunner};
pub use scenarios::{Observation, Scenario, catalog};
