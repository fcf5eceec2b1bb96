//! Common types and utilities for ntnsim
//!
//! This crate provides the record types exchanged between the geometry source,
//! the signal-quality engine and the measurement-event evaluator, together with
//! configuration loading and logging setup used across all ntnsim crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{
    A3Config, A4Config, A5Config, D2Config, EventConfig, LinkParameters, NtnsimConfig,
};
pub use error::{ConfigError, Error};
pub use logging::{init_logging, init_logging_with_filter, LogLevel};
pub use types::{Constellation, LinkSample, SatelliteId, SignalQuality, Timestamp};
