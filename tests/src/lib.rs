//! Integration test framework for ntnsim
#![allow(missing_docs)]
//!
//! Shared fixtures and helpers for the cross-crate tests.
//!
//! # Test Categories
//!
//! 1. **Event Scenarios** - A3/A4/A5/D2 entering, leaving and boundary behaviour
//! 2. **Signal Properties** - Link budget behaviour over geometry
//! 3. **Session Lifecycle** - Parallel evaluation, snapshots, publishing and configuration

pub mod fixtures;
pub mod test_utils;

pub use fixtures::{
    link_sample, measured, pair_sample, serving_batch, test_config, TEST_CONFIG_YAML,
};
pub use test_utils::{drive_pair, init_test_logging, receive_outcomes, TestResult};
