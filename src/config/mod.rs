//! # Configuration Module
//!
//! This module centralizes all configuration constants for the matrix engine.
//! Constants are grouped by their functional area and interdependencies are
//! documented and enforced through compile-time assertions.
//!
//! Runtime knobs (page size, open page bound, decode error policy) live in
//! [`crate::matrix::MatrixOptions`] and [`crate::cosim::CosimilarityConfig`];
//! they default to the values defined here.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
