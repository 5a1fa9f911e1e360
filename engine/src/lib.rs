//! Adaptive Nutrition Engine Library
//!
//! This library exposes the engine modules for use in tests and other crates.

pub mod config;
pub mod error;
pub mod services;
pub mod state;
