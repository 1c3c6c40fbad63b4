//! Utility functions and types.
//!
//! This module provides utility types used throughout the system.

pub mod logging;

pub use logging::LogLevel;
