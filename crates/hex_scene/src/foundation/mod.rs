//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the scene:
//! - Math types and operations
//! - Generational collections
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
