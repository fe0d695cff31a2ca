//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Integer geometry (points and rectangles)
//! - Stable handle types for the window arena
//! - Time management (deadlines, event timestamps)
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
