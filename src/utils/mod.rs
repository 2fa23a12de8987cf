//! Utility functions
//!
//! Path normalization and validation helpers

pub mod path;

pub use path::*;
