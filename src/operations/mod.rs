//! Operations module
//!
//! The `GitOperations` facade coordinating credentials, paths and git

pub mod facade;

pub use facade::*;
