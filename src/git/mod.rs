//! Git operations module
//!
//! URL parsing, SSH credentials, process invocation and status queries

pub mod command;
pub mod repository;
pub mod ssh;
pub mod status;
pub mod url;

pub use command::*;
pub use repository::*;
pub use ssh::*;
pub use status::*;
pub use url::*;
