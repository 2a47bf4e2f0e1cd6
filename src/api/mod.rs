//! HTTP API module.
//!
//! Serves the reconciled dataset's views over REST plus an SSE log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::start_server;
pub use types::*;
