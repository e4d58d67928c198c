//! HTTP API module.
//!
//! Hosts one upload session for a browser front-end.

pub mod server;
pub mod types;

pub use server::{router, start_server, AppState};
pub use types::*;
