//! HTTP server wiring
//!
//! A thin actix-web layer over the runner: shared state, the ping route,
//! and server construction.

pub mod builder;
pub mod routes;
pub mod state;

pub use builder::{run_server, ServerConfig};
pub use state::AppState;
