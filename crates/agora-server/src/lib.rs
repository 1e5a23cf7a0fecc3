//! HTTP server for Agora.
//!
//! Serves a single replica. Writes are propagated by whatever transport the
//! agent was opened with; reads only ever see this replica's local state.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::AgoraServer;
