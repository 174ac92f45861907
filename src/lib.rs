/// The analytics cache and its invalidation helpers.
pub mod cache;
/// Environment-driven server configuration.
pub mod config;
/// The error taxonomy surfaced to HTTP clients.
pub mod error;
/// Result aggregation and ranking for tournament leaderboards.
pub mod leaderboard;
/// The in-process pub/sub bus carrying live updates to viewers.
pub mod live;
/// All the HTTP and WebSocket routes the server exposes.
pub mod routes;
/// Round-robin fixture generation.
pub mod schedule;
/// Shared state handed to every request handler.
pub mod state;
/// Traits and types used for interacting with the database.
pub mod store;

/// A thread-safe Error type used throughout the server.
pub type AppError = anyhow::Error;
