/// Watch Service Library
///
/// Session-integrity and abuse-control core for the course platform: tracks
/// each learner's video-watching session from start to end, records playback
/// events, flags anomalous viewing patterns, aggregates per-teacher watch
/// analytics, and throttles repeated authentication attempts.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Session, event, and analytics data structures
/// - `services`: Business logic layer (session manager, event recorder,
///   analytics aggregator, access checker)
/// - `db`: Database access layer and repositories
/// - `security`: JWT validation and the in-process login rate limiter
/// - `middleware`: HTTP middleware for authentication
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
