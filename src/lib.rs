//! Library crate for pelada-back, exposing modules for the binaries and tests.

/// Draw settings loaded at startup.
pub mod config;
/// Storage layer.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business logic.
pub mod services;
/// Shared application state and domain types.
pub mod state;
