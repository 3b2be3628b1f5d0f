//! burnout_server: axum HTTP surface for the student burnout tracker.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
