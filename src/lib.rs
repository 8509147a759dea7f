//! Flood-risk classification: noise-augmented training, persisted models and
//! single-sample risk scoring over the CLI and an HTTP server.

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod ml;
pub mod models;
pub mod pipeline;

pub use error::{AppError, Result};
