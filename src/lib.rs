//! Health metrics API.
//!
//! Stores and serves per-user health metrics (steps, heart rate, resting
//! calories, sleep hours) keyed by phone number, with field validation and an
//! aggregate statistics endpoint.
//!
//! ```text
//! HTTP request → api (axum) → controller → validation → store → response
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types and HTTP error mapping
//! - [`records`]: Record model, validators, and input parsing
//! - [`store`]: Repository trait with in-memory and PostgreSQL stores
//! - [`controller`]: Record operations independent of HTTP
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod records;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, AppError, Result};
