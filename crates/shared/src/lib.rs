//! Shared types and configuration for Balanza.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for generation runs
//! - Pagination types for paginated reads
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{
    AppConfig, ComparisonBasis, DatabaseConfig, ExceptionTestWindow, JobConfig, StatementConfig,
};
