//! Core business logic for Balanza.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Ledger and reference data arrive through repository traits implemented by
//! the db crate.
//!
//! # Modules
//!
//! - `statement` - Statement of Financial Position aggregation engine

pub mod statement;
