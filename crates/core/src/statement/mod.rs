//! Statement of Financial Position generation.
//!
//! This module turns ledger movements into a comparative balance sheet:
//! - Movement collection from snapshots and journal lines
//! - Account classification into families
//! - Direct aggregation and exception-group redirection
//! - Prior-period comparison
//! - Position tree materialization
//! - Per-owner workspace and the report service

pub mod aggregation;
pub mod classification;
pub mod collector;
pub mod error;
pub mod materializer;
pub mod period;
pub mod repository;
pub mod service;
pub mod types;
pub mod workspace;

#[cfg(test)]
mod aggregation_props;

pub use aggregation::{FamilyAmounts, FamilyLedger, PeriodAmounts, resolve_target};
pub use classification::ClassificationMap;
pub use collector::MovementCollector;
pub use error::{DataAccessError, RenderError, StatementError};
pub use materializer::PositionTree;
pub use period::ComparisonPeriods;
pub use repository::{LedgerRepository, ReferenceRepository, StatementRenderer};
pub use service::StatementService;
pub use types::*;
pub use workspace::{MaterializedStatement, WorkspaceKey, WorkspaceStore};
