//! Collaborator traits implemented outside the engine.
//!
//! The db crate implements the repositories against the legacy ledger
//! schema; renderers live with whatever produces Excel or PDF output.

use std::future::Future;

use chrono::NaiveDate;

use super::error::{DataAccessError, RenderError};
use super::types::{
    AccountClassification, AccountingPeriod, ExportFormat, JournalLine, Position, ReportScope,
    ReportTypeInfo, SnapshotBalance, StatementDocument,
};

/// Read access to ledger movements.
pub trait LedgerRepository: Send + Sync {
    /// Snapshot balances dated at or before `as_of`.
    ///
    /// Implementations may return only the latest snapshot per
    /// `(cost_center, account)`; the collector tolerates either.
    fn snapshot_balances(
        &self,
        scope: &ReportScope,
        as_of: NaiveDate,
    ) -> impl Future<Output = Result<Vec<SnapshotBalance>, DataAccessError>> + Send;

    /// Journal lines of entries dated at or before `as_of` in the scope's books.
    fn journal_lines(
        &self,
        scope: &ReportScope,
        as_of: NaiveDate,
    ) -> impl Future<Output = Result<Vec<JournalLine>, DataAccessError>> + Send;
}

/// Read access to static report reference data.
pub trait ReferenceRepository: Send + Sync {
    /// Account classifications of one report type.
    fn classifications(
        &self,
        company: &str,
        report_type: &str,
    ) -> impl Future<Output = Result<Vec<AccountClassification>, DataAccessError>> + Send;

    /// Position hierarchy of one report type.
    fn positions(
        &self,
        company: &str,
        report_type: &str,
    ) -> impl Future<Output = Result<Vec<Position>, DataAccessError>> + Send;

    /// Report types the owner may generate.
    fn report_types(
        &self,
        company: &str,
        owner: &str,
    ) -> impl Future<Output = Result<Vec<ReportTypeInfo>, DataAccessError>> + Send;

    /// Fiscal accounting periods ending on `end_date`.
    fn accounting_periods(
        &self,
        company: &str,
        end_date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<AccountingPeriod>, DataAccessError>> + Send;
}

/// Turns materialized rows into export bytes.
pub trait StatementRenderer: Send + Sync {
    /// Renders `document` in `format`.
    fn render(
        &self,
        format: ExportFormat,
        document: &StatementDocument,
    ) -> Result<Vec<u8>, RenderError>;
}
