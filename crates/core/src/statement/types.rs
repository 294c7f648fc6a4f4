//! Statement data types.

use balanza_shared::types::GenerationId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a balance: debit or credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSide {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

impl BalanceSide {
    /// Returns the other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

/// Which comparison column an amount belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// The requested report date.
    Current,
    /// The prior comparison date.
    Prior,
}

/// What a generation covers: a company ledger, a balance-sheet variant and
/// the accounting books whose journal lines are included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportScope {
    /// Company schema holding the ledger.
    pub company: String,
    /// Balance-sheet variant (partition key throughout).
    pub report_type: String,
    /// Accounting books whose journal lines are collected.
    pub books: Vec<String>,
}

impl ReportScope {
    /// Creates a new scope.
    #[must_use]
    pub fn new(company: impl Into<String>, report_type: impl Into<String>, books: Vec<String>) -> Self {
        Self {
            company: company.into(),
            report_type: report_type.into(),
            books,
        }
    }

    /// Returns `true` when `book` is one of the requested books.
    #[must_use]
    pub fn includes_book(&self, book: &str) -> bool {
        self.books.iter().any(|b| b == book)
    }
}

/// Returns `true` when `name` can be used unquoted as a schema name:
/// an ASCII letter or underscore followed by letters, digits or underscores.
#[must_use]
pub fn is_schema_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Period-end balance of one `(cost_center, account)` pair.
///
/// A positive amount is a debit balance, a negative amount a credit balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotBalance {
    /// Cost center.
    pub cost_center: String,
    /// Ledger account code.
    pub account: String,
    /// Snapshot date.
    pub date: NaiveDate,
    /// Balance in local currency.
    pub balance_local: Decimal,
    /// Balance in foreign currency.
    pub balance_foreign: Decimal,
}

/// One line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Journal entry number.
    pub entry: String,
    /// Cost center.
    pub cost_center: String,
    /// Ledger account code.
    pub account: String,
    /// Accounting book of the entry.
    pub book: String,
    /// Entry date.
    pub date: NaiveDate,
    /// Debit in local currency.
    pub debit_local: Decimal,
    /// Credit in local currency.
    pub credit_local: Decimal,
    /// Debit in foreign currency.
    pub debit_foreign: Decimal,
    /// Credit in foreign currency.
    pub credit_foreign: Decimal,
}

/// Where a movement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementSource {
    /// Closed-period snapshot balance.
    Snapshot,
    /// Open-period journal line.
    Journal,
}

/// Unified per-account debit/credit delta. Recomputed on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Ledger account code.
    pub account: String,
    /// Cost center.
    pub cost_center: String,
    /// Debit in local currency.
    pub debit_local: Decimal,
    /// Credit in local currency.
    pub credit_local: Decimal,
    /// Debit in foreign currency.
    pub debit_foreign: Decimal,
    /// Credit in foreign currency.
    pub credit_foreign: Decimal,
    /// Date of the underlying snapshot or entry.
    pub date: NaiveDate,
    /// Origin of the movement.
    pub source: MovementSource,
}

impl Movement {
    /// Net local amount (debit - credit).
    #[must_use]
    pub fn net_local(&self) -> Decimal {
        self.debit_local - self.credit_local
    }

    /// Net foreign amount (debit - credit).
    #[must_use]
    pub fn net_foreign(&self) -> Decimal {
        self.debit_foreign - self.credit_foreign
    }
}

/// Collected movements for one report date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementSet {
    /// Date the movements were collected for.
    pub as_of: NaiveDate,
    /// Movements in collection order: snapshots first, then journal lines.
    pub movements: Vec<Movement>,
}

impl MovementSet {
    /// Number of collected movements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.movements.len()
    }

    /// Returns `true` when nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}

/// Report placement of one ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountClassification {
    /// Ledger account code.
    pub account: String,
    /// Balance-sheet variant.
    pub report_type: String,
    /// Declared family.
    pub family: String,
    /// Alternative family used when the exception group flips.
    pub destination_family: Option<String>,
    /// Exception group the account belongs to.
    pub exception_group: Option<String>,
    /// Explicit exception sign of the group.
    pub exception_sign: Option<BalanceSide>,
    /// Side the account conventionally carries its balance on.
    pub natural_balance_side: BalanceSide,
}

impl AccountClassification {
    /// Sign used by the exception test: the explicit sign, or the opposite of
    /// the natural balance side.
    #[must_use]
    pub fn effective_exception_sign(&self) -> BalanceSide {
        self.exception_sign
            .unwrap_or_else(|| self.natural_balance_side.opposite())
    }

    /// Returns `true` when the account's placement depends on a sign test.
    #[must_use]
    pub fn is_exception(&self) -> bool {
        self.destination_family.is_some()
    }
}

/// Node of the static report hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Balance-sheet variant.
    pub report_type: String,
    /// Family rendered by this position.
    pub family: String,
    /// Family of the parent position; `None` for roots.
    pub parent_family: Option<String>,
    /// Display name.
    pub name: String,
    /// Natural sign; credit positions are shown negated.
    pub natural_sign: BalanceSide,
    /// Display order.
    pub display_order: i32,
    /// Group (non-leaf) position.
    pub is_group: bool,
}

/// Aggregated amounts of one family for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyBalance {
    /// Balance-sheet variant.
    pub report_type: String,
    /// Family.
    pub family: String,
    /// Requesting identity.
    pub owner: String,
    /// Current local amount (debit - credit).
    pub amount_local: Decimal,
    /// Current foreign amount (debit - credit).
    pub amount_foreign: Decimal,
    /// Prior local amount (debit - credit).
    pub prior_amount_local: Decimal,
    /// Prior foreign amount (debit - credit).
    pub prior_amount_foreign: Decimal,
}

/// One materialized report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionResult {
    /// Position name.
    pub position: String,
    /// Family rendered by the position.
    pub family: String,
    /// Name of the parent position, if any.
    pub parent_position_name: Option<String>,
    /// Natural sign of the position.
    pub natural_sign: BalanceSide,
    /// Display order.
    pub display_order: i32,
    /// Signed current local amount.
    pub amount_local: Decimal,
    /// Signed current foreign amount.
    pub amount_foreign: Decimal,
    /// Signed prior local amount.
    pub prior_amount_local: Decimal,
    /// Signed prior foreign amount.
    pub prior_amount_foreign: Decimal,
}

/// Lifecycle of a generation in an owner's workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    /// Nothing generated yet, or a generation is about to start.
    #[default]
    Pending,
    /// Loading reference data and ledger movements.
    Collecting,
    /// Summing accounts without exception redirection.
    AggregatingDirect,
    /// Resolving exception groups.
    AggregatingExceptions,
    /// Result rows are available.
    Materialized,
    /// Result rows have been read at least once.
    Served,
    /// Superseded by a newer generation.
    Invalidated,
    /// The last generation failed; no result is available.
    Failed,
}

impl GenerationState {
    /// Returns `true` when result rows may be read.
    #[must_use]
    pub const fn is_readable(self) -> bool {
        matches!(self, Self::Materialized | Self::Served)
    }
}

impl std::fmt::Display for GenerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Collecting => "collecting",
            Self::AggregatingDirect => "aggregating_direct",
            Self::AggregatingExceptions => "aggregating_exceptions",
            Self::Materialized => "materialized",
            Self::Served => "served",
            Self::Invalidated => "invalidated",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Parameters of one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// What to generate.
    pub scope: ReportScope,
    /// Report date.
    pub as_of: NaiveDate,
    /// Requesting identity.
    pub owner: String,
    /// Explicit comparison date; derived from the configured basis when absent.
    #[serde(default)]
    pub comparison_date: Option<NaiveDate>,
}

/// Whether an exception group stays at its declared family or moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Declared family.
    Family,
    /// Destination family.
    Destination,
}

/// Outcome of the sign test for one exception group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupResolution {
    /// Group name, or the account code for ungrouped exception accounts.
    pub group: String,
    /// Sign used by the test.
    pub exception_sign: BalanceSide,
    /// Sum of member current nets, local currency.
    pub current_net_local: Decimal,
    /// Sum of member prior nets, local currency.
    pub prior_net_local: Decimal,
    /// Placement of current amounts.
    pub current_placement: Placement,
    /// Placement of prior amounts.
    pub prior_placement: Placement,
    /// Member account codes, sorted.
    pub members: Vec<String>,
}

/// Summary returned by a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Generation run.
    pub generation_id: GenerationId,
    /// Report date.
    pub as_of: NaiveDate,
    /// Comparison date.
    pub prior_as_of: NaiveDate,
    /// Movements collected for the report date.
    pub current_movements: usize,
    /// Movements collected for the comparison date.
    pub prior_movements: usize,
    /// Materialized rows.
    pub rows: usize,
    /// Exception group outcomes.
    pub groups: Vec<GroupResolution>,
}

/// Balance type the owner may generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTypeInfo {
    /// Report type code.
    pub report_type: String,
    /// Description.
    pub description: String,
    /// Report template code.
    pub qrp: String,
    /// Display label.
    pub display_text: String,
}

/// Accounting period of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// Description.
    pub description: String,
    /// Accounting book.
    pub book: String,
    /// Period status code.
    pub status: String,
    /// Last day of the period.
    pub end_date: NaiveDate,
}

/// Binary export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Spreadsheet.
    Excel,
    /// Portable document.
    Pdf,
}

/// Everything a renderer needs to produce an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDocument {
    /// Scope of the statement.
    pub scope: ReportScope,
    /// Requesting identity.
    pub owner: String,
    /// Report date.
    pub as_of: NaiveDate,
    /// Comparison date.
    pub prior_as_of: NaiveDate,
    /// All rows in display order.
    pub rows: Vec<PositionResult>,
}
