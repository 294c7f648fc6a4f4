//! Period comparison.

use balanza_shared::ComparisonBasis;
use chrono::{Months, NaiveDate};
use tracing::debug;

use super::collector::MovementCollector;
use super::error::StatementError;
use super::repository::LedgerRepository;
use super::types::{GenerationState, MovementSet, ReportScope};

/// Report date and the date it is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonPeriods {
    /// Report date.
    pub as_of: NaiveDate,
    /// Comparison date.
    pub prior_as_of: NaiveDate,
}

impl ComparisonPeriods {
    /// Resolves the comparison date.
    ///
    /// An explicit date wins and must not lie after `as_of`. Otherwise the
    /// date is `as_of` shifted back one year (annual) or one month (monthly),
    /// clamped to the last day of the target month.
    ///
    /// Clamping differs from the legacy report on month-end dates that do not
    /// exist in the target month: 2024-02-29 compares against 2023-02-28
    /// here, where the legacy report rolled over to 2023-03-01.
    pub fn resolve(
        as_of: NaiveDate,
        explicit: Option<NaiveDate>,
        basis: ComparisonBasis,
    ) -> Result<Self, StatementError> {
        let prior_as_of = match explicit {
            Some(comparison) if comparison > as_of => {
                return Err(StatementError::ComparisonAfterReportDate { as_of, comparison });
            }
            Some(comparison) => comparison,
            None => {
                let months = match basis {
                    ComparisonBasis::Annual => 12,
                    ComparisonBasis::Monthly => 1,
                };
                as_of
                    .checked_sub_months(Months::new(months))
                    .ok_or(StatementError::ComparisonOutOfRange(as_of))?
            }
        };

        Ok(Self { as_of, prior_as_of })
    }
}

/// Collects the current and prior movement sets concurrently.
///
/// A failure in either collection discards both.
pub async fn collect_both<L: LedgerRepository>(
    ledger: &L,
    scope: &ReportScope,
    periods: ComparisonPeriods,
) -> Result<(MovementSet, MovementSet), StatementError> {
    let collector = MovementCollector::new(ledger);
    let (current, prior) = tokio::try_join!(
        collector.collect(scope, periods.as_of),
        collector.collect(scope, periods.prior_as_of),
    )
    .map_err(|e| StatementError::data_access(GenerationState::Collecting, e))?;

    debug!(
        report_type = %scope.report_type,
        as_of = %periods.as_of,
        prior_as_of = %periods.prior_as_of,
        current = current.len(),
        prior = prior.len(),
        "Collected movements for both periods"
    );

    Ok((current, prior))
}
