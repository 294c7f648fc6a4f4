//! Ledger movement collection.
//!
//! A report date's movements are the union of two disjoint sources: the
//! latest closed-period snapshot of every `(cost_center, account)` pair and
//! the open-period journal lines. They are never deduplicated against each
//! other.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::error::DataAccessError;
use super::repository::LedgerRepository;
use super::types::{JournalLine, Movement, MovementSet, MovementSource, ReportScope, SnapshotBalance};

/// Collects movements for a scope and date from a [`LedgerRepository`].
pub struct MovementCollector<'a, L> {
    ledger: &'a L,
}

impl<'a, L: LedgerRepository> MovementCollector<'a, L> {
    /// Creates a collector over `ledger`.
    #[must_use]
    pub const fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Collects the movements of `scope` as of `as_of`.
    ///
    /// Both sources are fetched concurrently; any failure discards the
    /// other source's result.
    pub async fn collect(
        &self,
        scope: &ReportScope,
        as_of: NaiveDate,
    ) -> Result<MovementSet, DataAccessError> {
        let (snapshots, lines) = tokio::try_join!(
            self.ledger.snapshot_balances(scope, as_of),
            self.ledger.journal_lines(scope, as_of),
        )?;

        debug!(
            report_type = %scope.report_type,
            %as_of,
            snapshots = snapshots.len(),
            journal_lines = lines.len(),
            "Fetched ledger sources"
        );

        Ok(assemble(scope, as_of, snapshots, lines))
    }
}

/// Builds the movement set from raw sources.
///
/// Keeps the latest snapshot at or before `as_of` per `(cost_center,
/// account)` and every journal line dated at or before `as_of` whose book
/// is in the scope.
#[must_use]
pub fn assemble(
    scope: &ReportScope,
    as_of: NaiveDate,
    snapshots: Vec<SnapshotBalance>,
    lines: Vec<JournalLine>,
) -> MovementSet {
    let mut latest: HashMap<(String, String), SnapshotBalance> = HashMap::new();
    for snapshot in snapshots.into_iter().filter(|s| s.date <= as_of) {
        let key = (snapshot.cost_center.clone(), snapshot.account.clone());
        match latest.get(&key) {
            Some(existing) if existing.date >= snapshot.date => {}
            _ => {
                latest.insert(key, snapshot);
            }
        }
    }

    let mut snapshots: Vec<SnapshotBalance> = latest.into_values().collect();
    snapshots.sort_by(|a, b| {
        (a.account.as_str(), a.cost_center.as_str()).cmp(&(b.account.as_str(), b.cost_center.as_str()))
    });

    let mut movements: Vec<Movement> = snapshots.into_iter().map(split_snapshot).collect();
    movements.extend(
        lines
            .into_iter()
            .filter(|line| line.date <= as_of && scope.includes_book(&line.book))
            .map(|line| Movement {
                account: line.account,
                cost_center: line.cost_center,
                debit_local: line.debit_local,
                credit_local: line.credit_local,
                debit_foreign: line.debit_foreign,
                credit_foreign: line.credit_foreign,
                date: line.date,
                source: MovementSource::Journal,
            }),
    );

    MovementSet { as_of, movements }
}

/// Splits a signed balance into `(debit, credit)`.
fn split(amount: Decimal) -> (Decimal, Decimal) {
    if amount > Decimal::ZERO {
        (amount, Decimal::ZERO)
    } else if amount < Decimal::ZERO {
        (Decimal::ZERO, amount.abs())
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    }
}

fn split_snapshot(snapshot: SnapshotBalance) -> Movement {
    let (debit_local, credit_local) = split(snapshot.balance_local);
    let (debit_foreign, credit_foreign) = split(snapshot.balance_foreign);
    Movement {
        account: snapshot.account,
        cost_center: snapshot.cost_center,
        debit_local,
        credit_local,
        debit_foreign,
        credit_foreign,
        date: snapshot.date,
        source: MovementSource::Snapshot,
    }
}
