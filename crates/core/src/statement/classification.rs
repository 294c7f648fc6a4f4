//! Account classification map.

use std::collections::HashMap;

use tracing::debug;

use super::error::StatementError;
use super::materializer::PositionTree;
use super::types::{AccountClassification, Movement};

/// Classifications of one report type, keyed by account.
#[derive(Debug, Clone)]
pub struct ClassificationMap {
    report_type: String,
    accounts: HashMap<String, AccountClassification>,
}

impl ClassificationMap {
    /// Builds the map for `positions`' report type.
    ///
    /// Rows of other report types are skipped. Every family and destination
    /// family must resolve to a position of the same report type, and each
    /// account may be classified only once.
    pub fn build(
        classifications: Vec<AccountClassification>,
        positions: &PositionTree,
    ) -> Result<Self, StatementError> {
        let report_type = positions.report_type().to_string();
        let mut accounts = HashMap::with_capacity(classifications.len());
        let mut skipped = 0usize;

        for classification in classifications {
            if classification.report_type != report_type {
                skipped += 1;
                continue;
            }

            let targets = std::iter::once(&classification.family)
                .chain(classification.destination_family.as_ref());
            for family in targets {
                if !positions.contains(family) {
                    return Err(StatementError::UnresolvedFamily {
                        account: classification.account.clone(),
                        family: family.clone(),
                        report_type,
                    });
                }
            }

            if accounts.contains_key(&classification.account) {
                return Err(StatementError::DuplicateClassification {
                    account: classification.account,
                    report_type,
                });
            }
            accounts.insert(classification.account.clone(), classification);
        }

        if skipped > 0 {
            debug!(%report_type, skipped, "Ignored classifications of other report types");
        }

        Ok(Self {
            report_type,
            accounts,
        })
    }

    /// Report type of the map.
    #[must_use]
    pub fn report_type(&self) -> &str {
        &self.report_type
    }

    /// Classification of `account`, if any.
    #[must_use]
    pub fn get(&self, account: &str) -> Option<&AccountClassification> {
        self.accounts.get(account)
    }

    /// Number of classified accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` when no account is classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Pairs each movement with its classification, splitting direct accounts
    /// from exception accounts. Unclassified movements are counted and dropped.
    #[must_use]
    pub fn classify<'m>(&self, movements: &'m [Movement]) -> Classified<'m, '_> {
        let mut classified = Classified::default();
        for movement in movements {
            match self.accounts.get(&movement.account) {
                Some(c) if c.is_exception() => classified.exception.push((movement, c)),
                Some(c) => classified.direct.push((movement, c)),
                None => classified.unclassified += 1,
            }
        }
        classified
    }
}

/// Movements split by classification kind.
#[derive(Debug, Default)]
pub struct Classified<'m, 'c> {
    /// Movements of accounts with a fixed family.
    pub direct: Vec<(&'m Movement, &'c AccountClassification)>,
    /// Movements of accounts with a destination family.
    pub exception: Vec<(&'m Movement, &'c AccountClassification)>,
    /// Movements whose account is not classified for the report type.
    pub unclassified: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::types::{BalanceSide, MovementSource, Position};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn position(family: &str) -> Position {
        Position {
            report_type: "BGFIS".to_string(),
            family: family.to_string(),
            parent_family: None,
            name: family.to_string(),
            natural_sign: BalanceSide::Debit,
            display_order: 1,
            is_group: false,
        }
    }

    fn classification(account: &str, family: &str, destination: Option<&str>) -> AccountClassification {
        AccountClassification {
            account: account.to_string(),
            report_type: "BGFIS".to_string(),
            family: family.to_string(),
            destination_family: destination.map(String::from),
            exception_group: None,
            exception_sign: None,
            natural_balance_side: BalanceSide::Debit,
        }
    }

    fn tree() -> PositionTree {
        PositionTree::new(
            "BGFIS",
            vec![position("CAJA"), position("UTILIDAD"), position("PERDIDA")],
        )
    }

    #[test]
    fn test_build_skips_other_report_types() {
        let mut other = classification("999999", "NOWHERE", None);
        other.report_type = "BGCORP".to_string();

        let map = ClassificationMap::build(vec![classification("411010", "CAJA", None), other], &tree())
            .unwrap();

        assert_eq!(map.len(), 1);
        assert!(map.get("999999").is_none());
    }

    #[test]
    fn test_build_rejects_unresolved_destination() {
        let result = ClassificationMap::build(
            vec![classification("591000", "UTILIDAD", Some("MISSING"))],
            &tree(),
        );

        assert!(matches!(
            result,
            Err(StatementError::UnresolvedFamily { ref family, .. }) if family == "MISSING"
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_accounts() {
        let result = ClassificationMap::build(
            vec![
                classification("411010", "CAJA", None),
                classification("411010", "UTILIDAD", None),
            ],
            &tree(),
        );

        assert!(matches!(
            result,
            Err(StatementError::DuplicateClassification { .. })
        ));
    }

    #[test]
    fn test_classify_splits_direct_exception_and_unclassified() {
        let map = ClassificationMap::build(
            vec![
                classification("411010", "CAJA", None),
                classification("591000", "UTILIDAD", Some("PERDIDA")),
            ],
            &tree(),
        )
        .unwrap();

        let movement = |account: &str| Movement {
            account: account.to_string(),
            cost_center: "00".to_string(),
            debit_local: Decimal::ONE,
            credit_local: Decimal::ZERO,
            debit_foreign: Decimal::ZERO,
            credit_foreign: Decimal::ZERO,
            date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            source: MovementSource::Journal,
        };
        let movements = vec![movement("411010"), movement("591000"), movement("000000")];

        let classified = map.classify(&movements);
        assert_eq!(classified.direct.len(), 1);
        assert_eq!(classified.exception.len(), 1);
        assert_eq!(classified.unclassified, 1);
    }

    #[test]
    fn test_effective_exception_sign_defaults_to_opposite_of_natural_side() {
        let mut c = classification("591000", "UTILIDAD", Some("PERDIDA"));
        assert_eq!(c.effective_exception_sign(), BalanceSide::Credit);

        c.natural_balance_side = BalanceSide::Credit;
        assert_eq!(c.effective_exception_sign(), BalanceSide::Debit);

        c.exception_sign = Some(BalanceSide::Credit);
        assert_eq!(c.effective_exception_sign(), BalanceSide::Credit);
    }
}
