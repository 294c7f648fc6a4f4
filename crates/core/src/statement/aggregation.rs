//! Family aggregation: direct sums and exception-group redirection.
//!
//! Direct accounts post `debit - credit` to their declared family. Exception
//! accounts (those with a destination family) are grouped, the group's net
//! balance is tested against its exception sign, and every member posts to
//! the same side of the test: all to their declared family or all to their
//! destination family.

use std::collections::BTreeMap;

use balanza_shared::ExceptionTestWindow;
use rust_decimal::Decimal;
use tracing::debug;

use super::classification::ClassificationMap;
use super::types::{
    AccountClassification, BalanceSide, FamilyBalance, GroupResolution, MovementSet, Period,
    Placement,
};

/// Local and foreign amounts of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodAmounts {
    /// Local currency.
    pub local: Decimal,
    /// Foreign currency.
    pub foreign: Decimal,
}

impl PeriodAmounts {
    fn add(&mut self, local: Decimal, foreign: Decimal) {
        self.local += local;
        self.foreign += foreign;
    }
}

/// Current and prior amounts of one family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyAmounts {
    /// Report date column.
    pub current: PeriodAmounts,
    /// Comparison date column.
    pub prior: PeriodAmounts,
}

impl FamilyAmounts {
    /// Amounts of `period`.
    #[must_use]
    pub const fn period(&self, period: Period) -> PeriodAmounts {
        match period {
            Period::Current => self.current,
            Period::Prior => self.prior,
        }
    }

    fn period_mut(&mut self, period: Period) -> &mut PeriodAmounts {
        match period {
            Period::Current => &mut self.current,
            Period::Prior => &mut self.prior,
        }
    }
}

/// Unsigned `debit - credit` totals per family of one report type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyLedger {
    report_type: String,
    families: BTreeMap<String, FamilyAmounts>,
}

impl FamilyLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(report_type: impl Into<String>) -> Self {
        Self {
            report_type: report_type.into(),
            families: BTreeMap::new(),
        }
    }

    /// Report type of the ledger.
    #[must_use]
    pub fn report_type(&self) -> &str {
        &self.report_type
    }

    /// Adds amounts to `family` in `period`.
    pub fn post(&mut self, family: &str, period: Period, local: Decimal, foreign: Decimal) {
        self.families
            .entry(family.to_string())
            .or_default()
            .period_mut(period)
            .add(local, foreign);
    }

    /// Totals of `family`, if anything was posted to it.
    #[must_use]
    pub fn amounts(&self, family: &str) -> Option<FamilyAmounts> {
        self.families.get(family).copied()
    }

    /// Sum over every family of `period`.
    #[must_use]
    pub fn total(&self, period: Period) -> PeriodAmounts {
        let mut total = PeriodAmounts::default();
        for amounts in self.families.values() {
            let p = amounts.period(period);
            total.add(p.local, p.foreign);
        }
        total
    }

    /// Number of families with postings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Returns `true` when nothing was posted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Converts the ledger into owner-scoped family balances.
    #[must_use]
    pub fn to_balances(&self, owner: &str) -> Vec<FamilyBalance> {
        self.families
            .iter()
            .map(|(family, amounts)| FamilyBalance {
                report_type: self.report_type.clone(),
                family: family.clone(),
                owner: owner.to_string(),
                amount_local: amounts.current.local,
                amount_foreign: amounts.current.foreign,
                prior_amount_local: amounts.prior.local,
                prior_amount_foreign: amounts.prior.foreign,
            })
            .collect()
    }
}

/// Sums movements of accounts without a destination family into their
/// declared family, for both periods.
#[must_use]
pub fn aggregate_direct(
    map: &ClassificationMap,
    current: &MovementSet,
    prior: &MovementSet,
) -> FamilyLedger {
    let mut ledger = FamilyLedger::new(map.report_type());

    for (period, set) in [(Period::Current, current), (Period::Prior, prior)] {
        let classified = map.classify(&set.movements);
        for (movement, classification) in classified.direct {
            ledger.post(
                &classification.family,
                period,
                movement.net_local(),
                movement.net_foreign(),
            );
        }
        if classified.unclassified > 0 {
            debug!(
                report_type = %map.report_type(),
                ?period,
                unclassified = classified.unclassified,
                "Dropped movements of unclassified accounts"
            );
        }
    }

    ledger
}

/// Decides whether an exception group stays at its declared family.
///
/// A credit-signed group stays while its net is zero or positive; a
/// debit-signed group stays while its net is zero or negative.
#[must_use]
pub fn resolve_target(exception_sign: BalanceSide, group_net: Decimal) -> Placement {
    let stays = match exception_sign {
        BalanceSide::Credit => group_net >= Decimal::ZERO,
        BalanceSide::Debit => group_net <= Decimal::ZERO,
    };
    if stays {
        Placement::Family
    } else {
        Placement::Destination
    }
}

/// Grouping key of exception accounts. Accounts without a named group form
/// a group of their own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKey {
    Named(String),
    Account(String),
}

impl GroupKey {
    fn of(classification: &AccountClassification) -> Self {
        classification.exception_group.as_ref().map_or_else(
            || Self::Account(classification.account.clone()),
            |group| Self::Named(group.clone()),
        )
    }

    fn label(&self) -> &str {
        match self {
            Self::Named(name) | Self::Account(name) => name,
        }
    }
}

struct Member<'c> {
    classification: &'c AccountClassification,
    amounts: FamilyAmounts,
}

#[derive(Default)]
struct Group<'c> {
    members: BTreeMap<&'c str, Member<'c>>,
}

impl Group<'_> {
    fn net_local(&self, period: Period) -> Decimal {
        self.members
            .values()
            .map(|m| m.amounts.period(period).local)
            .sum()
    }
}

fn target_of(classification: &AccountClassification, placement: Placement) -> &str {
    match placement {
        Placement::Family => &classification.family,
        Placement::Destination => classification
            .destination_family
            .as_deref()
            .unwrap_or(&classification.family),
    }
}

/// Resolves exception groups and posts their members' amounts into `ledger`.
///
/// With [`ExceptionTestWindow::Combined`] a group's net is the sum of the
/// current and prior nets and one placement applies to both columns. With
/// [`ExceptionTestWindow::PerPeriod`] each column is placed by its own net.
#[must_use]
pub fn aggregate_exceptions(
    map: &ClassificationMap,
    current: &MovementSet,
    prior: &MovementSet,
    window: ExceptionTestWindow,
    mut ledger: FamilyLedger,
) -> (FamilyLedger, Vec<GroupResolution>) {
    let mut groups: BTreeMap<(GroupKey, BalanceSide), Group<'_>> = BTreeMap::new();

    for (period, set) in [(Period::Current, current), (Period::Prior, prior)] {
        for (movement, classification) in map.classify(&set.movements).exception {
            let key = (GroupKey::of(classification), classification.effective_exception_sign());
            let member = groups
                .entry(key)
                .or_default()
                .members
                .entry(classification.account.as_str())
                .or_insert_with(|| Member {
                    classification,
                    amounts: FamilyAmounts::default(),
                });
            member
                .amounts
                .period_mut(period)
                .add(movement.net_local(), movement.net_foreign());
        }
    }

    let mut resolutions = Vec::with_capacity(groups.len());
    for ((key, sign), group) in groups {
        let current_net = group.net_local(Period::Current);
        let prior_net = group.net_local(Period::Prior);

        let (current_placement, prior_placement) = match window {
            ExceptionTestWindow::Combined => {
                let placement = resolve_target(sign, current_net + prior_net);
                (placement, placement)
            }
            ExceptionTestWindow::PerPeriod => (
                resolve_target(sign, current_net),
                resolve_target(sign, prior_net),
            ),
        };

        for member in group.members.values() {
            for (period, placement) in [
                (Period::Current, current_placement),
                (Period::Prior, prior_placement),
            ] {
                let amounts = member.amounts.period(period);
                ledger.post(
                    target_of(member.classification, placement),
                    period,
                    amounts.local,
                    amounts.foreign,
                );
            }
        }

        debug!(
            report_type = %map.report_type(),
            group = %key.label(),
            ?sign,
            %current_net,
            %prior_net,
            ?current_placement,
            ?prior_placement,
            members = group.members.len(),
            "Resolved exception group"
        );

        resolutions.push(GroupResolution {
            group: key.label().to_string(),
            exception_sign: sign,
            current_net_local: current_net,
            prior_net_local: prior_net,
            current_placement,
            prior_placement,
            members: group.members.keys().map(|a| (*a).to_string()).collect(),
        });
    }

    (ledger, resolutions)
}
