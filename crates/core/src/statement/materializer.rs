//! Position tree materialization.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::warn;

use super::aggregation::FamilyLedger;
use super::types::{BalanceSide, Position, PositionResult};

/// Static position hierarchy of one report type.
#[derive(Debug, Clone)]
pub struct PositionTree {
    report_type: String,
    positions: Vec<Position>,
    by_family: HashMap<String, usize>,
}

impl PositionTree {
    /// Builds the tree from `positions`, keeping only rows of `report_type`.
    ///
    /// Positions are ordered by `(display_order, family)`. When a family
    /// appears twice, the first occurrence wins and the others are dropped.
    #[must_use]
    pub fn new(report_type: &str, positions: Vec<Position>) -> Self {
        let mut positions: Vec<Position> = positions
            .into_iter()
            .filter(|p| p.report_type == report_type)
            .collect();
        positions.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.family.cmp(&b.family))
        });

        let mut by_family = HashMap::with_capacity(positions.len());
        let mut kept = Vec::with_capacity(positions.len());
        for position in positions {
            if by_family.contains_key(&position.family) {
                warn!(
                    report_type,
                    family = %position.family,
                    "Duplicate position ignored"
                );
                continue;
            }
            by_family.insert(position.family.clone(), kept.len());
            kept.push(position);
        }
        let positions = kept;

        Self {
            report_type: report_type.to_string(),
            positions,
            by_family,
        }
    }

    /// Report type of the tree.
    #[must_use]
    pub fn report_type(&self) -> &str {
        &self.report_type
    }

    /// Returns `true` when a position renders `family`.
    #[must_use]
    pub fn contains(&self, family: &str) -> bool {
        self.by_family.contains_key(family)
    }

    /// Position rendering `family`.
    #[must_use]
    pub fn get(&self, family: &str) -> Option<&Position> {
        self.by_family.get(family).map(|&i| &self.positions[i])
    }

    /// Leaf positions in display order.
    pub fn leaves(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| !p.is_group)
    }

    /// Name of `position`'s parent.
    #[must_use]
    pub fn parent_name(&self, position: &Position) -> Option<&str> {
        position
            .parent_family
            .as_deref()
            .and_then(|family| self.get(family))
            .map(|parent| parent.name.as_str())
    }
}

/// Applies the natural-sign convention: credit positions are negated.
#[must_use]
pub fn signed(amount: Decimal, natural_sign: BalanceSide) -> Decimal {
    match natural_sign {
        BalanceSide::Debit => amount,
        BalanceSide::Credit => -amount,
    }
}

/// Emits one row per leaf position, joined with the family totals.
///
/// Leaves without a family total are emitted with zero amounts. Group
/// positions are not summed.
#[must_use]
pub fn materialize(tree: &PositionTree, ledger: &FamilyLedger) -> Vec<PositionResult> {
    tree.leaves()
        .map(|position| {
            let amounts = ledger.amounts(&position.family).unwrap_or_default();
            let parent_position_name = tree.parent_name(position).map(String::from);
            if position.parent_family.is_some() && parent_position_name.is_none() {
                warn!(
                    report_type = %tree.report_type,
                    family = %position.family,
                    parent = ?position.parent_family,
                    "Position parent does not resolve"
                );
            }

            let sign = position.natural_sign;
            PositionResult {
                position: position.name.clone(),
                family: position.family.clone(),
                parent_position_name,
                natural_sign: sign,
                display_order: position.display_order,
                amount_local: signed(amounts.current.local, sign),
                amount_foreign: signed(amounts.current.foreign, sign),
                prior_amount_local: signed(amounts.prior.local, sign),
                prior_amount_foreign: signed(amounts.prior.foreign, sign),
            }
        })
        .collect()
}
