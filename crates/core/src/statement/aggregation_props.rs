//! Property-based tests for the aggregation pipeline.
//!
//! - Conservation of direct and exception amounts
//! - Atomic placement of exception groups
//! - Determinism of the sign test
//! - Completeness and sign rule of materialized rows

use balanza_shared::ExceptionTestWindow;
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::aggregation::{FamilyLedger, aggregate_direct, aggregate_exceptions, resolve_target};
use super::classification::ClassificationMap;
use super::materializer::{PositionTree, materialize, signed};
use super::types::{
    AccountClassification, BalanceSide, Movement, MovementSet, MovementSource, Period, Placement,
    Position,
};

const DIRECT_ACCOUNTS: [(&str, &str); 3] = [("111000", "CAJA"), ("112000", "CAJA"), ("113000", "BANCOS")];
const GROUPED_ACCOUNTS: [&str; 3] = ["591000", "592000", "593000"];

/// Strategy to generate amounts from 0.00 to 10,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate signed nets from -10,000.00 to 10,000.00.
fn signed_amount() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn side() -> impl Strategy<Value = BalanceSide> {
    prop_oneof![Just(BalanceSide::Debit), Just(BalanceSide::Credit)]
}

fn window() -> impl Strategy<Value = ExceptionTestWindow> {
    prop_oneof![
        Just(ExceptionTestWindow::Combined),
        Just(ExceptionTestWindow::PerPeriod)
    ]
}

/// Strategy to generate movements over the six known accounts.
fn movements() -> impl Strategy<Value = Vec<Movement>> {
    prop::collection::vec((0usize..6, amount(), amount()), 0..30).prop_map(|raw| {
        raw.into_iter()
            .map(|(index, debit, credit)| {
                let account = if index < 3 {
                    DIRECT_ACCOUNTS[index].0
                } else {
                    GROUPED_ACCOUNTS[index - 3]
                };
                Movement {
                    account: account.to_string(),
                    cost_center: "00".to_string(),
                    debit_local: debit,
                    credit_local: credit,
                    debit_foreign: debit,
                    credit_foreign: credit,
                    date: as_of(),
                    source: MovementSource::Journal,
                }
            })
            .collect()
    })
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

fn position(family: &str, natural_sign: BalanceSide, order: i32) -> Position {
    Position {
        report_type: "BGFIS".to_string(),
        family: family.to_string(),
        parent_family: None,
        name: family.to_string(),
        natural_sign,
        display_order: order,
        is_group: false,
    }
}

fn tree() -> PositionTree {
    PositionTree::new(
        "BGFIS",
        vec![
            position("CAJA", BalanceSide::Debit, 1),
            position("BANCOS", BalanceSide::Debit, 2),
            position("UTILIDAD", BalanceSide::Credit, 3),
            position("PERDIDA", BalanceSide::Credit, 4),
        ],
    )
}

fn map(sign: BalanceSide) -> ClassificationMap {
    let direct = DIRECT_ACCOUNTS.iter().map(|(account, family)| AccountClassification {
        account: (*account).to_string(),
        report_type: "BGFIS".to_string(),
        family: (*family).to_string(),
        destination_family: None,
        exception_group: None,
        exception_sign: None,
        natural_balance_side: BalanceSide::Debit,
    });
    let grouped = GROUPED_ACCOUNTS.iter().map(|account| AccountClassification {
        account: (*account).to_string(),
        report_type: "BGFIS".to_string(),
        family: "UTILIDAD".to_string(),
        destination_family: Some("PERDIDA".to_string()),
        exception_group: Some("RESULTADO".to_string()),
        exception_sign: Some(sign),
        natural_balance_side: sign.opposite(),
    });
    ClassificationMap::build(direct.chain(grouped).collect(), &tree()).unwrap()
}

fn set(movements: Vec<Movement>) -> MovementSet {
    MovementSet {
        as_of: as_of(),
        movements,
    }
}

fn net(movements: &[Movement], accounts: &[&str]) -> Decimal {
    movements
        .iter()
        .filter(|m| accounts.contains(&m.account.as_str()))
        .map(Movement::net_local)
        .sum()
}

fn run(
    sign: BalanceSide,
    window: ExceptionTestWindow,
    current: Vec<Movement>,
    prior: Vec<Movement>,
) -> (FamilyLedger, Vec<super::types::GroupResolution>) {
    let map = map(sign);
    let (current, prior) = (set(current), set(prior));
    let ledger = aggregate_direct(&map, &current, &prior);
    aggregate_exceptions(&map, &current, &prior, window, ledger)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Direct family totals equal the sum of their accounts' nets.
    #[test]
    fn prop_direct_amounts_are_conserved(current in movements(), prior in movements()) {
        let map = map(BalanceSide::Credit);
        let ledger = aggregate_direct(&map, &set(current.clone()), &set(prior.clone()));

        let caja = ledger.amounts("CAJA").unwrap_or_default();
        prop_assert_eq!(caja.current.local, net(&current, &["111000", "112000"]));
        prop_assert_eq!(caja.prior.local, net(&prior, &["111000", "112000"]));

        let bancos = ledger.amounts("BANCOS").unwrap_or_default();
        prop_assert_eq!(bancos.current.local, net(&current, &["113000"]));
    }

    /// Exception redirection moves amounts without creating or losing any.
    #[test]
    fn prop_exception_amounts_are_conserved(
        sign in side(),
        window in window(),
        current in movements(),
        prior in movements(),
    ) {
        let (ledger, _) = run(sign, window, current.clone(), prior.clone());

        let all: Vec<&str> = DIRECT_ACCOUNTS
            .iter()
            .map(|(a, _)| *a)
            .chain(GROUPED_ACCOUNTS)
            .collect();
        prop_assert_eq!(ledger.total(Period::Current).local, net(&current, &all));
        prop_assert_eq!(ledger.total(Period::Prior).local, net(&prior, &all));
    }

    /// Every member of a group lands on the same side of the sign test.
    #[test]
    fn prop_groups_are_placed_atomically(
        sign in side(),
        current in movements(),
        prior in movements(),
    ) {
        let (ledger, groups) = run(sign, ExceptionTestWindow::Combined, current.clone(), prior.clone());
        let group_net = net(&current, &GROUPED_ACCOUNTS) + net(&prior, &GROUPED_ACCOUNTS);

        match groups.as_slice() {
            [] => prop_assert!(ledger.amounts("UTILIDAD").is_none() && ledger.amounts("PERDIDA").is_none()),
            [group] => {
                prop_assert_eq!(group.current_placement, resolve_target(sign, group_net));
                let (kept, moved) = match group.current_placement {
                    Placement::Family => ("UTILIDAD", "PERDIDA"),
                    Placement::Destination => ("PERDIDA", "UTILIDAD"),
                };
                prop_assert!(ledger.amounts(kept).is_some());
                prop_assert!(ledger.amounts(moved).is_none());
            }
            _ => prop_assert!(false, "one named group expected, got {}", groups.len()),
        }
    }

    /// The sign test is a pure function of its inputs.
    #[test]
    fn prop_resolve_target_is_deterministic(sign in side(), group_net in signed_amount()) {
        let first = resolve_target(sign, group_net);
        prop_assert_eq!(first, resolve_target(sign, group_net));

        let stays = match sign {
            BalanceSide::Credit => group_net >= Decimal::ZERO,
            BalanceSide::Debit => group_net <= Decimal::ZERO,
        };
        prop_assert_eq!(first == Placement::Family, stays);
    }

    /// One row per leaf, each signed by its position's natural sign.
    #[test]
    fn prop_rows_are_complete_and_signed(
        sign in side(),
        window in window(),
        current in movements(),
        prior in movements(),
    ) {
        let (ledger, _) = run(sign, window, current, prior);
        let tree = tree();
        let rows = materialize(&tree, &ledger);

        prop_assert_eq!(rows.len(), tree.leaves().count());
        for row in &rows {
            let amounts = ledger.amounts(&row.family).unwrap_or_default();
            prop_assert_eq!(row.amount_local, signed(amounts.current.local, row.natural_sign));
            prop_assert_eq!(row.prior_amount_foreign, signed(amounts.prior.foreign, row.natural_sign));
        }
    }
}
