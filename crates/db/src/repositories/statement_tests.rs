//! Tests for the statement repository against a mock connection.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn row(columns: Vec<(&'static str, Value)>) -> BTreeMap<&'static str, Value> {
    columns.into_iter().collect()
}

fn mock(rows: Vec<BTreeMap<&'static str, Value>>) -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([rows])
        .into_connection()
}

fn scope() -> ReportScope {
    ReportScope::new("acme", "BGFIS", vec!["F".to_string(), "A".to_string()])
}

fn transaction_log(db: DatabaseConnection) -> String {
    format!("{:?}", db.into_transaction_log())
}

#[tokio::test]
async fn test_snapshot_balances_map_rows() {
    let db = mock(vec![row(vec![
        ("centro_costo", "00".into()),
        ("cuenta_contable", "411010".into()),
        ("fecha", date(2024, 11, 30).into()),
        ("saldo_local", dec!(-300).into()),
        ("saldo_dolar", dec!(75).into()),
    ])]);
    let repo = StatementRepository::new(db.clone());

    let balances = repo.snapshot_balances(&scope(), date(2024, 12, 31)).await.unwrap();

    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].account, "411010");
    assert_eq!(balances[0].balance_local, dec!(-300));
    assert_eq!(balances[0].balance_foreign, dec!(75));

    let log = transaction_log(db);
    assert!(log.contains("acme.saldo"));
    assert!(log.contains("DISTINCT ON"));
}

#[tokio::test]
async fn test_journal_lines_bind_every_book() {
    let db = mock(vec![row(vec![
        ("asiento", "AS-0001".into()),
        ("centro_costo", "00".into()),
        ("cuenta_contable", "411010".into()),
        ("contabilidad", "F".into()),
        ("fecha", date(2024, 12, 15).into()),
        ("debito_local", dec!(100).into()),
        ("credito_local", dec!(0).into()),
        ("debito_dolar", dec!(25).into()),
        ("credito_dolar", dec!(0).into()),
    ])]);
    let repo = StatementRepository::new(db.clone());

    let lines = repo.journal_lines(&scope(), date(2024, 12, 31)).await.unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].book, "F");
    assert_eq!(lines[0].debit_foreign, dec!(25));

    let log = transaction_log(db);
    assert!(log.contains("IN ($2, $3)"));
    assert!(log.contains("acme.asiento_de_diario"));
}

#[tokio::test]
async fn test_journal_lines_without_books_skip_the_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = StatementRepository::new(db);
    let scope = ReportScope::new("acme", "BGFIS", vec![]);

    let lines = repo.journal_lines(&scope, date(2024, 12, 31)).await.unwrap();
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_classifications_map_codes() {
    let db = mock(vec![
        row(vec![
            ("tipo", "BGFIS".into()),
            ("cuenta_contable", "411010".into()),
            ("familia", "CAJA".into()),
            ("familia_destino", Value::String(None)),
            ("grupo_excepcion", Value::String(None)),
            ("saldo_excepcion", Value::String(None)),
            ("saldo_normal", "D".into()),
        ]),
        row(vec![
            ("tipo", "BGFIS".into()),
            ("cuenta_contable", "591000".into()),
            ("familia", "UTILIDAD".into()),
            ("familia_destino", "PERDIDA".into()),
            ("grupo_excepcion", "RESULTADO".into()),
            ("saldo_excepcion", "A".into()),
            ("saldo_normal", "D".into()),
        ]),
        row(vec![
            ("tipo", "BGFIS".into()),
            ("cuenta_contable", "592000".into()),
            ("familia", "UTILIDAD".into()),
            ("familia_destino", "PERDIDA".into()),
            ("grupo_excepcion", " ".into()),
            ("saldo_excepcion", Value::String(None)),
            ("saldo_normal", "A".into()),
        ]),
    ]);
    let repo = StatementRepository::new(db);

    let classifications = repo.classifications("acme", "BGFIS").await.unwrap();

    assert!(!classifications[0].is_exception());
    assert_eq!(classifications[0].natural_balance_side, BalanceSide::Debit);

    assert_eq!(classifications[1].exception_sign, Some(BalanceSide::Credit));
    assert_eq!(classifications[1].exception_group.as_deref(), Some("RESULTADO"));

    assert_eq!(classifications[2].exception_group, None);
    assert_eq!(classifications[2].natural_balance_side, BalanceSide::Credit);
    assert_eq!(classifications[2].effective_exception_sign(), BalanceSide::Debit);
}

#[tokio::test]
async fn test_missing_normal_balance_is_credit_natural() {
    let db = mock(vec![row(vec![
        ("tipo", "BGFIS".into()),
        ("cuenta_contable", "593000".into()),
        ("familia", "UTILIDAD".into()),
        ("familia_destino", "PERDIDA".into()),
        ("grupo_excepcion", "RESULTADO".into()),
        ("saldo_excepcion", Value::String(None)),
        ("saldo_normal", Value::String(None)),
    ])]);
    let repo = StatementRepository::new(db);

    let classifications = repo.classifications("acme", "BGFIS").await.unwrap();

    assert_eq!(classifications[0].natural_balance_side, BalanceSide::Credit);
    assert_eq!(classifications[0].effective_exception_sign(), BalanceSide::Debit);
}

#[tokio::test]
async fn test_positions_map_nature_and_grouping() {
    let db = mock(vec![
        row(vec![
            ("tipo", "BGFIS".into()),
            ("familia", "PASIVO".into()),
            ("familia_padre", Value::String(None)),
            ("nombre", "Pasivo".into()),
            ("naturaleza", "P".into()),
            ("orden", 20i32.into()),
            ("agrupa", "S".into()),
        ]),
        row(vec![
            ("tipo", "BGFIS".into()),
            ("familia", "CAJA".into()),
            ("familia_padre", "ACTIVO".into()),
            ("nombre", "Caja".into()),
            ("naturaleza", "A".into()),
            ("orden", 11i32.into()),
            ("agrupa", "N".into()),
        ]),
        row(vec![
            ("tipo", "BGFIS".into()),
            ("familia", "SIN_MARCA".into()),
            ("familia_padre", "ACTIVO".into()),
            ("nombre", "Sin marca".into()),
            ("naturaleza", Value::String(None)),
            ("orden", 12i32.into()),
            ("agrupa", Value::String(None)),
        ]),
    ]);
    let repo = StatementRepository::new(db);

    let positions = repo.positions("acme", "BGFIS").await.unwrap();
    assert!(positions[2].is_group);

    assert_eq!(positions[0].natural_sign, BalanceSide::Credit);
    assert!(positions[0].is_group);
    assert_eq!(positions[0].parent_family, None);
    assert_eq!(positions[1].natural_sign, BalanceSide::Debit);
    assert!(!positions[1].is_group);
    assert_eq!(positions[1].display_order, 11);
}

#[tokio::test]
async fn test_report_types_and_periods() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![row(vec![
            ("tipo", "bgfis".into()),
            ("descripcion", "Fiscal".into()),
            ("qrp", "Q1".into()),
            ("display_text", "BGFIS Fiscal Q1".into()),
        ])]])
        .append_query_results([vec![row(vec![
            ("descripcion", "Diciembre 2024".into()),
            ("contabilidad", "F".into()),
            ("estado", "A".into()),
            ("fecha_final", date(2024, 12, 31).into()),
        ])]])
        .into_connection();
    let repo = StatementRepository::new(db);

    let types = repo.report_types("acme", "ANA").await.unwrap();
    assert_eq!(types[0].display_text, "BGFIS Fiscal Q1");

    let periods = repo.accounting_periods("acme", date(2024, 12, 31)).await.unwrap();
    assert_eq!(periods[0].book, "F");
    assert_eq!(periods[0].end_date, date(2024, 12, 31));
}

#[tokio::test]
async fn test_invalid_company_is_rejected_before_querying() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let repo = StatementRepository::new(db);

    let result = repo.positions("acme; drop table saldo", "BGFIS").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_driver_errors_become_data_access_errors() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection reset".to_string())])
        .into_connection();
    let repo = StatementRepository::new(db);

    let err = repo.classifications("acme", "BGFIS").await.unwrap_err();
    assert!(err.message.contains("connection reset"));
}
