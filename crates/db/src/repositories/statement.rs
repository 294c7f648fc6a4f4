//! Statement repository over the legacy ledger tables.
//!
//! Reads snapshot balances (`saldo`), journal lines (`asiento_de_diario` and
//! `diario`), classifications (`bg_cuentas_det` and `grupo_excepcion_bg`),
//! positions (`posicion_bg`) and the report catalogue of one company schema.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement, Value};
use tracing::debug;

use balanza_core::statement::{
    AccountClassification, AccountingPeriod, BalanceSide, DataAccessError, JournalLine,
    LedgerRepository, Position, ReferenceRepository, ReportScope, ReportTypeInfo, SnapshotBalance,
};

use crate::schema::CompanySchema;

/// Raw-SQL repository for the statement engine.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn query<T: FromQueryResult + Send>(
        &self,
        sql: String,
        values: Vec<Value>,
    ) -> Result<Vec<T>, DataAccessError> {
        T::find_by_statement(Statement::from_sql_and_values(DbBackend::Postgres, sql, values))
            .all(&self.db)
            .await
            .map_err(db_error)
    }
}

fn db_error(e: DbErr) -> DataAccessError {
    DataAccessError::new(e.to_string())
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromQueryResult)]
struct SnapshotRow {
    centro_costo: String,
    cuenta_contable: String,
    fecha: NaiveDate,
    saldo_local: Decimal,
    saldo_dolar: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct JournalRow {
    asiento: String,
    centro_costo: String,
    cuenta_contable: String,
    contabilidad: String,
    fecha: NaiveDate,
    debito_local: Decimal,
    credito_local: Decimal,
    debito_dolar: Decimal,
    credito_dolar: Decimal,
}

#[derive(Debug, FromQueryResult)]
struct ClassificationRow {
    tipo: String,
    cuenta_contable: String,
    familia: String,
    familia_destino: Option<String>,
    grupo_excepcion: Option<String>,
    saldo_excepcion: Option<String>,
    saldo_normal: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct PositionRow {
    tipo: String,
    familia: String,
    familia_padre: Option<String>,
    nombre: String,
    naturaleza: Option<String>,
    orden: i32,
    agrupa: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct ReportTypeRow {
    tipo: String,
    descripcion: String,
    qrp: String,
    display_text: String,
}

#[derive(Debug, FromQueryResult)]
struct PeriodRow {
    descripcion: String,
    contabilidad: String,
    estado: String,
    fecha_final: NaiveDate,
}

// ============================================================================
// Code mappings
// ============================================================================

/// Maps a balance side code: `D` is debit, `A`/`C` are credit.
fn balance_side(code: Option<&str>) -> Option<BalanceSide> {
    match code.map(str::trim) {
        Some("D" | "d") => Some(BalanceSide::Debit),
        Some("A" | "a" | "C" | "c") => Some(BalanceSide::Credit),
        _ => None,
    }
}

/// Maps a position nature code: `P` (liability side) is credit.
fn natural_sign(code: Option<&str>) -> BalanceSide {
    match code.map(str::trim) {
        Some("P" | "p") => BalanceSide::Credit,
        _ => BalanceSide::Debit,
    }
}

/// Maps an account's normal balance code: only `D` is debit-natural.
fn natural_balance_side(code: Option<&str>) -> BalanceSide {
    match balance_side(code) {
        Some(BalanceSide::Debit) => BalanceSide::Debit,
        _ => BalanceSide::Credit,
    }
}

/// Only positions flagged `N` are leaves.
fn is_group(code: Option<&str>) -> bool {
    !matches!(code.map(str::trim), Some("N" | "n"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<SnapshotRow> for SnapshotBalance {
    fn from(row: SnapshotRow) -> Self {
        Self {
            cost_center: row.centro_costo,
            account: row.cuenta_contable,
            date: row.fecha,
            balance_local: row.saldo_local,
            balance_foreign: row.saldo_dolar,
        }
    }
}

impl From<JournalRow> for JournalLine {
    fn from(row: JournalRow) -> Self {
        Self {
            entry: row.asiento,
            cost_center: row.centro_costo,
            account: row.cuenta_contable,
            book: row.contabilidad,
            date: row.fecha,
            debit_local: row.debito_local,
            credit_local: row.credito_local,
            debit_foreign: row.debito_dolar,
            credit_foreign: row.credito_dolar,
        }
    }
}

impl From<ClassificationRow> for AccountClassification {
    fn from(row: ClassificationRow) -> Self {
        Self {
            account: row.cuenta_contable,
            report_type: row.tipo,
            family: row.familia,
            destination_family: non_blank(row.familia_destino),
            exception_group: non_blank(row.grupo_excepcion),
            exception_sign: balance_side(row.saldo_excepcion.as_deref()),
            natural_balance_side: natural_balance_side(row.saldo_normal.as_deref()),
        }
    }
}

impl From<PositionRow> for Position {
    fn from(row: PositionRow) -> Self {
        Self {
            report_type: row.tipo,
            family: row.familia,
            parent_family: non_blank(row.familia_padre),
            name: row.nombre,
            natural_sign: natural_sign(row.naturaleza.as_deref()),
            display_order: row.orden,
            is_group: is_group(row.agrupa.as_deref()),
        }
    }
}

// ============================================================================
// SQL
// ============================================================================

fn snapshot_sql(schema: &CompanySchema) -> String {
    format!(
        "SELECT DISTINCT ON (s.centro_costo, s.cuenta_contable) \
                s.centro_costo, s.cuenta_contable, CAST(s.fecha AS date) AS fecha, \
                COALESCE(s.saldo_fisc_local, 0) AS saldo_local, \
                COALESCE(s.saldo_fisc_dolar, 0) AS saldo_dolar \
         FROM {saldo} s \
         WHERE CAST(s.fecha AS date) <= $1 \
         ORDER BY s.centro_costo, s.cuenta_contable, s.fecha DESC",
        saldo = schema.table("saldo"),
    )
}

fn journal_sql(schema: &CompanySchema, books: usize) -> String {
    let placeholders = (0..books)
        .map(|i| format!("${}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT am.asiento, m.centro_costo, m.cuenta_contable, am.contabilidad, \
                CAST(am.fecha AS date) AS fecha, \
                COALESCE(m.debito_local, 0) AS debito_local, \
                COALESCE(m.credito_local, 0) AS credito_local, \
                COALESCE(m.debito_dolar, 0) AS debito_dolar, \
                COALESCE(m.credito_dolar, 0) AS credito_dolar \
         FROM {asiento} am \
         INNER JOIN {diario} m ON am.asiento = m.asiento \
         WHERE CAST(am.fecha AS date) <= $1 AND am.contabilidad IN ({placeholders})",
        asiento = schema.table("asiento_de_diario"),
        diario = schema.table("diario"),
    )
}

fn classification_sql(schema: &CompanySchema) -> String {
    format!(
        "SELECT b.tipo, b.cuenta_contable, b.familia, b.familia_destino, b.grupo_excepcion, \
                g.saldo_excepcion, b.saldo_normal \
         FROM {det} b \
         LEFT OUTER JOIN {grupo} g ON g.grupo_excepcion = b.grupo_excepcion \
         WHERE b.tipo = $1 \
         ORDER BY b.cuenta_contable",
        det = schema.table("bg_cuentas_det"),
        grupo = schema.table("grupo_excepcion_bg"),
    )
}

fn position_sql(schema: &CompanySchema) -> String {
    format!(
        "SELECT p.tipo, p.familia, p.familia_padre, p.nombre, p.naturaleza, \
                CAST(COALESCE(p.orden, 0) AS integer) AS orden, p.agrupa \
         FROM {posicion} p \
         WHERE p.tipo = $1 \
         ORDER BY p.orden, p.familia",
        posicion = schema.table("posicion_bg"),
    )
}

fn report_type_sql(schema: &CompanySchema) -> String {
    format!(
        "SELECT t.tipo, t.descripcion, t.qrp, \
                UPPER(t.tipo) || ' ' || t.descripcion || ' ' || t.qrp AS display_text \
         FROM {tipo} t \
         INNER JOIN {usuario} u ON t.tipo = u.tipo AND u.usuario = $1 \
         WHERE t.tipo NOT LIKE '301%' OR t.tipo = '301' \
         ORDER BY display_text",
        tipo = schema.table("tipo_balance"),
        usuario = schema.table("usuario_balance"),
    )
}

fn period_sql(schema: &CompanySchema) -> String {
    format!(
        "SELECT descripcion, contabilidad, estado, CAST(fecha_final AS date) AS fecha_final \
         FROM {periodo} \
         WHERE CAST(fecha_final AS date) = $1 AND contabilidad = 'F'",
        periodo = schema.table("periodo_contable"),
    )
}

// ============================================================================
// Trait implementations
// ============================================================================

impl LedgerRepository for StatementRepository {
    async fn snapshot_balances(
        &self,
        scope: &ReportScope,
        as_of: NaiveDate,
    ) -> Result<Vec<SnapshotBalance>, DataAccessError> {
        let schema = CompanySchema::parse(&scope.company)?;
        let rows: Vec<SnapshotRow> = self.query(snapshot_sql(&schema), vec![as_of.into()]).await?;

        debug!(%schema, %as_of, rows = rows.len(), "Loaded snapshot balances");
        Ok(rows.into_iter().map(SnapshotBalance::from).collect())
    }

    async fn journal_lines(
        &self,
        scope: &ReportScope,
        as_of: NaiveDate,
    ) -> Result<Vec<JournalLine>, DataAccessError> {
        let schema = CompanySchema::parse(&scope.company)?;
        if scope.books.is_empty() {
            return Ok(Vec::new());
        }

        let mut values: Vec<Value> = Vec::with_capacity(scope.books.len() + 1);
        values.push(as_of.into());
        values.extend(scope.books.iter().map(|book| Value::from(book.clone())));

        let rows: Vec<JournalRow> = self
            .query(journal_sql(&schema, scope.books.len()), values)
            .await?;

        debug!(%schema, %as_of, rows = rows.len(), "Loaded journal lines");
        Ok(rows.into_iter().map(JournalLine::from).collect())
    }
}

impl ReferenceRepository for StatementRepository {
    async fn classifications(
        &self,
        company: &str,
        report_type: &str,
    ) -> Result<Vec<AccountClassification>, DataAccessError> {
        let schema = CompanySchema::parse(company)?;
        let rows: Vec<ClassificationRow> = self
            .query(classification_sql(&schema), vec![report_type.into()])
            .await?;
        Ok(rows.into_iter().map(AccountClassification::from).collect())
    }

    async fn positions(
        &self,
        company: &str,
        report_type: &str,
    ) -> Result<Vec<Position>, DataAccessError> {
        let schema = CompanySchema::parse(company)?;
        let rows: Vec<PositionRow> = self
            .query(position_sql(&schema), vec![report_type.into()])
            .await?;
        Ok(rows.into_iter().map(Position::from).collect())
    }

    async fn report_types(
        &self,
        company: &str,
        owner: &str,
    ) -> Result<Vec<ReportTypeInfo>, DataAccessError> {
        let schema = CompanySchema::parse(company)?;
        let rows: Vec<ReportTypeRow> = self
            .query(report_type_sql(&schema), vec![owner.into()])
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| ReportTypeInfo {
                report_type: row.tipo,
                description: row.descripcion,
                qrp: row.qrp,
                display_text: row.display_text,
            })
            .collect())
    }

    async fn accounting_periods(
        &self,
        company: &str,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountingPeriod>, DataAccessError> {
        let schema = CompanySchema::parse(company)?;
        let rows: Vec<PeriodRow> = self.query(period_sql(&schema), vec![end_date.into()]).await?;
        Ok(rows
            .into_iter()
            .map(|row| AccountingPeriod {
                description: row.descripcion,
                book: row.contabilidad,
                status: row.estado,
                end_date: row.fecha_final,
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "statement_tests.rs"]
mod tests;
