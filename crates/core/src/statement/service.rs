//! Statement generation service.

use std::sync::Arc;

use balanza_shared::{ExceptionTestWindow, StatementConfig};
use balanza_shared::types::{GenerationId, PageRequest, PageResponse};
use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::aggregation::{aggregate_direct, aggregate_exceptions};
use super::classification::ClassificationMap;
use super::error::StatementError;
use super::materializer::{PositionTree, materialize};
use super::period::{ComparisonPeriods, collect_both};
use super::repository::{LedgerRepository, ReferenceRepository, StatementRenderer};
use super::types::{
    AccountingPeriod, ExportFormat, FamilyBalance, GenerateRequest, GenerationState,
    GenerationSummary, PositionResult, ReportScope, ReportTypeInfo, is_schema_identifier,
};
use super::workspace::{MaterializedStatement, WorkspaceKey, WorkspaceSlot, WorkspaceStore};

/// Report façade: runs the pipeline and serves its output per owner.
pub struct StatementService<L, R, X> {
    ledger: Arc<L>,
    reference: Arc<R>,
    renderer: Arc<X>,
    config: StatementConfig,
    workspace: WorkspaceStore,
}

impl<L, R, X> StatementService<L, R, X>
where
    L: LedgerRepository + 'static,
    R: ReferenceRepository + 'static,
    X: StatementRenderer,
{
    /// Creates a service with an empty workspace.
    #[must_use]
    pub fn new(ledger: Arc<L>, reference: Arc<R>, renderer: Arc<X>, config: StatementConfig) -> Self {
        Self {
            ledger,
            reference,
            renderer,
            config,
            workspace: WorkspaceStore::new(),
        }
    }

    /// Ledger repository in use.
    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Renderer in use.
    #[must_use]
    pub fn renderer(&self) -> &X {
        &self.renderer
    }

    /// Statement settings in effect.
    #[must_use]
    pub const fn config(&self) -> &StatementConfig {
        &self.config
    }

    /// Generates the statement for the request's owner, replacing whatever
    /// that owner's workspace held.
    ///
    /// # Errors
    ///
    /// Returns a validation error before the workspace is touched, or a
    /// reference/data access error after which the slot is `Failed` and holds
    /// no result.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerationSummary, StatementError> {
        Ok(self.generate_statement(request).await?.summary())
    }

    /// Reads one page of the owner's materialized rows.
    ///
    /// Returns an empty page when nothing has been materialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the report type or owner is missing.
    pub async fn fetch_page(
        &self,
        scope: &ReportScope,
        owner: &str,
        page: PageRequest,
    ) -> Result<PageResponse<PositionResult>, StatementError> {
        validate_target(scope, owner)?;

        let Some(slot) = self.workspace.get(&WorkspaceKey::new(scope, owner)) else {
            return Ok(PageResponse::empty(&page));
        };

        let guard = slot.lock().await;
        let Some(statement) = guard.as_ref() else {
            return Ok(PageResponse::empty(&page));
        };

        let rows = page.window(&statement.rows).to_vec();
        let total = u64::try_from(statement.rows.len()).unwrap_or(u64::MAX);
        let response = PageResponse::new(rows, page.page, page.per_page, total);
        slot.set_state(GenerationState::Served);
        Ok(response)
    }

    /// Unsigned family totals behind the owner's materialized rows.
    ///
    /// Empty when nothing has been materialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the report type or owner is missing.
    pub async fn family_balances(
        &self,
        scope: &ReportScope,
        owner: &str,
    ) -> Result<Vec<FamilyBalance>, StatementError> {
        validate_target(scope, owner)?;

        let Some(slot) = self.workspace.get(&WorkspaceKey::new(scope, owner)) else {
            return Ok(Vec::new());
        };
        let guard = slot.lock().await;
        Ok(guard
            .as_ref()
            .map(|statement| statement.balances.clone())
            .unwrap_or_default())
    }

    /// Regenerates and renders the statement as a spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns any generation error, or a render error.
    pub async fn export_excel(&self, request: GenerateRequest) -> Result<Vec<u8>, StatementError> {
        self.export(request, ExportFormat::Excel).await
    }

    /// Regenerates and renders the statement as a PDF document.
    ///
    /// # Errors
    ///
    /// Returns any generation error, or a render error.
    pub async fn export_pdf(&self, request: GenerateRequest) -> Result<Vec<u8>, StatementError> {
        self.export(request, ExportFormat::Pdf).await
    }

    /// Balance types `owner` may generate, ordered by display text.
    ///
    /// Variants of type `301` are hidden except `301` itself.
    ///
    /// # Errors
    ///
    /// Returns a validation or data access error.
    pub async fn report_types(
        &self,
        company: &str,
        owner: &str,
    ) -> Result<Vec<ReportTypeInfo>, StatementError> {
        validate_company(company)?;
        if owner.trim().is_empty() {
            return Err(StatementError::MissingOwner);
        }

        let types = self
            .reference
            .report_types(company, owner)
            .await
            .map_err(|e| StatementError::data_access(GenerationState::Pending, e))?;

        Ok(visible_report_types(types))
    }

    /// Fiscal periods ending on `end_date`.
    ///
    /// # Errors
    ///
    /// Returns a validation or data access error.
    pub async fn accounting_periods(
        &self,
        company: &str,
        end_date: NaiveDate,
    ) -> Result<Vec<AccountingPeriod>, StatementError> {
        validate_company(company)?;
        self.reference
            .accounting_periods(company, end_date)
            .await
            .map_err(|e| StatementError::data_access(GenerationState::Pending, e))
    }

    /// Generation state of the owner's slot.
    #[must_use]
    pub fn state(&self, scope: &ReportScope, owner: &str) -> GenerationState {
        self.workspace
            .get(&WorkspaceKey::new(scope, owner))
            .map_or(GenerationState::Pending, |slot| slot.state())
    }

    /// Receiver observing every state transition of the owner's slot.
    #[must_use]
    pub fn watch_state(&self, scope: &ReportScope, owner: &str) -> watch::Receiver<GenerationState> {
        self.workspace.slot(&WorkspaceKey::new(scope, owner)).subscribe()
    }

    async fn export(
        &self,
        request: GenerateRequest,
        format: ExportFormat,
    ) -> Result<Vec<u8>, StatementError> {
        let statement = self.generate_statement(request).await?;
        let bytes = self.renderer.render(format, &statement.document())?;
        info!(
            generation_id = %statement.generation_id,
            owner = %statement.owner,
            report_type = %statement.scope.report_type,
            ?format,
            bytes = bytes.len(),
            "Exported statement"
        );
        Ok(bytes)
    }

    async fn generate_statement(
        &self,
        request: GenerateRequest,
    ) -> Result<Arc<MaterializedStatement>, StatementError> {
        let request = self.normalize(request)?;
        let periods = ComparisonPeriods::resolve(
            request.as_of,
            request.comparison_date,
            self.config.comparison,
        )?;

        let slot = self.workspace.slot(&WorkspaceKey::new(&request.scope, &request.owner));
        let generation = Generation {
            ledger: Arc::clone(&self.ledger),
            reference: Arc::clone(&self.reference),
            exception_test: self.config.exception_test,
            slot: Arc::clone(&slot),
            request,
            periods,
        };

        // Detached from the caller: dropping this future leaves the task running.
        match tokio::spawn(generation.execute()).await {
            Ok(result) => result,
            Err(e) => {
                slot.set_state(GenerationState::Failed);
                error!(error = %e, "Statement generation task aborted");
                Err(StatementError::Aborted(e.to_string()))
            }
        }
    }

    /// Validates the request and fills in the default books.
    fn normalize(&self, mut request: GenerateRequest) -> Result<GenerateRequest, StatementError> {
        validate_target(&request.scope, &request.owner)?;

        if request.scope.books.is_empty() {
            request.scope.books.clone_from(&self.config.default_books);
        }
        if request.scope.books.iter().any(|b| b.trim().is_empty()) {
            return Err(StatementError::BlankBook);
        }

        Ok(request)
    }
}

/// One generation run, owning everything it needs to finish on its own.
struct Generation<L, R> {
    ledger: Arc<L>,
    reference: Arc<R>,
    exception_test: ExceptionTestWindow,
    slot: Arc<WorkspaceSlot>,
    request: GenerateRequest,
    periods: ComparisonPeriods,
}

impl<L, R> Generation<L, R>
where
    L: LedgerRepository,
    R: ReferenceRepository,
{
    /// Clears the slot, runs the pipeline and stores the outcome.
    async fn execute(self) -> Result<Arc<MaterializedStatement>, StatementError> {
        let mut guard = self.slot.lock_owned().await;
        if guard.take().is_some() {
            self.slot.set_state(GenerationState::Invalidated);
        }
        self.slot.set_state(GenerationState::Pending);

        let generation_id = GenerationId::new();
        let request = &self.request;
        info!(
            %generation_id,
            owner = %request.owner,
            report_type = %request.scope.report_type,
            as_of = %self.periods.as_of,
            prior_as_of = %self.periods.prior_as_of,
            "Generating statement"
        );

        match self.run(generation_id).await {
            Ok(statement) => {
                let statement = Arc::new(statement);
                *guard = Some(Arc::clone(&statement));
                self.slot.set_state(GenerationState::Materialized);
                info!(
                    %generation_id,
                    owner = %request.owner,
                    report_type = %request.scope.report_type,
                    rows = statement.rows.len(),
                    groups = statement.groups.len(),
                    "Statement materialized"
                );
                Ok(statement)
            }
            Err(e) => {
                let stage = self.slot.state();
                self.slot.set_state(GenerationState::Failed);
                error!(
                    %generation_id,
                    %stage,
                    owner = %request.owner,
                    report_type = %request.scope.report_type,
                    error = %e,
                    "Statement generation failed"
                );
                Err(e)
            }
        }
    }

    async fn run(&self, generation_id: GenerationId) -> Result<MaterializedStatement, StatementError> {
        let request = &self.request;
        let scope = &request.scope;
        let periods = self.periods;

        enter(&self.slot, GenerationState::Collecting, generation_id);
        let (classifications, positions) = tokio::try_join!(
            self.reference.classifications(&scope.company, &scope.report_type),
            self.reference.positions(&scope.company, &scope.report_type),
        )
        .map_err(|e| StatementError::data_access(GenerationState::Collecting, e))?;

        let tree = PositionTree::new(&scope.report_type, positions);
        let map = ClassificationMap::build(classifications, &tree)?;
        let (current, prior) = collect_both(self.ledger.as_ref(), scope, periods).await?;

        enter(&self.slot, GenerationState::AggregatingDirect, generation_id);
        let ledger = aggregate_direct(&map, &current, &prior);

        enter(&self.slot, GenerationState::AggregatingExceptions, generation_id);
        let (ledger, groups) =
            aggregate_exceptions(&map, &current, &prior, self.exception_test, ledger);

        let rows = materialize(&tree, &ledger);

        Ok(MaterializedStatement {
            generation_id,
            scope: scope.clone(),
            owner: request.owner.clone(),
            as_of: periods.as_of,
            prior_as_of: periods.prior_as_of,
            current_movements: current.len(),
            prior_movements: prior.len(),
            balances: ledger.to_balances(&request.owner),
            groups,
            rows,
        })
    }
}

fn enter(slot: &WorkspaceSlot, stage: GenerationState, generation_id: GenerationId) {
    slot.set_state(stage);
    debug!(%generation_id, %stage, "Entering stage");
}

fn validate_company(company: &str) -> Result<(), StatementError> {
    if is_schema_identifier(company) {
        Ok(())
    } else {
        Err(StatementError::InvalidCompany(company.to_string()))
    }
}

fn validate_target(scope: &ReportScope, owner: &str) -> Result<(), StatementError> {
    validate_company(&scope.company)?;
    if scope.report_type.trim().is_empty() {
        return Err(StatementError::MissingReportType);
    }
    if owner.trim().is_empty() {
        return Err(StatementError::MissingOwner);
    }
    Ok(())
}

/// Hides `301` variants other than `301` and orders by display text.
#[must_use]
pub fn visible_report_types(types: Vec<ReportTypeInfo>) -> Vec<ReportTypeInfo> {
    let mut visible: Vec<ReportTypeInfo> = types
        .into_iter()
        .filter(|t| t.report_type == "301" || !t.report_type.starts_with("301"))
        .collect();
    visible.sort_by(|a, b| a.display_text.cmp(&b.display_text));
    visible
}
