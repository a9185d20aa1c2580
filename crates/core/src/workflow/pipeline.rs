//! Running the parts one at a time or all in order.

use std::time::Instant;

use altoro_domain::constants::{SHEET_ACCOUNT_SUMMARY, SHEET_FILTERED_TRANSACTIONS};
use altoro_domain::{Product, Result};
use tracing::{error, info, instrument};

use super::{
    accounts, api_validation, login, products, transactions, transfer, ApiValidation,
    LoginReport, Part, TransactionsReport, TransferReport, WorkflowContext,
};
use crate::pages::AccountsSnapshot;

/// What a single part produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartOutcome {
    Login(LoginReport),
    Accounts(AccountsSnapshot),
    Transactions(TransactionsReport),
    Transfer(TransferReport),
    Products(Vec<Product>),
    ApiValidation(ApiValidation),
}

/// Results of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub login: LoginReport,
    pub accounts: AccountsSnapshot,
    pub transactions: TransactionsReport,
    pub transfer: TransferReport,
    pub products: Vec<Product>,
    pub api_validation: ApiValidation,
}

async fn api_validation_from_sink(ctx: &WorkflowContext) -> Result<ApiValidation> {
    let sink = ctx.sink();
    let web_accounts = sink.read_table(SHEET_ACCOUNT_SUMMARY).await?;
    let web_transactions = sink.read_table(SHEET_FILTERED_TRANSACTIONS).await?;
    api_validation::run(ctx, web_accounts.as_ref(), web_transactions.as_ref()).await
}

async fn dispatch(ctx: &WorkflowContext, part: Part) -> Result<PartOutcome> {
    Ok(match part {
        Part::Login => PartOutcome::Login(login::run(ctx).await?),
        Part::Accounts => PartOutcome::Accounts(accounts::run(ctx).await?),
        Part::Transactions => PartOutcome::Transactions(transactions::run(ctx).await?),
        Part::Transfer => PartOutcome::Transfer(transfer::run(ctx).await?),
        Part::Products => PartOutcome::Products(products::run(ctx).await?),
        Part::ApiValidation => PartOutcome::ApiValidation(api_validation_from_sink(ctx).await?),
    })
}

/// Run one part. Part 6 compares against whatever web sheets the sink
/// already holds.
///
/// # Errors
/// Whatever the part fails with.
#[instrument(skip(ctx), fields(part = %part))]
pub async fn run_part(ctx: &WorkflowContext, part: Part) -> Result<PartOutcome> {
    let started = Instant::now();
    info!(number = part.number(), "part started");
    match dispatch(ctx, part).await {
        Ok(outcome) => {
            info!(elapsed_ms = started.elapsed().as_millis(), "part completed");
            Ok(outcome)
        }
        Err(e) => {
            error!(error = %e, elapsed_ms = started.elapsed().as_millis(), "part failed");
            Err(e)
        }
    }
}

/// Run parts 1 to 6 in order, stopping at the first failure.
///
/// # Errors
/// The first part failure.
#[instrument(skip(ctx))]
pub async fn run_all(ctx: &WorkflowContext) -> Result<PipelineReport> {
    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(Part::ALL.len());
    for part in Part::ALL {
        outcomes.push(run_part(ctx, part).await?);
    }
    let report = collect(outcomes)?;
    info!(elapsed_ms = started.elapsed().as_millis(), "all parts completed");
    Ok(report)
}

fn collect(outcomes: Vec<PartOutcome>) -> Result<PipelineReport> {
    let (mut login, mut accounts, mut transactions) = (None, None, None);
    let (mut transfer, mut products, mut api_validation) = (None, None, None);
    for outcome in outcomes {
        match outcome {
            PartOutcome::Login(r) => login = Some(r),
            PartOutcome::Accounts(r) => accounts = Some(r),
            PartOutcome::Transactions(r) => transactions = Some(r),
            PartOutcome::Transfer(r) => transfer = Some(r),
            PartOutcome::Products(r) => products = Some(r),
            PartOutcome::ApiValidation(r) => api_validation = Some(r),
        }
    }
    let missing = |part: Part| {
        altoro_domain::AltoroError::Internal(format!("part {part} produced no outcome"))
    };
    Ok(PipelineReport {
        login: login.ok_or_else(|| missing(Part::Login))?,
        accounts: accounts.ok_or_else(|| missing(Part::Accounts))?,
        transactions: transactions.ok_or_else(|| missing(Part::Transactions))?,
        transfer: transfer.ok_or_else(|| missing(Part::Transfer))?,
        products: products.ok_or_else(|| missing(Part::Products))?,
        api_validation: api_validation.ok_or_else(|| missing(Part::ApiValidation))?,
    })
}
