use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    aggregation::compute_budget_spent,
    app_state::lock_connection,
    budget::{
        Budget, BudgetId, BudgetPeriod, BudgetUpdate, NewBudget, create_budget, delete_budget,
        get_budget, get_budgets, update_budget,
    },
    date_range::parse_date,
    transaction::{Transaction, TransactionFilter, TransactionType, get_transactions},
    user::UserID,
};

/// The state needed to manage budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A budget along with how much has been spent against it so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUsage {
    /// The stored budget.
    #[serde(flatten)]
    pub budget: Budget,
    /// The total of the matching expenses, derived from the ledger.
    pub spent: Decimal,
}

impl BudgetUsage {
    fn new(budget: Budget, transactions: &[Transaction]) -> Self {
        let spent = compute_budget_spent(&budget, transactions);
        Self { budget, spent }
    }
}

/// The request body for creating a budget.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetForm {
    category: String,
    amount: Decimal,
    period: String,
    start_date: String,
    end_date: String,
}

/// The request body for editing a budget. Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBudgetForm {
    category: Option<String>,
    amount: Option<Decimal>,
    period: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

/// A route handler for listing the current user's budgets with their spending.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    user_id: UserID,
) -> Result<Json<Vec<BudgetUsage>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let budgets = get_budgets(user_id, &connection)?;
    let expenses = get_expenses(user_id, &connection)?;

    Ok(Json(
        budgets
            .into_iter()
            .map(|budget| BudgetUsage::new(budget, &expenses))
            .collect(),
    ))
}

/// A route handler for getting a single budget with its spending.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    user_id: UserID,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<BudgetUsage>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let budget = get_budget(budget_id, user_id, &connection)?;

    with_usage(budget, &connection).map(Json)
}

/// A route handler for creating a budget.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    user_id: UserID,
    Json(form): Json<CreateBudgetForm>,
) -> Result<Response, Error> {
    let new_budget = NewBudget {
        category: form.category,
        amount: form.amount,
        period: form.period.parse()?,
        start_date: parse_date(&form.start_date)?,
        end_date: parse_date(&form.end_date)?,
    };

    let connection = lock_connection(&state.db_connection)?;
    let budget = create_budget(user_id, new_budget, &connection)?;
    let usage = with_usage(budget, &connection)?;

    Ok((StatusCode::CREATED, Json(usage)).into_response())
}

/// A route handler for changing some or all fields of a budget.
pub async fn edit_budget_endpoint(
    State(state): State<BudgetState>,
    user_id: UserID,
    Path(budget_id): Path<BudgetId>,
    Json(form): Json<EditBudgetForm>,
) -> Result<Json<BudgetUsage>, Error> {
    let update = BudgetUpdate {
        category: form.category,
        amount: form.amount,
        period: form
            .period
            .as_deref()
            .map(str::parse::<BudgetPeriod>)
            .transpose()?,
        start_date: form.start_date.as_deref().map(parse_date).transpose()?,
        end_date: form.end_date.as_deref().map(parse_date).transpose()?,
    };

    let connection = lock_connection(&state.db_connection)?;
    let budget = update_budget(budget_id, user_id, update, &connection)?;

    with_usage(budget, &connection).map(Json)
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    user_id: UserID,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_budget(budget_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Budget deleted successfully" })))
}

fn get_expenses(user_id: UserID, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    let filter = TransactionFilter {
        transaction_type: Some(TransactionType::Expense),
        ..Default::default()
    };

    get_transactions(user_id, &filter, connection)
}

fn with_usage(budget: Budget, connection: &Connection) -> Result<BudgetUsage, Error> {
    let expenses = get_expenses(budget.user_id, connection)?;

    Ok(BudgetUsage::new(budget, &expenses))
}
