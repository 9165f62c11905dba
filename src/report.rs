//! Route handlers for the dashboard and the category and period reports.
//!
//! Each handler fetches a snapshot of the user's ledger once and summarises
//! it with the functions in [crate::aggregation].

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, DateRange, Error,
    aggregation::{
        CategorySummary, DashboardSummary, GroupBy, PeriodSummary, compute_by_category,
        compute_by_period, compute_dashboard, total_amount,
    },
    app_state::lock_connection,
    ledger::TransactionLedger,
    transaction::{TransactionFilter, TransactionType},
    user::UserID,
};

/// The state needed to build reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string parameters shared by the report endpoints.
///
/// Not every report uses every parameter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(rename = "type")]
    transaction_type: Option<String>,
    group_by: Option<String>,
}

impl ReportParams {
    fn date_range(&self) -> Result<DateRange, Error> {
        DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())
    }

    fn transaction_type(&self) -> Result<Option<TransactionType>, Error> {
        non_blank(self.transaction_type.as_deref())
            .map(str::parse::<TransactionType>)
            .transpose()
    }

    fn group_by(&self) -> Result<GroupBy, Error> {
        non_blank(self.group_by.as_deref())
            .map(str::parse::<GroupBy>)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// A route handler for the dashboard summary of the optional range
/// `startDate..=endDate`.
pub async fn get_dashboard_report(
    State(state): State<ReportState>,
    user_id: UserID,
    Query(params): Query<ReportParams>,
) -> Result<Json<DashboardSummary>, Error> {
    let filter = TransactionFilter {
        date_range: params.date_range()?,
        ..Default::default()
    };

    let connection = lock_connection(&state.db_connection)?;
    let transactions = connection.find_transactions(user_id, &filter)?;

    Ok(Json(compute_dashboard(&transactions)))
}

/// A route handler for totals per category.
///
/// Percentages are relative to the total of every transaction in the report,
/// which can be narrowed with `type`.
pub async fn get_category_report(
    State(state): State<ReportState>,
    user_id: UserID,
    Query(params): Query<ReportParams>,
) -> Result<Json<Vec<CategorySummary>>, Error> {
    let filter = TransactionFilter {
        date_range: params.date_range()?,
        category: None,
        transaction_type: params.transaction_type()?,
    };

    let connection = lock_connection(&state.db_connection)?;
    let transactions = connection.find_transactions(user_id, &filter)?;

    Ok(Json(compute_by_category(
        &transactions,
        total_amount(&transactions),
    )))
}

/// A route handler for income and expenses per day, week or month (the default).
pub async fn get_period_report(
    State(state): State<ReportState>,
    user_id: UserID,
    Query(params): Query<ReportParams>,
) -> Result<Json<Vec<PeriodSummary>>, Error> {
    let group_by = params.group_by()?;
    let filter = TransactionFilter {
        date_range: params.date_range()?,
        ..Default::default()
    };

    let connection = lock_connection(&state.db_connection)?;
    let transactions = connection.find_transactions(user_id, &filter)?;

    Ok(Json(compute_by_period(&transactions, group_by)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
