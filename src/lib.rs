//! A personal finance tracker.
//!
//! This library provides a JSON REST API for recording income and expenses,
//! tracking budgets against spending, saving towards goals and summarising
//! the ledger on a dashboard.
//!
//! Monetary aggregates such as the user's balance and a budget's spending
//! are derived from the transaction ledger on every read and never stored.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod aggregation;
mod app_state;
mod auth;
mod budget;
mod category;
mod date_range;
mod db;
mod endpoints;
mod goal;
mod goal_contribution;
mod ledger;
mod logging;
mod money;
mod report;
mod routing;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use aggregation::{
    CategorySummary, DashboardSummary, GroupBy, PeriodSummary, compute_balance,
    compute_budget_spent, compute_by_category, compute_by_period, compute_dashboard,
};
pub use app_state::AppState;
pub use budget::{Budget, BudgetPeriod};
pub use date_range::DateRange;
pub use db::initialize as initialize_db;
pub use goal::{Goal, GoalId};
pub use goal_contribution::apply_goal_contribution_reversal;
pub use ledger::{GoalRepository, TransactionLedger};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionFilter, TransactionId, TransactionType};
pub use user::{User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not include an `Authorization: Bearer <token>` header.
    #[error("missing bearer token")]
    MissingToken,

    /// The bearer token could not be parsed or does not belong to a registered user.
    #[error("invalid token")]
    InvalidToken,

    /// The email and password did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The email address is already used by another user.
    #[error("a user with this email already exists")]
    DuplicateEmail,

    /// A required text field was empty or only whitespace.
    ///
    /// Callers should pass in the name of the field.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A transaction type other than `INCOME` or `EXPENSE` was given.
    #[error("unsupported transaction type \"{0}\"")]
    UnsupportedTransactionType(String),

    /// A budget period other than `WEEKLY`, `MONTHLY` or `YEARLY` was given.
    #[error("unsupported budget period \"{0}\"")]
    UnsupportedBudgetPeriod(String),

    /// A report grouping other than `day`, `week` or `month` was given.
    #[error("unsupported grouping \"{0}\", expected one of day, week or month")]
    UnsupportedGroupBy(String),

    /// A date string could not be parsed as `YYYY-MM-DD` or an RFC 3339 date-time.
    #[error("invalid date \"{0}\", expected YYYY-MM-DD")]
    InvalidDate(String),

    /// The end of a date range comes before its start.
    #[error("the end date {end} is before the start date {start}")]
    InvalidDateRange {
        /// The first day of the range.
        start: time::Date,
        /// The last day of the range.
        end: time::Date,
    },

    /// A money amount was negative, had more than two decimal places or was
    /// too large to store.
    #[error("invalid amount {0}: amounts must be non-negative with at most two decimal places")]
    InvalidAmount(rust_decimal::Decimal),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update a goal that does not exist
    #[error("tried to update a goal that is not in the database")]
    UpdateMissingGoal,

    /// Tried to delete a goal that does not exist
    #[error("tried to delete a goal that is not in the database")]
    DeleteMissingGoal,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.email") => Error::DuplicateEmail,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingToken | Error::InvalidToken | Error::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::EmptyField(_)
            | Error::UnsupportedTransactionType(_)
            | Error::UnsupportedBudgetPeriod(_)
            | Error::UnsupportedGroupBy(_)
            | Error::InvalidDate(_)
            | Error::InvalidDateRange { .. }
            | Error::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingBudget
            | Error::DeleteMissingBudget
            | Error::UpdateMissingGoal
            | Error::DeleteMissingGoal => StatusCode::NOT_FOUND,
            Error::SqlError(_) | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
