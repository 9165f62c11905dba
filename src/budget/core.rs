//! Budgets and their database queries.
//!
//! Only the budget's definition is stored. How much has been spent against
//! it is derived from the ledger whenever a budget is read, see
//! [crate::aggregation::compute_budget_spent].

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    DateRange, Error,
    money::{from_minor_units, to_minor_units, validate_amount},
    user::UserID,
};

/// Alias for the integer type used for budget IDs.
pub type BudgetId = i64;

/// How often the user intends to renew a budget.
///
/// This is a label only, budgets are never rolled over automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BudgetPeriod {
    /// A budget for a week.
    Weekly,
    /// A budget for a month.
    Monthly,
    /// A budget for a year.
    Yearly,
}

impl BudgetPeriod {
    /// The name of the period as it appears in JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "WEEKLY",
            BudgetPeriod::Monthly => "MONTHLY",
            BudgetPeriod::Yearly => "YEARLY",
        }
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WEEKLY" => Ok(BudgetPeriod::Weekly),
            "MONTHLY" => Ok(BudgetPeriod::Monthly),
            "YEARLY" => Ok(BudgetPeriod::Yearly),
            _ => Err(Error::UnsupportedBudgetPeriod(s.to_owned())),
        }
    }
}

impl ToSql for BudgetPeriod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetPeriod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A spending limit for one category over an inclusive date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// The category of expenses counted against the budget.
    pub category: String,
    /// The spending limit.
    pub amount: Decimal,
    /// How often the user intends to renew the budget.
    pub period: BudgetPeriod,
    /// The first day of the budget.
    pub start_date: Date,
    /// The last day of the budget, never before `start_date`.
    pub end_date: Date,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the budget was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to create a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The category of expenses counted against the budget.
    pub category: String,
    /// The spending limit.
    pub amount: Decimal,
    /// How often the user intends to renew the budget.
    pub period: BudgetPeriod,
    /// The first day of the budget.
    pub start_date: Date,
    /// The last day of the budget.
    pub end_date: Date,
}

/// The changes to make to a budget, fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetUpdate {
    /// The new category.
    pub category: Option<String>,
    /// The new spending limit.
    pub amount: Option<Decimal>,
    /// The new period label.
    pub period: Option<BudgetPeriod>,
    /// The new first day.
    pub start_date: Option<Date>,
    /// The new last day.
    pub end_date: Option<Date>,
}

const BUDGET_COLUMNS: &str =
    "id, user_id, category, amount, period, start_date, end_date, created_at, updated_at";

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category TEXT NOT NULL,
                amount INTEGER NOT NULL CHECK (amount >= 0),
                period TEXT NOT NULL CHECK (period IN ('WEEKLY', 'MONTHLY', 'YEARLY')),
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL CHECK (end_date >= start_date),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Create a new budget for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the category is blank,
/// - [Error::InvalidAmount] if the amount is negative or has fractions of a cent,
/// - [Error::InvalidDateRange] if the end date is before the start date,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    user_id: UserID,
    budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let category = budget_category(&budget.category)?;
    let amount = to_minor_units(validate_amount(budget.amount)?)?;
    DateRange::bounded(budget.start_date, budget.end_date)?;
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO budget (user_id, category, amount, period, start_date, end_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                category,
                amount,
                budget.period,
                budget.start_date,
                budget.end_date,
                now,
            ),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Retrieve the budget `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_budget_row)
        .map_err(Error::from)
}

/// Retrieve all budgets owned by `user_id` in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE user_id = ?1 ORDER BY id ASC"
        ))?
        .query_map((user_id.as_i64(),), map_budget_row)?
        .map(|budget_result| budget_result.map_err(Error::SqlError))
        .collect()
}

/// Apply `update` to the budget `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if a new category is given but blank,
/// - [Error::InvalidAmount] if a new amount is negative or has fractions of a cent,
/// - [Error::InvalidDateRange] if the updated end date is before the updated start date,
/// - [Error::UpdateMissingBudget] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_budget(
    id: BudgetId,
    user_id: UserID,
    update: BudgetUpdate,
    connection: &Connection,
) -> Result<Budget, Error> {
    let current = match get_budget(id, user_id, connection) {
        Ok(budget) => budget,
        Err(Error::NotFound) => return Err(Error::UpdateMissingBudget),
        Err(error) => return Err(error),
    };

    let category = update
        .category
        .as_deref()
        .map(budget_category)
        .transpose()?
        .unwrap_or(current.category.as_str());
    let amount = to_minor_units(validate_amount(update.amount.unwrap_or(current.amount))?)?;
    let start_date = update.start_date.unwrap_or(current.start_date);
    let end_date = update.end_date.unwrap_or(current.end_date);
    DateRange::bounded(start_date, end_date)?;

    connection
        .prepare(&format!(
            "UPDATE budget
             SET category = ?1, amount = ?2, period = ?3, start_date = ?4, end_date = ?5, updated_at = ?6
             WHERE id = ?7 AND user_id = ?8
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                category,
                amount,
                update.period.unwrap_or(current.period),
                start_date,
                end_date,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Delete the budget `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingBudget] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category: row.get(2)?,
        amount: from_minor_units(row.get(3)?),
        period: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn budget_category(category: &str) -> Result<&str, Error> {
    let category = category.trim();

    if category.is_empty() {
        return Err(Error::EmptyField("category"));
    }

    Ok(category)
}
