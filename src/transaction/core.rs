//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql, params_from_iter,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    goal::GoalId,
    money::{from_minor_units, to_minor_units, validate_amount},
    transaction::TransactionFilter,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

/// Whether money was earned or spent.
///
/// Amounts are always non-negative, the type alone decides whether a
/// transaction adds to or subtracts from a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money earned, e.g. salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The name of the transaction type as it appears in JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            _ => Err(Error::UnsupportedTransactionType(s.to_owned())),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user the transaction belongs to.
    pub user_id: UserID,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The amount of money spent or earned in this transaction, never negative.
    pub amount: Decimal,
    /// A free text label such as "Food" or "Salary".
    pub category: Option<String>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// The goal this transaction contributed to, if any.
    pub goal_id: Option<GoalId>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: Decimal,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            amount,
            date,
            category: None,
            description: String::new(),
            goal_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal_macros::dec;
/// use time::macros::date;
///
/// let builder = Transaction::build(TransactionType::Expense, dec!(45.99), date!(2025 - 01 - 15))
///     .category(Some("Food"))
///     .description("Coffee");
/// let transaction = create_transaction(user_id, builder, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the money was earned or spent.
    pub transaction_type: TransactionType,
    /// The amount of money, must be non-negative with at most two decimal places.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: Date,
    /// A free text label for grouping transactions.
    ///
    /// Blank labels are stored as no category.
    pub category: Option<String>,
    /// A human-readable description of the transaction.
    pub description: String,
    /// The goal that this transaction contributes to.
    pub goal_id: Option<GoalId>,
}

impl TransactionBuilder {
    /// Set the category for the transaction.
    pub fn category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(str::to_owned);
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Link the transaction to a goal.
    pub fn goal_id(mut self, goal_id: Option<GoalId>) -> Self {
        self.goal_id = goal_id;
        self
    }
}

/// The changes to make to a transaction, fields set to `None` are left unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TransactionUpdate {
    /// The new transaction type.
    pub transaction_type: Option<TransactionType>,
    /// The new amount.
    pub amount: Option<Decimal>,
    /// The new category.
    pub category: Option<String>,
    /// The new description.
    pub description: Option<String>,
    /// The new date.
    pub date: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, transaction_type, amount, category, description, \
                                   date, goal_id, created_at, updated_at";

/// Create a new transaction for `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is negative or has fractions of a cent,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = to_minor_units(validate_amount(builder.amount)?)?;
    let now = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
             (user_id, transaction_type, amount, category, description, date, goal_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                builder.transaction_type,
                amount,
                normalize_category(builder.category.as_deref()),
                builder.description.trim(),
                builder.date,
                builder.goal_id,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` from the database by its `id`.
///
/// Soft deleted transactions are treated as missing.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

/// Get the transactions owned by `user_id` that match every condition in `filter`.
///
/// Transactions are sorted by date, newest first. Transactions on the same
/// date are sorted by ID, newest first. Soft deleted transactions are never
/// returned.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn get_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut where_clause_parts = vec![
        "user_id = ?1".to_owned(),
        "deleted_at IS NULL".to_owned(),
    ];
    let mut query_parameters = vec![Value::Integer(user_id.as_i64())];

    if let Some(start) = filter.date_range.start {
        query_parameters.push(Value::Text(start.to_string()));
        where_clause_parts.push(format!("date >= ?{}", query_parameters.len()));
    }

    if let Some(end) = filter.date_range.end {
        query_parameters.push(Value::Text(end.to_string()));
        where_clause_parts.push(format!("date <= ?{}", query_parameters.len()));
    }

    if let Some(category) = &filter.category {
        query_parameters.push(Value::Text(category.clone()));
        where_clause_parts.push(format!("category = ?{}", query_parameters.len()));
    }

    if let Some(transaction_type) = filter.transaction_type {
        query_parameters.push(Value::Text(transaction_type.as_str().to_owned()));
        where_clause_parts.push(format!("transaction_type = ?{}", query_parameters.len()));
    }

    // Sort by date, and then ID to keep transaction order stable after updates
    let query_string = format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE {} ORDER BY date DESC, id DESC",
        where_clause_parts.join(" AND ")
    );

    connection
        .prepare(&query_string)?
        .query_map(params_from_iter(query_parameters.iter()), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Apply `update` to the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the new amount is negative or has fractions of a cent,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = update
        .amount
        .map(|amount| validate_amount(amount).and_then(to_minor_units))
        .transpose()?;

    let result = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET transaction_type = COALESCE(?1, transaction_type),
                 amount = COALESCE(?2, amount),
                 category = COALESCE(?3, category),
                 description = COALESCE(?4, description),
                 date = COALESCE(?5, date),
                 updated_at = ?6
             WHERE id = ?7 AND user_id = ?8 AND deleted_at IS NULL
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                update.transaction_type,
                amount,
                normalize_category(update.category.as_deref()),
                update.description.as_deref().map(str::trim),
                update.date,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        );

    match result {
        Ok(transaction) => Ok(transaction),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::UpdateMissingTransaction),
        Err(error) => Err(error.into()),
    }
}

/// Mark the transaction `id` owned by `user_id` as deleted.
///
/// The row is kept so the ledger stays auditable, but it is excluded from
/// every query and aggregate from then on.
///
/// Returns `false` if there was no transaction to delete.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn soft_delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET deleted_at = ?1
         WHERE id = ?2 AND user_id = ?3 AND deleted_at IS NULL",
        (OffsetDateTime::now_utc(), id, user_id.as_i64()),
    )?;

    Ok(rows_affected != 0)
}

/// Get the total number of transactions in the database, including soft deleted ones.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// Requires the user and goal tables to exist.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                transaction_type TEXT NOT NULL CHECK (transaction_type IN ('INCOME', 'EXPENSE')),
                amount INTEGER NOT NULL CHECK (amount >= 0),
                category TEXT,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                goal_id INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(goal_id) REFERENCES goal(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Add composite index used by the ledger queries and reports.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let transaction_type = row.get(2)?;
    let amount = from_minor_units(row.get(3)?);
    let category = row.get(4)?;
    let description = row.get(5)?;
    let date = row.get(6)?;
    let goal_id = row.get(7)?;
    let created_at = row.get(8)?;
    let updated_at = row.get(9)?;

    Ok(Transaction {
        id,
        user_id,
        transaction_type,
        amount,
        category,
        description,
        date,
        goal_id,
        created_at,
        updated_at,
    })
}

fn normalize_category(category: Option<&str>) -> Option<&str> {
    category.map(str::trim).filter(|category| !category.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================
