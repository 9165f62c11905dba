//! Savings goals and their database queries.
//!
//! A goal's `current_amount` is a stored accumulator: it is changed directly
//! by the user or by contributions, unlike budget spending which is always
//! derived from the ledger.

use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    money::{from_minor_units, to_minor_units, validate_amount},
    user::UserID,
};

/// Alias for the integer type used for goal IDs.
pub type GoalId = i64;

/// An amount of money the user is saving towards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The user that owns the goal.
    pub user_id: UserID,
    /// What the user is saving for, e.g. "Vacation".
    pub name: String,
    /// The amount the user wants to save.
    pub target_amount: Decimal,
    /// The amount saved so far, never negative.
    pub current_amount: Decimal,
    /// When the user wants to reach the target.
    pub deadline: Date,
    /// When the goal was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the goal was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to create a goal. Goals always start with nothing saved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    /// What the user is saving for.
    pub name: String,
    /// The amount the user wants to save.
    pub target_amount: Decimal,
    /// When the user wants to reach the target.
    pub deadline: Date,
}

/// The changes to make to a goal, fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalUpdate {
    /// The new name.
    pub name: Option<String>,
    /// The new target.
    pub target_amount: Option<Decimal>,
    /// The new amount saved so far.
    pub current_amount: Option<Decimal>,
    /// The new deadline.
    pub deadline: Option<Date>,
}

const GOAL_COLUMNS: &str =
    "id, user_id, name, target_amount, current_amount, deadline, created_at, updated_at";

/// Create the goal table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                target_amount INTEGER NOT NULL CHECK (target_amount >= 0),
                current_amount INTEGER NOT NULL DEFAULT 0 CHECK (current_amount >= 0),
                deadline TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_goal_user_name ON goal(user_id, name);",
        (),
    )?;

    Ok(())
}

/// Create a new goal for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the name is blank,
/// - [Error::InvalidAmount] if the target is negative or has fractions of a cent,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_goal(user_id: UserID, goal: NewGoal, connection: &Connection) -> Result<Goal, Error> {
    let name = goal_name(&goal.name)?;
    let target_amount = to_minor_units(validate_amount(goal.target_amount)?)?;
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO goal (user_id, name, target_amount, current_amount, deadline, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?5)
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            (user_id.as_i64(), name, target_amount, goal.deadline, now),
            map_goal_row,
        )
        .map_err(Error::from)
}

/// Retrieve the goal `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_goal(id: GoalId, user_id: UserID, connection: &Connection) -> Result<Goal, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goal WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_goal_row)
        .map_err(Error::from)
}

/// Retrieve all goals owned by `user_id` in the order they were created.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn get_goals(user_id: UserID, connection: &Connection) -> Result<Vec<Goal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goal WHERE user_id = ?1 ORDER BY id ASC"
        ))?
        .query_map((user_id.as_i64(),), map_goal_row)?
        .map(|goal_result| goal_result.map_err(Error::SqlError))
        .collect()
}

/// Find the goal owned by `user_id` whose name is exactly `name`.
///
/// When several goals share a name the oldest one, i.e. the one with the
/// lowest ID, is returned.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn find_goal_by_name(
    user_id: UserID,
    name: &str,
    connection: &Connection,
) -> Result<Option<Goal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goal WHERE user_id = ?1 AND name = ?2 ORDER BY id ASC LIMIT 1"
        ))?
        .query_row((user_id.as_i64(), name), map_goal_row)
        .optional()
        .map_err(Error::from)
}

/// Apply `update` to the goal `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if a new name is given but blank,
/// - [Error::InvalidAmount] if a new amount is negative or has fractions of a cent,
/// - [Error::UpdateMissingGoal] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_goal(
    id: GoalId,
    user_id: UserID,
    update: GoalUpdate,
    connection: &Connection,
) -> Result<Goal, Error> {
    let name = update.name.as_deref().map(goal_name).transpose()?;
    let target_amount = update
        .target_amount
        .map(|amount| validate_amount(amount).and_then(to_minor_units))
        .transpose()?;
    let current_amount = update
        .current_amount
        .map(|amount| validate_amount(amount).and_then(to_minor_units))
        .transpose()?;

    let result = connection
        .prepare(&format!(
            "UPDATE goal
             SET name = COALESCE(?1, name),
                 target_amount = COALESCE(?2, target_amount),
                 current_amount = COALESCE(?3, current_amount),
                 deadline = COALESCE(?4, deadline),
                 updated_at = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            (
                name,
                target_amount,
                current_amount,
                update.deadline,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_goal_row,
        );

    match result {
        Ok(goal) => Ok(goal),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::UpdateMissingGoal),
        Err(error) => Err(error.into()),
    }
}

/// Add `delta` to the saved amount of goal `id`, which may be negative.
///
/// The change is a single atomic statement and the result is floored at
/// zero, so concurrent contributions cannot lose updates and a reversal can
/// never leave a negative balance.
///
/// Returns `None` if `id` does not refer to a goal owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `delta` has fractions of a cent,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn adjust_goal_amount(
    id: GoalId,
    user_id: UserID,
    delta: Decimal,
    connection: &Connection,
) -> Result<Option<Goal>, Error> {
    let delta = to_minor_units(delta)?;

    connection
        .prepare(&format!(
            "UPDATE goal
             SET current_amount = MAX(0, current_amount + ?1), updated_at = ?2
             WHERE id = ?3 AND user_id = ?4
             RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            (delta, OffsetDateTime::now_utc(), id, user_id.as_i64()),
            map_goal_row,
        )
        .optional()
        .map_err(Error::from)
}

/// Delete the goal `id` owned by `user_id`.
///
/// Transactions that contributed to the goal are kept but lose their link to it.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingGoal] if `id` does not refer to a goal owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_goal(id: GoalId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM goal WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingGoal);
    }

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<Goal, rusqlite::Error> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        target_amount: from_minor_units(row.get(3)?),
        current_amount: from_minor_units(row.get(4)?),
        deadline: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn goal_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyField("name"));
    }

    Ok(name)
}

#[cfg(test)]
mod goal_db_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        goal::{
            GoalUpdate, NewGoal, adjust_goal_amount, create_goal, delete_goal, find_goal_by_name,
            get_goal, get_goals, update_goal,
        },
        test_utils::{create_test_user, get_test_connection},
        transaction::{Transaction, TransactionType, create_transaction, get_transaction},
    };

    fn new_goal(name: &str) -> NewGoal {
        NewGoal {
            name: name.to_owned(),
            target_amount: dec!(1000),
            deadline: date!(2026 - 06 - 01),
        }
    }

    #[test]
    fn create_goal_starts_at_zero() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);

        let goal = create_goal(user.id, new_goal(" Vacation "), &conn).unwrap();

        assert_eq!(goal.name, "Vacation");
        assert_eq!(goal.target_amount, dec!(1000));
        assert_eq!(goal.current_amount, dec!(0));
        assert_eq!(get_goal(goal.id, user.id, &conn), Ok(goal));
    }

    #[test]
    fn create_goal_fails_on_blank_name() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);

        let result = create_goal(user.id, new_goal(""), &conn);

        assert_eq!(result, Err(Error::EmptyField("name")));
    }

    #[test]
    fn find_by_name_prefers_oldest_goal() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let first = create_goal(user.id, new_goal("Vacation"), &conn).unwrap();
        create_goal(user.id, new_goal("Vacation"), &conn).unwrap();

        let found = find_goal_by_name(user.id, "Vacation", &conn).unwrap();

        assert_eq!(found, Some(first));
        assert_eq!(find_goal_by_name(user.id, "vacation", &conn), Ok(None));
    }

    #[test]
    fn adjust_amount_adds_and_floors_at_zero() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let goal = create_goal(user.id, new_goal("Vacation"), &conn).unwrap();

        let goal = adjust_goal_amount(goal.id, user.id, dec!(150), &conn)
            .unwrap()
            .unwrap();
        assert_eq!(goal.current_amount, dec!(150));

        let goal = adjust_goal_amount(goal.id, user.id, dec!(-100), &conn)
            .unwrap()
            .unwrap();
        assert_eq!(goal.current_amount, dec!(50));

        let goal = adjust_goal_amount(goal.id, user.id, dec!(-200), &conn)
            .unwrap()
            .unwrap();
        assert_eq!(goal.current_amount, dec!(0));
    }

    #[test]
    fn adjust_missing_goal_returns_none() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);

        assert_eq!(adjust_goal_amount(42, user.id, dec!(1), &conn), Ok(None));
    }

    #[test]
    fn update_goal_changes_only_given_fields() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let goal = create_goal(user.id, new_goal("Vacation"), &conn).unwrap();

        let updated = update_goal(
            goal.id,
            user.id,
            GoalUpdate {
                current_amount: Some(dec!(250.50)),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(updated.current_amount, dec!(250.50));
        assert_eq!(updated.name, goal.name);
        assert_eq!(updated.target_amount, goal.target_amount);
        assert_eq!(updated.deadline, goal.deadline);
    }

    #[test]
    fn update_missing_goal_fails() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);

        let result = update_goal(42, user.id, GoalUpdate::default(), &conn);

        assert_eq!(result, Err(Error::UpdateMissingGoal));
    }

    #[test]
    fn delete_goal_unlinks_transactions() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let goal = create_goal(user.id, new_goal("Vacation"), &conn).unwrap();
        let transaction = create_transaction(
            user.id,
            Transaction::build(TransactionType::Expense, dec!(10), date!(2025 - 10 - 01))
                .goal_id(Some(goal.id)),
            &conn,
        )
        .unwrap();

        delete_goal(goal.id, user.id, &conn).unwrap();

        assert_eq!(get_goals(user.id, &conn), Ok(vec![]));
        let transaction = get_transaction(transaction.id, user.id, &conn).unwrap();
        assert_eq!(transaction.goal_id, None);
        assert_eq!(
            delete_goal(goal.id, user.id, &conn),
            Err(Error::DeleteMissingGoal)
        );
    }
}
