//! The storage seams used by the aggregation and goal contribution code.
//!
//! The report and deletion workflows only need these narrow operations, so
//! they are expressed as traits with the SQLite [Connection] as the
//! production implementation.

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Error,
    goal::{self, Goal, GoalId},
    transaction::{self, Transaction, TransactionFilter, TransactionId},
    user::UserID,
};

/// Read access to a user's transactions plus soft deletion.
pub trait TransactionLedger {
    /// Get the user's transactions that match every condition in `filter`,
    /// newest first.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    fn find_transactions(
        &self,
        user_id: UserID,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Error>;

    /// Get a single transaction owned by `user_id`, or `None` if there is no
    /// such transaction or it has been deleted.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    fn find_transaction(
        &self,
        id: TransactionId,
        user_id: UserID,
    ) -> Result<Option<Transaction>, Error>;

    /// Mark a transaction as deleted. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    fn soft_delete_transaction(&self, id: TransactionId, user_id: UserID) -> Result<bool, Error>;
}

/// Lookup and adjustment of a user's savings goals.
pub trait GoalRepository {
    /// Get the user's goal named exactly `name`, the oldest one if several
    /// goals share the name.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    fn find_goal_by_name(&self, user_id: UserID, name: &str) -> Result<Option<Goal>, Error>;

    /// Atomically add `delta` to the goal's saved amount, flooring the result
    /// at zero. Returns the updated goal, or `None` if there is no such goal.
    ///
    /// # Errors
    /// Returns an error if the underlying store fails.
    fn adjust_goal_amount(
        &self,
        id: GoalId,
        user_id: UserID,
        delta: Decimal,
    ) -> Result<Option<Goal>, Error>;
}

impl TransactionLedger for Connection {
    fn find_transactions(
        &self,
        user_id: UserID,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Error> {
        transaction::get_transactions(user_id, filter, self)
    }

    fn find_transaction(
        &self,
        id: TransactionId,
        user_id: UserID,
    ) -> Result<Option<Transaction>, Error> {
        match transaction::get_transaction(id, user_id, self) {
            Ok(transaction) => Ok(Some(transaction)),
            Err(Error::NotFound) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn soft_delete_transaction(&self, id: TransactionId, user_id: UserID) -> Result<bool, Error> {
        transaction::soft_delete_transaction(id, user_id, self)
    }
}

impl GoalRepository for Connection {
    fn find_goal_by_name(&self, user_id: UserID, name: &str) -> Result<Option<Goal>, Error> {
        goal::find_goal_by_name(user_id, name, self)
    }

    fn adjust_goal_amount(
        &self,
        id: GoalId,
        user_id: UserID,
        delta: Decimal,
    ) -> Result<Option<Goal>, Error> {
        goal::adjust_goal_amount(id, user_id, delta, self)
    }
}

#[cfg(test)]
mod ledger_tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        GoalRepository, TransactionFilter, TransactionLedger,
        goal::{NewGoal, create_goal},
        test_utils::{create_test_user, get_test_connection},
        transaction::{Transaction, TransactionType, create_transaction},
    };

    #[test]
    fn find_transaction_maps_missing_to_none() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let transaction = create_transaction(
            user.id,
            Transaction::build(TransactionType::Income, dec!(5), date!(2025 - 10 - 01)),
            &conn,
        )
        .unwrap();

        assert_eq!(
            conn.find_transaction(transaction.id, user.id),
            Ok(Some(transaction.clone()))
        );
        assert_eq!(conn.soft_delete_transaction(transaction.id, user.id), Ok(true));
        assert_eq!(conn.find_transaction(transaction.id, user.id), Ok(None));
        assert_eq!(
            conn.find_transactions(user.id, &TransactionFilter::default()),
            Ok(vec![])
        );
    }

    #[test]
    fn goal_lookup_and_adjustment_map_missing_to_none() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let goal = create_goal(
            user.id,
            NewGoal {
                name: "Car".to_owned(),
                target_amount: dec!(5000),
                deadline: date!(2027 - 01 - 01),
            },
            &conn,
        )
        .unwrap();

        assert_eq!(conn.find_goal_by_name(user.id, "Car"), Ok(Some(goal.clone())));
        assert_eq!(conn.find_goal_by_name(user.id, "Boat"), Ok(None));
        assert_eq!(conn.adjust_goal_amount(goal.id + 1, user.id, dec!(10)), Ok(None));
        assert_eq!(
            conn.adjust_goal_amount(goal.id, user.id, dec!(10))
                .map(|goal| goal.map(|goal| goal.current_amount)),
            Ok(Some(dec!(10)))
        );
    }
}
