use axum::{
    Json,
    extract::{Path, State},
};
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    Error,
    app_state::lock_connection,
    goal_contribution::apply_goal_contribution_reversal,
    ledger::TransactionLedger,
    transaction::{TransactionId, TransactionState},
    user::UserID,
};

/// A route handler for deleting a transaction.
///
/// If the transaction was a contribution to a goal, the goal's saved amount
/// is reduced by the transaction's amount before the transaction is removed.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    user_id: UserID,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(transaction_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Transaction deleted successfully" })))
}

/// Soft delete a transaction and undo its goal contribution, if any.
///
/// The reversal and the deletion are committed together, so a failed
/// deletion leaves the goal untouched. A failed reversal is logged and does
/// not stop the deletion.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if the user has no such
/// transaction, or an SQL error if the deletion could not be saved.
fn delete_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let transaction = sql_transaction
        .find_transaction(transaction_id, user_id)?
        .ok_or(Error::DeleteMissingTransaction)?;

    // The reversal must see the transaction as it was before deletion.
    if let Err(error) = apply_goal_contribution_reversal(&transaction, &*sql_transaction) {
        tracing::error!(
            "Could not reverse goal contribution for transaction {transaction_id}: {error}"
        );
    }

    if !sql_transaction.soft_delete_transaction(transaction_id, user_id)? {
        return Err(Error::DeleteMissingTransaction);
    }

    sql_transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod delete_endpoint_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        endpoints::{self, format_endpoint},
        goal::{Goal, NewGoal, adjust_goal_amount, create_goal, get_goal},
        goal_contribution::{GOAL_CONTRIBUTION_CATEGORY, contribution_description},
        test_utils::{
            create_test_user, get_test_connection, get_test_server, register_test_user,
        },
        transaction::{Transaction, TransactionType, create_transaction, get_transaction},
    };

    use super::delete_transaction;

    #[test]
    fn failed_delete_keeps_goal_amount() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let goal = create_goal(
            user.id,
            NewGoal {
                name: "Vacation".to_owned(),
                target_amount: dec!(1000),
                deadline: date!(2026 - 06 - 01),
            },
            &conn,
        )
        .unwrap();
        let contribution = create_transaction(
            user.id,
            Transaction::build(TransactionType::Expense, dec!(100), date!(2025 - 05 - 01))
                .category(Some(GOAL_CONTRIBUTION_CATEGORY))
                .description(&contribution_description(&goal.name))
                .goal_id(Some(goal.id)),
            &conn,
        )
        .unwrap();
        adjust_goal_amount(goal.id, user.id, dec!(100), &conn).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER block_transaction_update BEFORE UPDATE ON \"transaction\"
             BEGIN SELECT RAISE(ABORT, 'updates are blocked'); END;",
        )
        .unwrap();

        let result = delete_transaction(contribution.id, user.id, &conn);

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
        assert_eq!(
            get_goal(goal.id, user.id, &conn).unwrap().current_amount,
            dec!(100)
        );
        assert_eq!(
            get_transaction(contribution.id, user.id, &conn),
            Ok(contribution)
        );
    }

    #[tokio::test]
    async fn deleted_transaction_disappears() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "type": "EXPENSE", "amount": 20, "category": "Food", "date": "2025-01-01" }))
            .await
            .json::<Transaction>();

        let response = server
            .delete(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "message": "Transaction deleted successfully" }));
        server
            .get(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
        let remaining = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Transaction>>();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "type": "INCOME", "amount": 20, "date": "2025-01-01" }))
            .await
            .json::<Transaction>();
        let path = format_endpoint(endpoints::TRANSACTION, transaction.id);
        server.delete(&path).authorization_bearer(&token).await.assert_status_ok();

        let response = server.delete(&path).authorization_bearer(&token).await;

        response.assert_status_not_found();
        response.assert_json(&json!({ "error": Error::DeleteMissingTransaction.to_string() }));
    }

    #[tokio::test]
    async fn deleting_contribution_reverses_goal_amount() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = server
            .post(endpoints::GOALS)
            .authorization_bearer(&token)
            .json(&json!({ "name": "Vacation", "targetAmount": 1000, "deadline": "2026-06-01" }))
            .await
            .json::<Goal>();
        let contributions_path = format_endpoint(endpoints::GOAL_CONTRIBUTIONS, goal.id);
        for amount in [50, 100] {
            server
                .post(&contributions_path)
                .authorization_bearer(&token)
                .json(&json!({ "amount": amount, "date": "2025-05-01" }))
                .await
                .assert_status(StatusCode::CREATED);
        }
        let contributions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("category", "Goal")
            .await
            .json::<Vec<Transaction>>();
        let contribution = contributions
            .iter()
            .find(|transaction| transaction.amount == dec!(100))
            .unwrap();

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, contribution.id))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let goal = server
            .get(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .await
            .json::<Goal>();
        assert_eq!(goal.current_amount, dec!(50));
    }

    #[tokio::test]
    async fn deleting_ordinary_transaction_leaves_goals_alone() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = server
            .post(endpoints::GOALS)
            .authorization_bearer(&token)
            .json(&json!({ "name": "Vacation", "targetAmount": 1000, "deadline": "2026-06-01" }))
            .await
            .json::<Goal>();
        server
            .post(&format_endpoint(endpoints::GOAL_CONTRIBUTIONS, goal.id))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 150 }))
            .await
            .assert_status(StatusCode::CREATED);
        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({
                "type": "EXPENSE",
                "amount": 100,
                "category": "Travel",
                "description": "Vacation",
                "date": "2025-05-01"
            }))
            .await
            .json::<Transaction>();

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let goal = server
            .get(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .await
            .json::<Goal>();
        assert_eq!(goal.current_amount, dec!(150));
    }

    #[tokio::test]
    async fn tagged_transaction_without_link_reverses_by_name() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = server
            .post(endpoints::GOALS)
            .authorization_bearer(&token)
            .json(&json!({ "name": "Vacation", "targetAmount": 1000, "deadline": "2026-06-01" }))
            .await
            .json::<Goal>();
        server
            .put(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .json(&json!({ "currentAmount": 150 }))
            .await
            .assert_status_ok();
        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({
                "type": "EXPENSE",
                "amount": 200,
                "category": "Goal",
                "description": "Contribution to goal: Vacation",
                "date": "2025-05-01"
            }))
            .await
            .json::<Transaction>();

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let goal = server
            .get(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .await
            .json::<Goal>();
        assert_eq!(goal.current_amount, dec!(0));
    }
}
