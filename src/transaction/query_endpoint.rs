use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    transaction::{
        FilterParams, Transaction, TransactionFilter, TransactionId, get_transaction,
        get_transactions,
    },
    user::UserID,
};

/// The state needed to read and write a user's transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for listing the current user's transactions.
///
/// Accepts the optional query parameters `startDate`, `endDate`, `category`
/// and `type`, every parameter that is set must match.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    user_id: UserID,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let filter = TransactionFilter::try_from(params)?;
    let connection = lock_connection(&state.db_connection)?;

    get_transactions(user_id, &filter, &connection).map(Json)
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    user_id: UserID,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(transaction_id, user_id, &connection).map(Json)
}

#[cfg(test)]
mod query_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use crate::{
        Error,
        endpoints::{self, format_endpoint},
        test_utils::{get_test_server, register_test_user, register_user},
        transaction::Transaction,
    };

    async fn seed_ledger(server: &TestServer, token: &str) {
        for (transaction_type, amount, category, date) in [
            ("INCOME", 50000.0, "Salary", "2025-10-01"),
            ("EXPENSE", 3500.0, "Food", "2025-10-05"),
            ("EXPENSE", 120.5, "Transport", "2025-10-05"),
            ("EXPENSE", 80.0, "Food", "2025-11-02"),
        ] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(token)
                .json(&json!({
                    "type": transaction_type,
                    "amount": amount,
                    "category": category,
                    "date": date,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        seed_ledger(&server, &token).await;

        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Transaction>>();

        let dates: Vec<String> = transactions
            .iter()
            .map(|transaction| transaction.date.to_string())
            .collect();
        assert_eq!(
            dates,
            ["2025-11-02", "2025-10-05", "2025-10-05", "2025-10-01"]
        );
        // Same date, the later insert comes first.
        assert_eq!(transactions[1].category.as_deref(), Some("Transport"));
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        seed_ledger(&server, &token).await;

        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("type", "EXPENSE")
            .add_query_param("category", "Food")
            .add_query_param("startDate", "2025-10-01")
            .add_query_param("endDate", "2025-10-31")
            .await
            .json::<Vec<Transaction>>();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, dec!(3500));
    }

    #[tokio::test]
    async fn date_filter_is_inclusive() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        seed_ledger(&server, &token).await;

        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("startDate", "2025-10-05")
            .add_query_param("endDate", "2025-11-02")
            .await
            .json::<Vec<Transaction>>();

        assert_eq!(transactions.len(), 3);
    }

    #[tokio::test]
    async fn unsupported_type_filter_is_rejected() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("type", "TRANSFER")
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "error": Error::UnsupportedTransactionType("TRANSFER".to_owned()).to_string()
        }));
    }

    #[tokio::test]
    async fn malformed_date_filter_is_rejected() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .add_query_param("startDate", "01/10/2025")
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn cannot_see_other_users_transactions() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        seed_ledger(&server, &token).await;
        let other_token = register_user(&server, "other@example.com", "hunter2").await;

        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&other_token)
            .await
            .json::<Vec<Transaction>>();
        assert!(transactions.is_empty());

        let first_id = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Transaction>>()[0]
            .id;
        server
            .get(&format_endpoint(endpoints::TRANSACTION, first_id))
            .authorization_bearer(&other_token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn get_missing_transaction_is_not_found() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        server
            .get(&format_endpoint(endpoints::TRANSACTION, 1337))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }
}
