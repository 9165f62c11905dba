use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    Error,
    app_state::lock_connection,
    date_range::parse_date,
    transaction::{Transaction, TransactionState, TransactionType, create_transaction},
    user::UserID,
};

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionForm {
    /// `INCOME` or `EXPENSE`.
    #[serde(rename = "type")]
    pub transaction_type: String,
    /// The non-negative amount of money.
    pub amount: Decimal,
    /// An optional free text label.
    pub category: Option<String>,
    /// What the transaction was for.
    #[serde(default)]
    pub description: String,
    /// When the transaction happened.
    pub date: String,
}

/// A route handler for recording a new transaction, responds with 201 Created
/// and the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    user_id: UserID,
    Json(form): Json<CreateTransactionForm>,
) -> Result<Response, Error> {
    let transaction_type: TransactionType = form.transaction_type.parse()?;
    let date = parse_date(&form.date)?;

    let builder = Transaction::build(transaction_type, form.amount, date)
        .category(form.category.as_deref())
        .description(&form.description);

    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(user_id, builder, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

#[cfg(test)]
mod create_endpoint_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error, endpoints,
        test_utils::{get_test_server, register_test_user},
        transaction::{Transaction, TransactionType},
    };

    #[tokio::test]
    async fn can_create_transaction() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({
                "type": "EXPENSE",
                "amount": 45.99,
                "category": "Food",
                "description": "Groceries",
                "date": "2025-01-15"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.amount, dec!(45.99));
        assert_eq!(transaction.category.as_deref(), Some("Food"));
        assert_eq!(transaction.description, "Groceries");
        assert_eq!(transaction.date, date!(2025 - 01 - 15));
        assert_eq!(transaction.goal_id, None);
    }

    #[tokio::test]
    async fn accepts_date_time_and_lowercase_type() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({
                "type": "income",
                "amount": 100,
                "date": "2025-03-01T09:30:00Z"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.transaction_type, TransactionType::Income);
        assert_eq!(transaction.date, date!(2025 - 03 - 01));
        assert_eq!(transaction.category, None);
    }

    #[tokio::test]
    async fn rejects_unsupported_type() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "type": "TRANSFER", "amount": 10, "date": "2025-01-15" }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "error": Error::UnsupportedTransactionType("TRANSFER".to_owned()).to_string()
        }));
    }

    #[tokio::test]
    async fn rejects_malformed_date() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "type": "EXPENSE", "amount": 10, "date": "15/01/2025" }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "error": Error::InvalidDate("15/01/2025".to_owned()).to_string()
        }));
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "type": "EXPENSE", "amount": -5, "date": "2025-01-15" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn requires_token() {
        let server = get_test_server();

        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({ "type": "EXPENSE", "amount": 10, "date": "2025-01-15" }))
            .await
            .assert_status_unauthorized();
    }
}
