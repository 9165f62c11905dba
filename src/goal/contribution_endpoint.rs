use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    app_state::lock_connection,
    date_range::parse_optional_date,
    goal::{Goal, GoalId, GoalState, adjust_goal_amount, get_goal},
    goal_contribution::{GOAL_CONTRIBUTION_CATEGORY, contribution_description},
    money::validate_amount,
    transaction::{Transaction, TransactionType, create_transaction},
    user::UserID,
};

/// The request body for adding money to a goal.
#[derive(Debug, Deserialize)]
pub struct ContributionForm {
    amount: Decimal,
    date: Option<String>,
}

/// The goal after a contribution and the ledger entry that records it.
#[derive(Debug, Serialize, Deserialize)]
pub struct Contribution {
    /// The goal with its updated saved amount.
    pub goal: Goal,
    /// The expense recorded for the money set aside.
    pub transaction: Transaction,
}

/// A route handler for contributing money to a goal.
///
/// Records an expense tagged as a contribution to the goal and adds the
/// amount to the goal's saved amount. Both changes are committed together.
/// The contribution is dated today (UTC) unless a date is given.
pub async fn contribute_to_goal_endpoint(
    State(state): State<GoalState>,
    user_id: UserID,
    Path(goal_id): Path<GoalId>,
    Json(form): Json<ContributionForm>,
) -> Result<Response, Error> {
    let amount = validate_amount(form.amount)?;
    let date = parse_optional_date(form.date.as_deref())?
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());

    let connection = lock_connection(&state.db_connection)?;
    let sql_transaction = connection.unchecked_transaction()?;

    let goal = get_goal(goal_id, user_id, &sql_transaction)?;

    let builder = Transaction::build(TransactionType::Expense, amount, date)
        .category(Some(GOAL_CONTRIBUTION_CATEGORY))
        .description(&contribution_description(&goal.name))
        .goal_id(Some(goal.id));
    let transaction = create_transaction(user_id, builder, &sql_transaction)?;

    let goal = adjust_goal_amount(goal.id, user_id, amount, &sql_transaction)?
        .ok_or(Error::NotFound)?;

    sql_transaction.commit()?;

    tracing::info!(
        "Added {amount} to goal {goal_id} with transaction {}",
        transaction.id
    );

    Ok((StatusCode::CREATED, Json(Contribution { goal, transaction })).into_response())
}

#[cfg(test)]
mod contribution_endpoint_tests {
    use axum::http::StatusCode;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error,
        endpoints::{self, format_endpoint},
        goal::Goal,
        test_utils::{get_test_server, register_test_user},
        transaction::{Transaction, TransactionType},
    };

    use super::Contribution;

    async fn create_goal(server: &axum_test::TestServer, token: &str) -> Goal {
        server
            .post(endpoints::GOALS)
            .authorization_bearer(token)
            .json(&json!({ "name": "Vacation", "targetAmount": 1000, "deadline": "2026-06-01" }))
            .await
            .json::<Goal>()
    }

    #[tokio::test]
    async fn contribution_records_expense_and_increments_goal() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = create_goal(&server, &token).await;

        let response = server
            .post(&format_endpoint(endpoints::GOAL_CONTRIBUTIONS, goal.id))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 125.5, "date": "2025-04-30" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let Contribution { goal, transaction } = response.json::<Contribution>();
        assert_eq!(goal.current_amount, dec!(125.5));
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.amount, dec!(125.5));
        assert_eq!(transaction.category.as_deref(), Some("Goal"));
        assert_eq!(transaction.description, "Contribution to goal: Vacation");
        assert_eq!(transaction.goal_id, Some(goal.id));
        assert_eq!(transaction.date, date!(2025 - 04 - 30));
    }

    #[tokio::test]
    async fn contributions_accumulate() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = create_goal(&server, &token).await;
        let path = format_endpoint(endpoints::GOAL_CONTRIBUTIONS, goal.id);

        for amount in [100, 50, 25] {
            server
                .post(&path)
                .authorization_bearer(&token)
                .json(&json!({ "amount": amount }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let goal = server
            .get(&format_endpoint(endpoints::GOAL, goal.id))
            .authorization_bearer(&token)
            .await
            .json::<Goal>();
        assert_eq!(goal.current_amount, dec!(175));
    }

    #[tokio::test]
    async fn contribution_defaults_to_today() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = create_goal(&server, &token).await;
        let before = OffsetDateTime::now_utc().date();

        let contribution = server
            .post(&format_endpoint(endpoints::GOAL_CONTRIBUTIONS, goal.id))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 10 }))
            .await
            .json::<Contribution>();

        let after = OffsetDateTime::now_utc().date();
        assert!((before..=after).contains(&contribution.transaction.date));
    }

    #[tokio::test]
    async fn contribution_reduces_balance() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = create_goal(&server, &token).await;
        server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .json(&json!({ "type": "INCOME", "amount": 500, "date": "2025-04-01" }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(&format_endpoint(endpoints::GOAL_CONTRIBUTIONS, goal.id))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 200 }))
            .await
            .assert_status(StatusCode::CREATED);

        let profile = server
            .get(endpoints::PROFILE)
            .authorization_bearer(&token)
            .await
            .json::<serde_json::Value>();
        assert_eq!(profile["balance"].as_f64(), Some(300.0));
    }

    #[tokio::test]
    async fn contribution_to_missing_goal_changes_nothing() {
        let server = get_test_server();
        let token = register_test_user(&server).await;

        let response = server
            .post(&format_endpoint(endpoints::GOAL_CONTRIBUTIONS, 77))
            .authorization_bearer(&token)
            .json(&json!({ "amount": 10 }))
            .await;

        response.assert_status_not_found();
        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&token)
            .await
            .json::<Vec<Transaction>>();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn negative_contribution_is_rejected() {
        let server = get_test_server();
        let token = register_test_user(&server).await;
        let goal = create_goal(&server, &token).await;

        let response = server
            .post(&format_endpoint(endpoints::GOAL_CONTRIBUTIONS, goal.id))
            .authorization_bearer(&token)
            .json(&json!({ "amount": -10 }))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({
            "error": Error::InvalidAmount(dec!(-10)).to_string()
        }));
    }
}
