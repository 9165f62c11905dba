//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{get_profile, post_log_in, post_log_out, register_user, update_profile},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, edit_budget_endpoint, get_budget_endpoint,
        get_budgets_endpoint,
    },
    category::get_categories,
    endpoints,
    goal::{
        contribute_to_goal_endpoint, create_goal_endpoint, delete_goal_endpoint,
        edit_goal_endpoint, get_goal_endpoint, get_goals_endpoint,
    },
    report::{get_category_report, get_dashboard_report, get_period_report},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Routes other than registration, log in and the category catalogue need a
/// bearer token, which the handlers check through the
/// [UserID](crate::UserID) extractor.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::PROFILE, get(get_profile).put(update_profile));

    let transaction_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        );

    let budget_routes = Router::new()
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(edit_budget_endpoint)
                .delete(delete_budget_endpoint),
        );

    let goal_routes = Router::new()
        .route(
            endpoints::GOALS,
            get(get_goals_endpoint).post(create_goal_endpoint),
        )
        .route(
            endpoints::GOAL,
            get(get_goal_endpoint)
                .put(edit_goal_endpoint)
                .delete(delete_goal_endpoint),
        )
        .route(
            endpoints::GOAL_CONTRIBUTIONS,
            post(contribute_to_goal_endpoint),
        );

    let report_routes = Router::new()
        .route(endpoints::DASHBOARD_REPORT, get(get_dashboard_report))
        .route(endpoints::CATEGORY_REPORT, get(get_category_report))
        .route(endpoints::PERIOD_REPORT, get(get_period_report));

    Router::new()
        .merge(auth_routes)
        .merge(transaction_routes)
        .merge(budget_routes)
        .merge(goal_routes)
        .merge(report_routes)
        .route(endpoints::CATEGORIES, get(get_categories))
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested route does not exist" })),
    )
        .into_response()
}
