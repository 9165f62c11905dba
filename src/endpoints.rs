//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/goals/{goal_id}', use [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for getting and updating the current user's profile.
pub const PROFILE: &str = "/api/auth/profile";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/auth/logout";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";

/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to access a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";

/// The route to list and create goals.
pub const GOALS: &str = "/api/goals";
/// The route to access a single goal.
pub const GOAL: &str = "/api/goals/{goal_id}";
/// The route to add money to a goal.
pub const GOAL_CONTRIBUTIONS: &str = "/api/goals/{goal_id}/contributions";

/// The route for the dashboard summary.
pub const DASHBOARD_REPORT: &str = "/api/reports/dashboard";
/// The route for totals per category.
pub const CATEGORY_REPORT: &str = "/api/reports/by-category";
/// The route for totals per day, week or month.
pub const PERIOD_REPORT: &str = "/api/reports/by-period";

/// The route for the built-in category catalogue.
pub const CATEGORIES: &str = "/api/categories";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter starts with a left brace and ends with a right brace, e.g.
/// '{goal_id}' in '/api/goals/{goal_id}'. Only the first parameter is replaced.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |offset| param_start + offset + 1);

    format!(
        "{}{id}{}",
        &endpoint_path[..param_start],
        &endpoint_path[param_end..]
    )
}
