//! Budgets, i.e. spending limits for a category over a date window, and
//! their route handlers.

mod core;
mod endpoints;

pub use core::{
    Budget, BudgetId, BudgetPeriod, BudgetUpdate, NewBudget, create_budget, create_budget_table,
    delete_budget, get_budget, get_budgets, update_budget,
};
pub use endpoints::{
    create_budget_endpoint, delete_budget_endpoint, edit_budget_endpoint, get_budget_endpoint,
    get_budgets_endpoint,
};
