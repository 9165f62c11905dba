//! Savings goals, contributions towards them and their route handlers.

mod contribution_endpoint;
mod core;
mod endpoints;

pub use contribution_endpoint::contribute_to_goal_endpoint;
pub use core::{
    Goal, GoalId, GoalUpdate, NewGoal, adjust_goal_amount, create_goal, create_goal_table,
    delete_goal, find_goal_by_name, get_goal, get_goals, update_goal,
};
pub use endpoints::{
    GoalState, create_goal_endpoint, delete_goal_endpoint, edit_goal_endpoint, get_goal_endpoint,
    get_goals_endpoint,
};
