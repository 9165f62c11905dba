use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    app_state::lock_connection,
    date_range::parse_date,
    goal::{
        Goal, GoalId, GoalUpdate, NewGoal, create_goal, delete_goal, get_goal, get_goals,
        update_goal,
    },
    user::UserID,
};

/// The state needed to manage savings goals.
#[derive(Debug, Clone)]
pub struct GoalState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a goal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalForm {
    name: String,
    target_amount: Decimal,
    deadline: String,
}

/// The request body for editing a goal. Omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditGoalForm {
    name: Option<String>,
    target_amount: Option<Decimal>,
    current_amount: Option<Decimal>,
    deadline: Option<String>,
}

/// A route handler for listing the current user's goals, oldest first.
pub async fn get_goals_endpoint(
    State(state): State<GoalState>,
    user_id: UserID,
) -> Result<Json<Vec<Goal>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_goals(user_id, &connection).map(Json)
}

/// A route handler for getting a single goal.
pub async fn get_goal_endpoint(
    State(state): State<GoalState>,
    user_id: UserID,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<Goal>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_goal(goal_id, user_id, &connection).map(Json)
}

/// A route handler for creating a goal with nothing saved yet.
pub async fn create_goal_endpoint(
    State(state): State<GoalState>,
    user_id: UserID,
    Json(form): Json<CreateGoalForm>,
) -> Result<Response, Error> {
    let new_goal = NewGoal {
        name: form.name,
        target_amount: form.target_amount,
        deadline: parse_date(&form.deadline)?,
    };

    let connection = lock_connection(&state.db_connection)?;
    let goal = create_goal(user_id, new_goal, &connection)?;

    Ok((StatusCode::CREATED, Json(goal)).into_response())
}

/// A route handler for changing some or all fields of a goal.
///
/// Setting `currentAmount` overwrites the saved amount, use the contributions
/// endpoint to add to it.
pub async fn edit_goal_endpoint(
    State(state): State<GoalState>,
    user_id: UserID,
    Path(goal_id): Path<GoalId>,
    Json(form): Json<EditGoalForm>,
) -> Result<Json<Goal>, Error> {
    let update = GoalUpdate {
        name: form.name,
        target_amount: form.target_amount,
        current_amount: form.current_amount,
        deadline: form.deadline.as_deref().map(parse_date).transpose()?,
    };

    let connection = lock_connection(&state.db_connection)?;

    update_goal(goal_id, user_id, update, &connection).map(Json)
}

/// A route handler for deleting a goal.
pub async fn delete_goal_endpoint(
    State(state): State<GoalState>,
    user_id: UserID,
    Path(goal_id): Path<GoalId>,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_goal(goal_id, user_id, &connection)?;

    Ok(Json(json!({ "message": "Goal deleted successfully" })))
}
