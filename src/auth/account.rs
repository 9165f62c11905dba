//! Route handlers for registering, logging in, logging out and managing the
//! current user's profile.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Error,
    aggregation::compute_balance,
    app_state::lock_connection,
    auth::{AuthState, encode_token},
    transaction::{TransactionFilter, get_transactions},
    user::{
        User, UserID, UserProfile, create_user, get_user_by_email, get_user_by_id, update_user,
    },
};

/// The data for registering a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The email address the user will log in with.
    pub email: String,
    /// The user's password.
    pub password: String,
    /// The user's display name.
    pub name: String,
}

/// The credentials entered at log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInForm {
    /// Email entered during log in.
    pub email: String,
    /// Password entered during log in.
    pub password: String,
}

/// The changes to make to the user's profile. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// The new display name.
    pub name: Option<String>,
    /// The new email address.
    pub email: Option<String>,
}

/// The response to a successful registration or log in.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// The user's profile.
    pub user: UserProfile,
    /// The bearer token to send with later requests.
    pub token: String,
}

/// Register a new user and log them in.
///
/// Responds with 201 Created, the new user's profile and their token.
pub async fn register_user(
    State(state): State<AuthState>,
    Json(form): Json<RegisterForm>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = create_user(&form.email, &form.name, &form.password, &connection)?;
    tracing::info!("Registered user {}", user.id);

    let response = auth_response(user, &connection)?;

    Ok((StatusCode::CREATED, response).into_response())
}

/// Log in a user with their email and password.
pub async fn post_log_in(
    State(state): State<AuthState>,
    Json(form): Json<LogInForm>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = match get_user_by_email(&form.email, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    if user.password != form.password {
        return Err(Error::InvalidCredentials);
    }

    Ok(auth_response(user, &connection)?.into_response())
}

/// Log out the current user.
///
/// Tokens are stateless so there is nothing to invalidate on the server,
/// the client is expected to discard its token.
pub async fn post_log_out(user_id: UserID) -> Json<serde_json::Value> {
    tracing::debug!("User {user_id} logged out");

    Json(json!({ "message": "Logged out successfully" }))
}

/// Get the current user's profile, including their balance.
pub async fn get_profile(
    State(state): State<AuthState>,
    user_id: UserID,
) -> Result<Json<UserProfile>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = get_user_by_id(user_id, &connection)?;

    Ok(Json(load_profile(user, &connection)?))
}

/// Change the current user's name and/or email.
pub async fn update_profile(
    State(state): State<AuthState>,
    user_id: UserID,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = update_user(
        user_id,
        update.name.as_deref(),
        update.email.as_deref(),
        &connection,
    )?;

    Ok(Json(load_profile(user, &connection)?))
}

/// Build the public profile of `user`, deriving their balance from the ledger.
///
/// # Errors
/// Returns an error if the user's transactions could not be read.
pub fn load_profile(user: User, connection: &Connection) -> Result<UserProfile, Error> {
    let transactions = get_transactions(user.id, &TransactionFilter::default(), connection)?;
    let balance = compute_balance(&transactions);

    Ok(UserProfile::new(user, balance))
}

fn auth_response(user: User, connection: &Connection) -> Result<Json<AuthResponse>, Error> {
    let token = encode_token(user.id);
    let user = load_profile(user, connection)?;

    Ok(Json(AuthResponse { user, token }))
}
