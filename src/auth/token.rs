//! Bearer tokens and the extractor that resolves them to a user.
//!
//! A token is the user's ID with a `user-` prefix, e.g. `user-42`. Tokens are
//! not signed and never expire: this is a placeholder for real authentication,
//! anyone who knows or guesses a user ID can act as that user.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    user::{UserID, get_user_by_id},
};

const TOKEN_PREFIX: &str = "user-";

/// Create the bearer token for `user_id`.
pub fn encode_token(user_id: UserID) -> String {
    format!("{TOKEN_PREFIX}{user_id}")
}

/// Get the user ID from a bearer token.
///
/// # Errors
/// Returns [Error::InvalidToken] if `token` is not of the form `user-<id>`.
pub fn decode_token(token: &str) -> Result<UserID, Error> {
    token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|id| id.parse::<i64>().ok())
        .map(UserID::new)
        .ok_or(Error::InvalidToken)
}

/// The state needed to authenticate users and manage their accounts.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for UserID
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|rejection| {
                if rejection.is_missing() {
                    Error::MissingToken
                } else {
                    Error::InvalidToken
                }
            })?;

        let user_id = decode_token(bearer.token())?;

        let state = AuthState::from_ref(state);
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_id(user_id, &connection) {
            Ok(_) => Ok(user_id),
            Err(Error::NotFound) => Err(Error::InvalidToken),
            Err(error) => Err(error),
        }
    }
}
