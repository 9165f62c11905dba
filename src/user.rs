//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// This type holds the user's password and so is never sent to clients,
/// use [UserProfile] instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's display name.
    pub name: String,
    /// The user's password.
    ///
    /// Stored as given: the bearer token scheme is a placeholder for real
    /// authentication and offers no protection worth hashing for.
    pub password: String,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// The public view of a user, including their derived balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's ID.
    pub id: UserID,
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    pub name: String,
    /// Total income minus total expenses over all of the user's transactions.
    pub balance: Decimal,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserProfile {
    /// Create the public profile for `user` with the given `balance`.
    pub fn new(user: User, balance: Decimal) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            balance,
            created_at: user.created_at,
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// Leading and trailing whitespace is removed from `email` and `name`.
///
/// # Errors
///
/// Returns a:
/// - [Error::EmptyField] if `email`, `name` or `password` is empty,
/// - [Error::DuplicateEmail] if another user already has `email`,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    email: &str,
    name: &str,
    password: &str,
    connection: &Connection,
) -> Result<User, Error> {
    let email = non_empty(email, "email")?;
    let name = non_empty(name, "name")?;

    if password.is_empty() {
        return Err(Error::EmptyField("password"));
    }

    let user = connection
        .prepare(
            "INSERT INTO user (email, name, password, created_at) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, email, name, password, created_at",
        )?
        .query_row(
            (email, name, password, OffsetDateTime::now_utc()),
            map_user_row,
        )?;

    Ok(user)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, email, name, password, created_at FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has registered with `email`, or
/// [Error::SqlError] if some other SQL related error occurred.
pub fn get_user_by_email(email: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, email, name, password, created_at FROM user WHERE email = :email")?
        .query_row(&[(":email", email.trim())], map_user_row)
        .map_err(|error| error.into())
}

/// Change the name and/or email of the user with `user_id`.
///
/// Fields set to `None` are left unchanged.
///
/// # Errors
///
/// Returns a:
/// - [Error::EmptyField] if `name` or `email` is given but empty,
/// - [Error::DuplicateEmail] if another user already has `email`,
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn update_user(
    user_id: UserID,
    name: Option<&str>,
    email: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let name = name.map(|name| non_empty(name, "name")).transpose()?;
    let email = email.map(|email| non_empty(email, "email")).transpose()?;

    connection
        .prepare(
            "UPDATE user SET name = COALESCE(?1, name), email = COALESCE(?2, email)
             WHERE id = ?3
             RETURNING id, email, name, password, created_at",
        )?
        .query_row((name, email, user_id.as_i64()), map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
#[cfg(test)]
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn non_empty<'a>(text: &'a str, field: &'static str) -> Result<&'a str, Error> {
    let text = text.trim();

    if text.is_empty() {
        Err(Error::EmptyField(field))
    } else {
        Ok(text)
    }
}
