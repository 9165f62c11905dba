#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, build_router, endpoints, initialize_db,
    user::{User, create_user},
};

pub(crate) const TEST_EMAIL: &str = "test@example.com";
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    initialize_db(&connection).expect("Could not initialize database");
    connection
}

#[track_caller]
pub(crate) fn create_test_user(connection: &Connection) -> User {
    create_user(TEST_EMAIL, "Test User", TEST_PASSWORD, connection)
        .expect("Could not create test user")
}

#[track_caller]
pub(crate) fn get_test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");
    AppState::new(connection).expect("Could not create app state")
}

/// A server running the full router against a fresh in-memory database.
#[track_caller]
pub(crate) fn get_test_server() -> TestServer {
    TestServer::new(build_router(get_test_state()))
}

/// Register a user through the API and return their bearer token.
pub(crate) async fn register_user(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({ "email": email, "password": password, "name": "Test User" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    response.json::<Value>()["token"]
        .as_str()
        .expect("Registration response is missing a token")
        .to_owned()
}

/// Register the standard test user and return their bearer token.
pub(crate) async fn register_test_user(server: &TestServer) -> String {
    register_user(server, TEST_EMAIL, TEST_PASSWORD).await
}
