//! Helpers shared by the route tests.

pub use axum::http::{header::AUTHORIZATION, HeaderValue};
pub use serde_json::{json, Value};

pub use crate::Database;

use argon2::Argon2;
use axum_test::TestServer;
use sqlx::postgres::PgPoolOptions;

use crate::{
	extract::AUTHORIZATION_PREFIX,
	route::user::manager::{self, NewUser},
	token::Keys,
	AppState,
};

pub const PASSWORD: &str = "hunter2hunter";

/// A registered account and its access token.
pub struct Account {
	pub id: String,
	pub access: String,
}

pub fn keys() -> Keys {
	Keys::new(b"test-secret", 300, 86_400)
}

pub fn state(database: Database) -> AppState {
	AppState {
		database,
		hasher: Argon2::default(),
		keys: keys(),
	}
}

pub fn app(database: Database) -> TestServer {
	TestServer::new(crate::app(state(database), &[])).unwrap()
}

/// A pool that never connects, for requests that are rejected before
/// touching the database.
pub fn lazy_pool() -> Database {
	PgPoolOptions::new()
		.connect_lazy("postgres://localhost/unused")
		.unwrap()
}

pub fn bearer(token: &str) -> HeaderValue {
	HeaderValue::from_str(&format!("{AUTHORIZATION_PREFIX}{token}")).unwrap()
}

pub async fn register(app: &TestServer, username: &str) -> Account {
	let body = app
		.post("/auth/register")
		.json(&json!({
			"email": format!("{username}@example.com"),
			"username": username,
			"password": PASSWORD,
		}))
		.await
		.json::<Value>();

	Account {
		id: body["user"]["id"].as_str().unwrap().to_owned(),
		access: body["access"].as_str().unwrap().to_owned(),
	}
}

/// Creates a superuser directly and logs in as them.
pub async fn superuser(app: &TestServer, database: &Database, username: &str) -> Account {
	let email = format!("{username}@example.com");
	let user = manager::create_superuser(
		database,
		&Argon2::default(),
		NewUser::new(username, email.as_str(), PASSWORD),
	)
	.await
	.unwrap();

	let body = app
		.post("/auth/login")
		.json(&json!({ "email": email, "password": PASSWORD }))
		.await
		.json::<Value>();

	Account {
		id: user.public_id.to_string(),
		access: body["access"].as_str().unwrap().to_owned(),
	}
}

/// Creates a post and returns its public id.
pub async fn create_post(app: &TestServer, author: &Account, body: &str) -> String {
	app.post("/post")
		.add_header(AUTHORIZATION, bearer(&author.access))
		.json(&json!({ "body": body }))
		.await
		.json::<Value>()["id"]
		.as_str()
		.unwrap()
		.to_owned()
}
