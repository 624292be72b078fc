use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod manager;
pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown user {0}")]
	UnknownUser(String),
	#[error("not allowed to modify this user")]
	Forbidden,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
	#[error("{0} is required to create a user")]
	MissingField(&'static str),
}

pub type RouteError = error::RouteError<Error>;

/// Users can only be listed, fetched and partially updated. Accounts are
/// created through `/auth/register`.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", get_with(list_users, list_users_docs))
		.api_route(
			"/:id",
			get_with(get_user, get_user_docs).patch_with(update_user, update_user_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::Forbidden => StatusCode::FORBIDDEN,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
			Self::MissingField(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::UnknownUser(ref user) => {
				let user = user.clone();

				error::Message::new(self.to_string())
					.detail("user", user)
					.into_vec()
			}
			Self::UsernameTaken => error::Message::new(self.to_string())
				.field("username")
				.into_vec(),
			Self::EmailTaken => error::Message::new(self.to_string())
				.field("email")
				.into_vec(),
			Self::Forbidden => error::Message::new(self.to_string()).into_vec(),
			Self::MissingField(..) => error::Message::new("internal server error").into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use crate::test::*;

	#[tokio::test]
	async fn test_listing_users_needs_authentication() {
		let app = app(lazy_pool());

		let response = app.get("/user").await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres DATABASE_URL"]
	async fn test_superusers_are_only_listed_for_superusers(pool: Database) {
		let app = app(pool.clone());
		let john = register(&app, "john").await;
		let admin = superuser(&app, &pool, "admin").await;

		let response = app
			.get("/user")
			.add_header(AUTHORIZATION, bearer(&john.access))
			.await;

		assert_eq!(response.json::<Value>()["count"], 1);

		let response = app
			.get(&format!("/user/{}", admin.id))
			.add_header(AUTHORIZATION, bearer(&john.access))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

		let response = app
			.get("/user")
			.add_header(AUTHORIZATION, bearer(&admin.access))
			.await;

		assert_eq!(response.json::<Value>()["count"], 2);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres DATABASE_URL"]
	async fn test_users_can_only_update_themselves(pool: Database) {
		let app = app(pool.clone());
		let john = register(&app, "john").await;
		let jane = register(&app, "jane").await;
		let admin = superuser(&app, &pool, "admin").await;

		let response = app
			.patch(&format!("/user/{}", jane.id))
			.add_header(AUTHORIZATION, bearer(&john.access))
			.json(&json!({ "bio": "hacked" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

		let response = app
			.patch(&format!("/user/{}", john.id))
			.add_header(AUTHORIZATION, bearer(&john.access))
			.json(&json!({ "bio": "hello", "email": "John@Example.ORG" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let body = response.json::<Value>();

		assert_eq!(body["bio"], "hello");
		assert_eq!(body["email"], "John@example.org");
		assert_eq!(body["username"], "john");

		let response = app
			.patch(&format!("/user/{}", jane.id))
			.add_header(AUTHORIZATION, bearer(&admin.access))
			.json(&json!({ "first_name": "Jane" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres DATABASE_URL"]
	async fn test_malformed_user_id_is_unknown(pool: Database) {
		let app = app(pool);
		let john = register(&app, "john").await;

		let response = app
			.get("/user/not-a-uuid")
			.add_header(AUTHORIZATION, bearer(&john.access))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}
}
