use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, route::comment, AppState};

pub mod model;
pub mod query;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("not allowed to modify this post")]
	Forbidden,
}

pub type RouteError = error::RouteError<Error>;

/// Post routes, with comments nested under `/:id/comment`.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.patch_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.api_route("/:id/like", post_with(like_post, like_post_docs))
		.api_route("/:id/remove_like", post_with(remove_like, remove_like_docs))
		.nest("/:id/comment", comment::routes())
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
			Self::Forbidden => StatusCode::FORBIDDEN,
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		let message = error::Message::new(self.to_string());

		match self {
			Self::UnknownPost(post) => message.detail("post", post.to_string()).into_vec(),
			Self::Forbidden => message.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use crate::test::*;

	#[tokio::test]
	async fn test_creating_a_post_needs_authentication() {
		let app = app(lazy_pool());

		let response = app.post("/post").json(&json!({ "body": "hello" })).await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres DATABASE_URL"]
	async fn test_post_lifecycle(pool: Database) {
		let app = app(pool);
		let john = register(&app, "john").await;
		let jane = register(&app, "jane").await;

		let response = app
			.post("/post")
			.add_header(AUTHORIZATION, bearer(&john.access))
			.json(&json!({ "body": "hello world" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::CREATED);

		let post = response.json::<Value>();
		let id = post["id"].as_str().unwrap().to_owned();

		assert_eq!(post["author"]["username"], "john");
		assert_eq!(post["edited"], false);

		// Only the author may edit
		let response = app
			.patch(&format!("/post/{id}"))
			.add_header(AUTHORIZATION, bearer(&jane.access))
			.json(&json!({ "body": "hijacked" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

		let response = app
			.put(&format!("/post/{id}"))
			.add_header(AUTHORIZATION, bearer(&john.access))
			.json(&json!({ "body": "hello again" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["edited"], true);

		let response = app.get("/post").await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.json::<Value>()["count"], 1);

		let response = app
			.delete(&format!("/post/{id}"))
			.add_header(AUTHORIZATION, bearer(&john.access))
			.await;

		assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

		let response = app.get(&format!("/post/{id}")).await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[sqlx::test]
	#[ignore = "needs a postgres DATABASE_URL"]
	async fn test_likes(pool: Database) {
		let app = app(pool);
		let john = register(&app, "john").await;
		let jane = register(&app, "jane").await;

		let post = app
			.post("/post")
			.add_header(AUTHORIZATION, bearer(&john.access))
			.json(&json!({ "body": "like me" }))
			.await
			.json::<Value>();
		let id = post["id"].as_str().unwrap().to_owned();

		let response = app
			.post(&format!("/post/{id}/like"))
			.add_header(AUTHORIZATION, bearer(&jane.access))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let post = response.json::<Value>();

		assert_eq!(post["liked"], true);
		assert_eq!(post["likes_count"], 1);

		// Liking twice does not count twice
		let post = app
			.post(&format!("/post/{id}/like"))
			.add_header(AUTHORIZATION, bearer(&jane.access))
			.await
			.json::<Value>();

		assert_eq!(post["likes_count"], 1);

		let post = app
			.post(&format!("/post/{id}/like"))
			.add_header(AUTHORIZATION, bearer(&john.access))
			.await
			.json::<Value>();

		assert_eq!(post["likes_count"], 2);

		// Anonymous viewers never see a post as liked
		let post = app.get(&format!("/post/{id}")).await.json::<Value>();

		assert_eq!(post["liked"], false);
		assert_eq!(post["likes_count"], 2);

		let post = app
			.post(&format!("/post/{id}/remove_like"))
			.add_header(AUTHORIZATION, bearer(&jane.access))
			.await
			.json::<Value>();

		assert_eq!(post["liked"], false);
		assert_eq!(post["likes_count"], 1);
	}
}
