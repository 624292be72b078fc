pub use crate::route::model::{IdInput, Paginate};

use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::user::model::User;

/// A single post, written by a user.
#[model]
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Post {
	/// The public identifier of the post.
	#[serde(rename = "id", skip_deserializing)]
	pub public_id: Uuid,
	/// The user that wrote the post.
	#[serde(skip_deserializing)]
	pub author: User,
	/// The content of the post.
	#[validate(length(min = 1, max = 10000))]
	pub body: String,
	/// Whether the post was changed after it was created.
	#[serde(skip_deserializing)]
	pub edited: bool,
	/// Whether the requesting user has liked the post. Always false for anonymous requests.
	#[serde(skip_deserializing)]
	pub liked: bool,
	/// The number of users that liked the post.
	#[serde(skip_deserializing)]
	pub likes_count: i64,
	/// The number of comments on the post.
	#[serde(skip_deserializing)]
	pub comments_count: i64,
	#[serde(skip_deserializing)]
	pub created: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub updated: DateTime<Utc>,
}

/// A post as read from the database, before the author is attached.
#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
	pub id: i64,
	pub public_id: Uuid,
	pub author_id: i64,
	pub body: String,
	pub edited: bool,
	pub created: DateTime<Utc>,
	pub updated: DateTime<Utc>,
	pub likes_count: i64,
	pub comments_count: i64,
	pub liked: bool,
}

impl PostRow {
	pub fn into_post(self, author: User, viewer: Option<&User>) -> Post {
		Post {
			public_id: self.public_id,
			author,
			body: self.body,
			edited: self.edited,
			liked: viewer.is_some() && self.liked,
			likes_count: self.likes_count,
			comments_count: self.comments_count,
			created: self.created,
			updated: self.updated,
		}
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PostFilter {
	/// Only return posts written by the user with this public id.
	pub author: Option<Uuid>,
}

#[cfg(test)]
mod test {
	use super::*;

	fn row(liked: bool) -> PostRow {
		PostRow {
			id: 1,
			public_id: Uuid::new_v4(),
			author_id: 1,
			body: "hello".into(),
			edited: false,
			created: Utc::now(),
			updated: Utc::now(),
			likes_count: 3,
			comments_count: 0,
			liked,
		}
	}

	#[test]
	fn test_anonymous_viewer_never_liked() {
		let post = row(true).into_post(User::default(), None);

		assert!(!post.liked);
		assert_eq!(post.likes_count, 3);
	}

	#[test]
	fn test_authenticated_viewer_liked() {
		let viewer = User::default();

		assert!(row(true).into_post(User::default(), Some(&viewer)).liked);
		assert!(!row(false).into_post(User::default(), Some(&viewer)).liked);
	}

	#[test]
	fn test_serialized_post() {
		let post = row(false).into_post(User::default(), None);
		let value = serde_json::to_value(&post).unwrap();

		assert_eq!(value["id"], post.public_id.to_string());
		assert_eq!(value["likes_count"], 3);
		assert_eq!(value["liked"], false);
		assert!(value["author"].get("password").is_none());
	}

	#[test]
	fn test_post_inputs_only_accept_body() {
		let create = serde_json::from_value::<CreatePost>(serde_json::json!({
			"body": "hello",
			"edited": true,
			"likes_count": 100,
		}))
		.unwrap();

		assert_eq!(create.body, "hello");
		assert!(create.validate().is_ok());

		let update = serde_json::from_value::<UpdatePost>(serde_json::json!({})).unwrap();

		assert!(update.body.is_none());
	}

	#[test]
	fn test_empty_body_is_rejected() {
		let create = CreatePost { body: String::new() };

		assert!(create.validate().is_err());
	}
}
