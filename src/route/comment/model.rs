pub use crate::route::model::Paginate;

use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::user::model::User;

/// A comment on a post.
#[model]
#[derive(Debug, Deserialize, Serialize, JsonSchema, Validate)]
pub struct Comment {
	/// The public identifier of the comment.
	#[serde(rename = "id", skip_deserializing)]
	pub public_id: Uuid,
	/// The public identifier of the post the comment belongs to.
	#[serde(skip_deserializing)]
	pub post: Uuid,
	#[serde(skip_deserializing)]
	pub author: User,
	#[validate(length(min = 1, max = 2000))]
	pub body: String,
	#[serde(skip_deserializing)]
	pub edited: bool,
	#[serde(skip_deserializing)]
	pub created: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub updated: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CommentRow {
	pub id: i64,
	pub public_id: Uuid,
	pub post_id: i64,
	pub author_id: i64,
	pub body: String,
	pub edited: bool,
	pub created: DateTime<Utc>,
	pub updated: DateTime<Utc>,
}

impl CommentRow {
	pub fn into_comment(self, post: Uuid, author: User) -> Comment {
		Comment {
			public_id: self.public_id,
			post,
			author,
			body: self.body,
			edited: self.edited,
			created: self.created,
			updated: self.updated,
		}
	}
}

/// `/post/:id/comment`
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PostPath {
	/// The public id of the post.
	pub id: Uuid,
}

/// `/post/:id/comment/:comment_id`
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CommentPath {
	/// The public id of the post.
	pub id: Uuid,
	/// The public id of the comment.
	pub comment_id: Uuid,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_serialized_comment() {
		let post = Uuid::new_v4();
		let row = CommentRow {
			id: 7,
			public_id: Uuid::new_v4(),
			post_id: 3,
			author_id: 1,
			body: "nice".into(),
			edited: false,
			created: Utc::now(),
			updated: Utc::now(),
		};
		let public_id = row.public_id;

		let value = serde_json::to_value(row.into_comment(post, User::default())).unwrap();

		assert_eq!(value["id"], public_id.to_string());
		assert_eq!(value["post"], post.to_string());
		assert_eq!(value["body"], "nice");
		assert!(value.get("post_id").is_none());
	}

	#[test]
	fn test_comment_body_bounds() {
		assert!(CreateComment { body: String::new() }.validate().is_err());
		assert!(CreateComment { body: "a".repeat(2001) }.validate().is_err());
		assert!(UpdateComment { body: None }.validate().is_ok());
	}
}
