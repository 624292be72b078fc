use argon2::{
	password_hash::{PasswordHash, PasswordVerifier},
	Argon2,
};
use chrono::{DateTime, Utc};
use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub use crate::route::model::Paginate;

/// Letters, digits and `@ . + - _`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username
		.chars()
		.any(|c| !c.is_alphanumeric() && !matches!(c, '@' | '.' | '+' | '-' | '_'))
	{
		let mut error = ValidationError::new("invalid_username");
		error.message = Some("username may only contain letters, digits and @ . + - _".into());

		return Err(error);
	}

	Ok(())
}

/// A single user.
///
/// The internal key, the password hash and the superuser flag are never sent
/// to clients; the public id is exposed as `id`.
#[model(create = false)]
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, Validate, sqlx::FromRow)]
pub struct User {
	#[serde(skip)]
	pub id: i64,
	/// The public identifier of the user.
	#[serde(rename = "id", skip_deserializing)]
	pub public_id: Uuid,
	/// The unique name displayed to other users.
	#[validate(length(min = 1, max = 50), custom(function = "validate_username"))]
	pub username: String,
	#[validate(length(max = 50))]
	pub first_name: String,
	#[validate(length(max = 50))]
	pub last_name: String,
	/// The unique email address used to log in.
	#[validate(email)]
	pub email: String,
	/// Argon2 hash in PHC string format.
	#[serde(skip)]
	pub password: String,
	#[validate(length(max = 1000))]
	pub bio: String,
	/// A URL pointing to the user's avatar.
	#[validate(length(max = 500))]
	pub avatar: String,
	#[serde(skip_deserializing)]
	pub is_active: bool,
	#[serde(skip)]
	pub is_superuser: bool,
	#[serde(skip_deserializing)]
	pub created: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub updated: DateTime<Utc>,
}

impl User {
	pub fn name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}

	/// Superusers are hidden from everyone except other superusers.
	pub fn can_see(&self, other: &User) -> bool {
		self.is_superuser || !other.is_superuser
	}

	/// Whether this user may change or delete something owned by `owner_id`.
	pub fn can_modify(&self, owner_id: i64) -> bool {
		self.is_superuser || self.id == owner_id
	}

	pub fn check_password(&self, hasher: &Argon2, password: &str) -> bool {
		PasswordHash::new(&self.password)
			.is_ok_and(|hash| hasher.verify_password(password.as_bytes(), &hash).is_ok())
	}
}

/// The public id of a user, taken from the path as-is so that a malformed
/// id is reported the same way as an unknown one.
#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct PublicIdInput {
	pub id: String,
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	fn user(id: i64, is_superuser: bool) -> User {
		User {
			id,
			public_id: Uuid::new_v4(),
			username: format!("user{id}"),
			email: format!("user{id}@example.com"),
			password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA".into(),
			is_active: true,
			is_superuser,
			..Default::default()
		}
	}

	#[test]
	fn test_serialized_user_hides_secrets() {
		let user = user(7, true);
		let value = serde_json::to_value(&user).unwrap();

		assert_eq!(value["id"], user.public_id.to_string());
		assert_eq!(value["username"], "user7");
		assert!(value.get("password").is_none());
		assert!(value.get("is_superuser").is_none());
		assert_eq!(value["is_active"], true);
	}

	#[test]
	fn test_superusers_are_hidden_from_regular_users() {
		let regular = user(1, false);
		let other = user(2, false);
		let admin = user(3, true);

		assert!(regular.can_see(&other));
		assert!(!regular.can_see(&admin));
		assert!(admin.can_see(&regular));
		assert!(admin.can_see(&admin));
	}

	#[test]
	fn test_only_owner_or_superuser_can_modify() {
		let regular = user(1, false);
		let admin = user(3, true);

		assert!(regular.can_modify(1));
		assert!(!regular.can_modify(2));
		assert!(admin.can_modify(1));
	}

	#[test]
	fn test_update_user_fields_are_optional() {
		let update = serde_json::from_value::<UpdateUser>(serde_json::json!({ "bio": "hello" })).unwrap();

		assert_eq!(update.bio.as_deref(), Some("hello"));
		assert!(update.username.is_none());
		assert!(update.validate().is_ok());
	}

	#[test]
	fn test_update_user_is_validated() {
		let update = serde_json::from_value::<UpdateUser>(serde_json::json!({
			"username": "no spaces",
			"email": "not-an-email",
		}))
		.unwrap();

		let errors = update.validate().unwrap_err();
		let fields = errors.field_errors();

		assert!(fields.contains_key("username"));
		assert!(fields.contains_key("email"));
	}

	#[test]
	fn test_update_user_ignores_server_fields() {
		let update = serde_json::from_value::<UpdateUser>(serde_json::json!({
			"is_superuser": true,
			"is_active": false,
			"password": "hunter2hunter",
		}))
		.unwrap();

		assert!(update.username.is_none());
		assert!(update.email.is_none());
	}

	#[test]
	fn test_check_password_with_garbage_hash() {
		let mut user = user(1, false);
		user.password = "plaintext".into();

		assert!(!user.check_password(&Argon2::default(), "plaintext"));
	}

	#[test]
	fn test_name() {
		let user = User {
			first_name: "John".into(),
			last_name: "Smith".into(),
			..Default::default()
		};

		assert_eq!(user.name(), "John Smith");
	}
}
