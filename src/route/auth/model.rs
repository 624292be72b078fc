use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::route::user::{
	manager::NewUser,
	model::{validate_username, User},
};

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	/// The unique name displayed to other users.
	#[validate(length(min = 1, max = 50), custom(function = "validate_username"))]
	pub username: String,
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	#[serde(default)]
	#[validate(length(max = 50))]
	pub first_name: String,
	#[serde(default)]
	#[validate(length(max = 50))]
	pub last_name: String,
	#[serde(default)]
	#[validate(length(max = 1000))]
	pub bio: String,
	#[serde(default)]
	#[validate(length(max = 500))]
	pub avatar: String,
}

impl From<RegisterInput> for NewUser {
	fn from(input: RegisterInput) -> Self {
		Self {
			first_name: input.first_name,
			last_name: input.last_name,
			bio: input.bio,
			avatar: input.avatar,
			..Self::new(input.username, input.email, input.password)
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RefreshInput {
	/// A refresh token from `/auth/login` or `/auth/register`.
	pub refresh: String,
}

/// The authenticated user along with a fresh token pair.
#[derive(Serialize, JsonSchema)]
pub struct Tokens {
	pub user: User,
	/// A short-lived token for the `Authorization: Bearer` header.
	pub access: String,
	/// A long-lived token that can be exchanged for a new access token.
	pub refresh: String,
}

#[derive(Serialize, JsonSchema)]
pub struct AccessToken {
	pub access: String,
}
