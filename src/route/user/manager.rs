//! Creation and lookup of users outside of the request handlers.

use std::collections::HashMap;

use argon2::{
	password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
	Argon2,
};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::{model::User, Error, RouteError};
use crate::Database;

/// The fields needed to create a user.
///
/// `username`, `email` and `password` are required. They are optional here
/// so that [`create_user`] is the single place that enforces it.
#[derive(Debug, Default)]
pub struct NewUser {
	pub username: Option<String>,
	pub email: Option<String>,
	pub password: Option<String>,
	pub first_name: String,
	pub last_name: String,
	pub bio: String,
	pub avatar: String,
}

impl NewUser {
	pub fn new(
		username: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self {
			username: Some(username.into()),
			email: Some(email.into()),
			password: Some(password.into()),
			..Default::default()
		}
	}

	/// Checks that the required fields are present, returning the username,
	/// the normalised email and the password.
	fn require(&self) -> Result<(&str, String, &str), Error> {
		let username = required(self.username.as_deref(), "username")?;
		let email = required(self.email.as_deref(), "email")?;
		let password = required(self.password.as_deref(), "password")?;

		Ok((username, normalize_email(email), password))
	}
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, Error> {
	value
		.filter(|value| !value.is_empty())
		.ok_or(Error::MissingField(field))
}

/// Lower-cases the domain part of an email address. The local part is
/// left alone since it may be case sensitive.
pub fn normalize_email(email: &str) -> String {
	let email = email.trim();

	match email.rsplit_once('@') {
		Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
		None => email.to_owned(),
	}
}

/// Hashes a password into a PHC string with a random salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
) -> Result<String, argon2::password_hash::Error> {
	let salt = SaltString::generate(&mut OsRng);

	Ok(hasher.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Maps unique constraint violations on `"user"` to their route errors.
pub fn map_unique_violation(error: sqlx::Error) -> RouteError {
	if let sqlx::Error::Database(ref database_error) = error {
		match database_error.constraint() {
			Some("user_email_key") => return Error::EmailTaken.into(),
			Some("user_username_key") => return Error::UsernameTaken.into(),
			_ => {}
		}
	}

	error.into()
}

/// Creates a regular user, hashing the password before it is stored.
pub async fn create_user(
	conn: &mut PgConnection,
	hasher: &Argon2<'_>,
	new: NewUser,
) -> Result<User, RouteError> {
	let (username, email, password) = new.require()?;
	let hashed = hash_password(hasher, password)?;

	let user = sqlx::query_as::<_, User>(
		r#"
			INSERT INTO "user" (public_id, username, email, password, first_name, last_name, bio, avatar)
			VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
			RETURNING *
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(username)
	.bind(email)
	.bind(hashed)
	.bind(&new.first_name)
	.bind(&new.last_name)
	.bind(&new.bio)
	.bind(&new.avatar)
	.fetch_one(&mut *conn)
	.await
	.map_err(map_unique_violation)?;

	tracing::info!(user = %user.public_id, name = %user.name().trim(), "created user");

	Ok(user)
}

/// Creates a user through [`create_user`] and elevates it to superuser.
pub async fn create_superuser(
	database: &Database,
	hasher: &Argon2<'_>,
	new: NewUser,
) -> Result<User, RouteError> {
	let mut tx = database.begin().await?;

	let user = create_user(&mut tx, hasher, new).await?;
	let user = sqlx::query_as::<_, User>(
		r#"
			UPDATE "user" SET is_superuser = TRUE, updated = NOW()
			WHERE id = $1
			RETURNING *
		"#,
	)
	.bind(user.id)
	.fetch_one(&mut *tx)
	.await?;

	tx.commit().await?;

	tracing::info!(user = %user.public_id, "elevated user to superuser");

	Ok(user)
}

pub async fn get_by_uuid<'c>(
	executor: impl PgExecutor<'c>,
	public_id: Uuid,
) -> Result<Option<User>, sqlx::Error> {
	sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE public_id = $1"#)
		.bind(public_id)
		.fetch_optional(executor)
		.await
}

/// Resolves a user by the public id as given by a client.
///
/// A malformed id cannot belong to anyone, so it resolves to `None` just
/// like an unknown one.
pub async fn get_by_public_id<'c>(
	executor: impl PgExecutor<'c>,
	public_id: &str,
) -> Result<Option<User>, sqlx::Error> {
	match parse_public_id(public_id) {
		Some(public_id) => get_by_uuid(executor, public_id).await,
		None => Ok(None),
	}
}

pub fn parse_public_id(public_id: &str) -> Option<Uuid> {
	Uuid::parse_str(public_id.trim()).ok()
}

/// Looks up a user by an already normalised email address.
pub async fn get_by_email<'c>(
	executor: impl PgExecutor<'c>,
	email: &str,
) -> Result<Option<User>, sqlx::Error> {
	sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
		.bind(email)
		.fetch_optional(executor)
		.await
}

/// Loads several users at once, keyed by their internal id.
pub async fn get_many<'c>(
	executor: impl PgExecutor<'c>,
	ids: &[i64],
) -> Result<HashMap<i64, User>, sqlx::Error> {
	let users = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = ANY($1)"#)
		.bind(ids)
		.fetch_all(executor)
		.await?;

	Ok(users.into_iter().map(|user| (user.id, user)).collect())
}
