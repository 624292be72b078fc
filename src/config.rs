use std::{env, str::FromStr};

use axum::http::HeaderValue;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// Credentials for the superuser created at startup, if configured.
#[derive(Debug, Clone)]
pub struct Superuser {
	pub username: String,
	pub email: String,
	pub password: String,
}

/// Application configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub database_max_connections: u32,
	pub host: String,
	pub port: u16,
	pub jwt_secret: String,
	pub access_ttl_seconds: i64,
	pub refresh_ttl_seconds: i64,
	/// An empty list allows any origin.
	pub cors_allowed_origins: Vec<HeaderValue>,
	pub log_level: Level,
	pub superuser: Option<Superuser>,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Ok(Self {
			database_url: required("DATABASE_URL")?,
			database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
			host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
			port: parsed("PORT", 3000)?,
			jwt_secret: required("JWT_SECRET")?,
			access_ttl_seconds: parsed("JWT_ACCESS_TTL_SECONDS", 5 * 60)?,
			refresh_ttl_seconds: parsed("JWT_REFRESH_TTL_SECONDS", 24 * 60 * 60)?,
			cors_allowed_origins: origins(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default())?,
			log_level: parsed("LOG_LEVEL", Level::INFO)?,
			superuser: superuser()?,
		})
	}
}

fn optional(name: &str) -> Option<String> {
	env::var(name).ok().filter(|value| !value.is_empty())
}

fn required(name: &'static str) -> Result<String, Error> {
	optional(name).ok_or(Error::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, Error> {
	match env::var(name) {
		Ok(value) if !value.is_empty() => value.parse().map_err(|_| Error::Invalid { name, value }),
		_ => Ok(default),
	}
}

fn origins(raw: &str) -> Result<Vec<HeaderValue>, Error> {
	raw.split(',')
		.map(str::trim)
		.filter(|origin| !origin.is_empty())
		.map(|origin| {
			HeaderValue::from_str(origin).map_err(|_| Error::Invalid {
				name: "CORS_ALLOWED_ORIGINS",
				value: origin.to_owned(),
			})
		})
		.collect()
}

/// All three variables must be set together, or none of them. Empty counts as unset.
fn superuser() -> Result<Option<Superuser>, Error> {
	let username = optional("SUPERUSER_USERNAME");
	let email = optional("SUPERUSER_EMAIL");
	let password = optional("SUPERUSER_PASSWORD");

	match (username, email, password) {
		(Some(username), Some(email), Some(password)) => Ok(Some(Superuser {
			username,
			email,
			password,
		})),
		(None, None, None) => Ok(None),
		(None, ..) => Err(Error::Missing("SUPERUSER_USERNAME")),
		(_, None, _) => Err(Error::Missing("SUPERUSER_EMAIL")),
		(.., None) => Err(Error::Missing("SUPERUSER_PASSWORD")),
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_origins_are_split_and_trimmed() {
		let origins = origins("http://localhost:3000, https://example.com,").unwrap();

		assert_eq!(origins.len(), 2);
		assert_eq!(origins[1], "https://example.com");
	}

	#[test]
	fn test_empty_origins_allow_any() {
		assert!(origins("").unwrap().is_empty());
	}

	#[test]
	fn test_invalid_origin_is_rejected() {
		assert!(matches!(
			origins("http://bad\norigin"),
			Err(Error::Invalid { .. })
		));
	}
}
