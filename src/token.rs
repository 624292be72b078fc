//! JSON Web Tokens for authentication.
//!
//! Two kinds are issued: short-lived access tokens, sent as
//! `Authorization: Bearer <token>`, and longer-lived refresh tokens that can
//! only be exchanged for a new access token.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
	Access,
	Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	/// The public id of the user.
	pub sub: Uuid,
	pub kind: Kind,
	pub jti: Uuid,
	pub iat: i64,
	pub exp: i64,
	pub iss: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("token expired")]
	Expired,
	#[error("invalid token")]
	Invalid,
	#[error("expected a {0:?} token")]
	WrongKind(Kind),
}

/// Signing keys and lifetimes, shared through the application state.
#[derive(Clone)]
pub struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	access_ttl: TimeDelta,
	refresh_ttl: TimeDelta,
}

impl Keys {
	pub fn new(secret: &[u8], access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
		Self {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			access_ttl: TimeDelta::seconds(access_ttl_seconds),
			refresh_ttl: TimeDelta::seconds(refresh_ttl_seconds),
		}
	}

	pub fn access(&self, user: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
		self.issue(user, Kind::Access, Utc::now())
	}

	pub fn refresh(&self, user: Uuid) -> Result<String, jsonwebtoken::errors::Error> {
		self.issue(user, Kind::Refresh, Utc::now())
	}

	fn issue(
		&self,
		user: Uuid,
		kind: Kind,
		now: DateTime<Utc>,
	) -> Result<String, jsonwebtoken::errors::Error> {
		let ttl = match kind {
			Kind::Access => self.access_ttl,
			Kind::Refresh => self.refresh_ttl,
		};

		let claims = Claims {
			sub: user,
			kind,
			jti: Uuid::new_v4(),
			iat: now.timestamp(),
			exp: (now + ttl).timestamp(),
			iss: ISSUER.into(),
		};

		jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
	}

	/// Decodes a token, checking its signature, expiry, issuer and kind.
	pub fn verify(&self, token: &str, kind: Kind) -> Result<Claims, Error> {
		let mut validation = Validation::default();
		validation.set_issuer(&[ISSUER]);

		let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
			.map_err(|e| match e.kind() {
				ErrorKind::ExpiredSignature => Error::Expired,
				_ => Error::Invalid,
			})?
			.claims;

		if claims.kind != kind {
			return Err(Error::WrongKind(kind));
		}

		Ok(claims)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn keys() -> Keys {
		Keys::new(b"test-secret", 300, 86_400)
	}

	#[test]
	fn test_access_token_round_trip() {
		let keys = keys();
		let user = Uuid::new_v4();

		let token = keys.access(user).unwrap();
		let claims = keys.verify(&token, Kind::Access).unwrap();

		assert_eq!(claims.sub, user);
		assert_eq!(claims.kind, Kind::Access);
		assert_eq!(claims.exp - claims.iat, 300);
	}

	#[test]
	fn test_refresh_token_is_not_an_access_token() {
		let keys = keys();
		let token = keys.refresh(Uuid::new_v4()).unwrap();

		assert_eq!(
			keys.verify(&token, Kind::Access).unwrap_err(),
			Error::WrongKind(Kind::Access)
		);
		assert!(keys.verify(&token, Kind::Refresh).is_ok());
	}

	#[test]
	fn test_expired_token() {
		let keys = keys();
		let token = keys
			.issue(
				Uuid::new_v4(),
				Kind::Access,
				Utc::now() - TimeDelta::hours(1),
			)
			.unwrap();

		assert_eq!(
			keys.verify(&token, Kind::Access).unwrap_err(),
			Error::Expired
		);
	}

	#[test]
	fn test_token_signed_with_another_secret() {
		let other = Keys::new(b"another-secret", 300, 86_400);
		let token = other.access(Uuid::new_v4()).unwrap();

		assert_eq!(
			keys().verify(&token, Kind::Access).unwrap_err(),
			Error::Invalid
		);
	}

	#[test]
	fn test_garbage_token() {
		assert_eq!(
			keys().verify("not-a-token", Kind::Access).unwrap_err(),
			Error::Invalid
		);
	}
}
