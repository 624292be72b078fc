use aide::axum::{routing::post_with, ApiRouter};
use axum::http::StatusCode;

use crate::{error, route::user, token, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("authentication credentials were not provided")]
	NotAuthenticated,
	#[error("invalid token")]
	InvalidToken,
	#[error("token expired")]
	ExpiredToken,
	#[error("user is inactive")]
	Inactive,
	#[error(transparent)]
	User(#[from] user::Error),
}

impl From<token::Error> for Error {
	fn from(error: token::Error) -> Self {
		match error {
			token::Error::Expired => Self::ExpiredToken,
			token::Error::Invalid | token::Error::WrongKind(..) => Self::InvalidToken,
		}
	}
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/register", post_with(register, register_docs))
		.api_route("/login", post_with(login, login_docs))
		.api_route("/refresh", post_with(refresh, refresh_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword
			| Self::NotAuthenticated
			| Self::InvalidToken
			| Self::ExpiredToken
			| Self::Inactive => StatusCode::UNAUTHORIZED,
			Self::User(inner) => error::ErrorShape::status(inner),
		}
	}

	fn into_errors(self) -> Vec<error::Message<'static>> {
		match self {
			Self::User(inner) => error::ErrorShape::into_errors(inner),
			error => error::Message::new(error.to_string()).into_vec(),
		}
	}
}
