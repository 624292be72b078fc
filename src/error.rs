use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single client-facing error message.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A human readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Extra context, such as the id that could not be found.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(|| Cow::Owned(Map::new()))
			.to_mut()
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

/// The body of every error response.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorBody {
	pub errors: Vec<Message<'static>>,
}

/// Implemented by the error type of each route module.
///
/// The messages are sent to the client, so they must not contain
/// sensitive information. The `Display` implementation is only logged.
pub trait ErrorShape {
	fn status(&self) -> StatusCode;
	fn into_errors(self) -> Vec<Message<'static>>;
}

/// Errors shared by every route: input rejections and infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json body rejected")]
	JsonSchema(axum_jsonschema::JsonSchemaRejection),
	#[error("query rejected: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path rejected: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("password hash error: {0}")]
	Hash(#[from] argon2::password_hash::Error),
	#[error("token encoding error: {0}")]
	Token(#[from] jsonwebtoken::errors::Error),
	#[error("too many requests, retry in {0}s")]
	TooManyRequests(u64),
	#[error("rate limiter could not identify the client")]
	RateLimitKey,
}

impl From<axum_jsonschema::JsonSchemaRejection> for AppError {
	fn from(rejection: axum_jsonschema::JsonSchemaRejection) -> Self {
		Self::JsonSchema(rejection)
	}
}

impl From<GovernorError> for AppError {
	fn from(error: GovernorError) -> Self {
		match error {
			GovernorError::TooManyRequests { wait_time, .. } => Self::TooManyRequests(wait_time),
			_ => Self::RateLimitKey,
		}
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::JsonSchema(..) | Self::Query(..) | Self::Path(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::TooManyRequests(..) => StatusCode::TOO_MANY_REQUESTS,
			Self::Database(..) | Self::Hash(..) | Self::Token(..) | Self::RateLimitKey => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	pub fn into_errors(self) -> Vec<Message<'static>> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					let field = field.to_string();

					errors.iter().map(move |error| {
						let content = error
							.message
							.clone()
							.unwrap_or_else(|| error.code.clone());

						Message::new(content).field(field.clone())
					})
				})
				.collect(),
			Self::JsonSchema(..) => Message::new("invalid json body").into_vec(),
			Self::Query(rejection) => Message::new(rejection.body_text()).into_vec(),
			Self::Path(rejection) => Message::new(rejection.body_text()).into_vec(),
			Self::TooManyRequests(wait) => Message::new("too many requests")
				.detail("retry_after", wait)
				.into_vec(),
			Self::Database(..) | Self::Hash(..) | Self::Token(..) | Self::RateLimitKey => {
				Message::new("internal server error").into_vec()
			}
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		match self {
			// The rejection already carries a descriptive JSON body
			Self::JsonSchema(rejection) => rejection.into_response(),
			error => (
				status,
				Json(ErrorBody {
					errors: error.into_errors(),
				}),
			)
				.into_response(),
		}
	}
}

/// The error returned by a route handler: either a shared [`AppError`]
/// or the route module's own error `E`.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E> {
	#[error(transparent)]
	App(#[from] AppError),
	#[error(transparent)]
	Route(E),
}

impl<E> RouteError<E> {
	/// Converts the route-specific error into another module's error type.
	pub fn convert<F: From<E>>(self) -> RouteError<F> {
		match self {
			Self::App(error) => RouteError::App(error),
			Self::Route(error) => RouteError::Route(error.into()),
		}
	}
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<sqlx::Error> for RouteError<E> {
	fn from(error: sqlx::Error) -> Self {
		Self::App(AppError::Database(error))
	}
}

impl<E> From<argon2::password_hash::Error> for RouteError<E> {
	fn from(error: argon2::password_hash::Error) -> Self {
		Self::App(AppError::Hash(error))
	}
}

impl<E> From<jsonwebtoken::errors::Error> for RouteError<E> {
	fn from(error: jsonwebtoken::errors::Error) -> Self {
		Self::App(AppError::Token(error))
	}
}

impl<E: ErrorShape + std::fmt::Display> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(error = %error, "request failed");
				} else {
					tracing::debug!(error = %error, "request rejected");
				}

				(
					status,
					Json(ErrorBody {
						errors: error.into_errors(),
					}),
				)
					.into_response()
			}
		}
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorBody;
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;
	use validator::Validate;

	use super::*;

	#[derive(Validate)]
	struct Input {
		#[validate(length(min = 8))]
		password: String,
	}

	#[test]
	fn test_validation_errors_name_the_field() {
		let errors = Input {
			password: "short".into(),
		}
		.validate()
		.unwrap_err();

		let error = AppError::from(errors);

		assert_eq!(error.status(), StatusCode::BAD_REQUEST);

		let messages = error.into_errors();

		assert_eq!(messages.len(), 1);
		assert_eq!(messages[0].field.as_deref(), Some("password"));
	}

	#[test]
	fn test_message_details() {
		let message = Message::new("unknown_post").detail("post", "abc");
		let value = serde_json::to_value(&message).unwrap();

		assert_eq!(value["content"], "unknown_post");
		assert_eq!(value["details"]["post"], "abc");
		assert!(value.get("field").is_none());
	}
}
