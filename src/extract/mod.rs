//! Request extractors that validate their input before a handler runs.
//!
//! Every rejection is an [`AppError`], so malformed input is reported with
//! the same error body as everything else.

mod auth;

pub use auth::{Auth, MaybeAuth, AUTHORIZATION_PREFIX};

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::error::AppError;

/// A JSON body, checked against the schema of `T` and then validated.
///
/// Also used as the response type of every handler so that responses are
/// documented with the same schema.
///
/// ```rust,ignore
/// async fn route(Json(input): Json<CreatePost>) -> Json<Post> {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
	fn into_response(self) -> Response<Body> {
		axum::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: DeserializeOwned + Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum_jsonschema::Json(input) = axum_jsonschema::Json::<T>::from_request(req, state).await?;

		input.validate()?;
		Ok(Self(input))
	}
}

/// Wraps an axum extractor that reads from the request parts, validating
/// what it deserializes.
macro_rules! validated {
	($(#[$meta:meta])* $name:ident => $inner:ident, $input_with:tt) => {
		$(#[$meta])*
		#[derive(OperationIo)]
		#[aide(
			input_with = $input_with,
			output_with = "axum_jsonschema::Json<T>",
			json_schema
		)]
		pub struct $name<T>(pub T);

		#[axum::async_trait]
		impl<T, S> FromRequestParts<S> for $name<T>
		where
			T: DeserializeOwned + Validate + Send,
			S: Send + Sync,
		{
			type Rejection = AppError;

			async fn from_request_parts(
				parts: &mut request::Parts,
				state: &S,
			) -> Result<Self, Self::Rejection> {
				let axum::extract::$inner(input) =
					axum::extract::$inner::<T>::from_request_parts(parts, state).await?;

				input.validate()?;
				Ok(Self(input))
			}
		}
	};
}

validated! {
	/// A validated query string, such as [`Paginate`](crate::route::model::Paginate).
	Query => Query, "axum::extract::Query<T>"
}

validated! {
	/// Validated path parameters.
	Path => Path, "axum::extract::Path<T>"
}
