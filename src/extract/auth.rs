use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{
	openapi::SECURITY_SCHEME_BEARER,
	route::{
		auth,
		user::{manager, model::User},
	},
	token::{self, Keys},
	Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

type RouteError = crate::error::RouteError<auth::Error>;

/// The authenticated user, resolved from an access token in the
/// `Authorization: Bearer <token>` header.
///
/// A missing header is rejected with [`auth::Error::NotAuthenticated`],
/// anything else that does not resolve to an active user with
/// [`auth::Error::InvalidToken`] or [`auth::Error::Inactive`].
///
/// ```rust,ignore
/// async fn route(Auth(user): Auth) {
///   println!("{}", user.username);
/// }
/// ```
#[derive(Debug)]
pub struct Auth(pub User);

/// Like [`Auth`], but anonymous requests are let through as `None`.
///
/// A header that is present but invalid is still rejected.
#[derive(Debug)]
pub struct MaybeAuth(pub Option<User>);

impl MaybeAuth {
	pub fn user(&self) -> Option<&User> {
		self.0.as_ref()
	}
}

async fn authenticate<S>(parts: &request::Parts, state: &S) -> Result<Option<User>, RouteError>
where
	Database: FromRef<S>,
	Keys: FromRef<S>,
{
	let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
		return Ok(None);
	};

	let token = value
		.to_str()
		.ok()
		.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
		.ok_or(auth::Error::InvalidToken)?;

	let claims = Keys::from_ref(state)
		.verify(token, token::Kind::Access)
		.map_err(auth::Error::from)?;

	let database = Database::from_ref(state);
	let user = manager::get_by_uuid(&database, claims.sub)
		.await?
		.ok_or(auth::Error::InvalidToken)?;

	if !user.is_active {
		return Err(auth::Error::Inactive.into());
	}

	Ok(Some(user))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Auth
where
	Database: FromRef<S>,
	Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		authenticate(parts, state)
			.await?
			.map(Self)
			.ok_or_else(|| auth::Error::NotAuthenticated.into())
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeAuth
where
	Database: FromRef<S>,
	Keys: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		authenticate(parts, state).await.map(Self)
	}
}

impl OperationInput for Auth {
	/// Adds the bearer token requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

impl OperationInput for MaybeAuth {
	/// Documents the bearer token as optional.
	fn operation_input(ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		Auth::operation_input(ctx, operation);
		operation.security.push(Default::default());
	}
}
