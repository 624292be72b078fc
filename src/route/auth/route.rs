use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;

use crate::{
	extract::Json,
	openapi::tag,
	route::user::{manager, model::User},
	token, AppState,
};

use super::{model, Error, RouteError};

fn tokens(keys: &token::Keys, user: User) -> Result<model::Tokens, RouteError> {
	Ok(model::Tokens {
		access: keys.access(user.public_id)?,
		refresh: keys.refresh(user.public_id)?,
		user,
	})
}

/// Register account
/// Creates a new account, returning it along with an access and refresh token.
#[route(tag = tag::AUTH, response(status = 201, description = "Registered successfully.", shape = "Json<model::Tokens>"))]
pub async fn register(
	State(state): State<AppState>,
	Json(input): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let mut conn = state.database.acquire().await?;
	let user = manager::create_user(&mut conn, &state.hasher, input.into())
		.await
		.map_err(|error| error.convert::<Error>())?;

	let tokens = tokens(&state.keys, user)?;

	Ok((StatusCode::CREATED, Json(tokens)).into_response())
}

/// Log in
/// Exchanges an email and password for an access and refresh token.
#[route(tag = tag::AUTH)]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<Json<model::Tokens>, RouteError> {
	let email = manager::normalize_email(&input.email);
	let user = manager::get_by_email(&state.database, &email)
		.await?
		.filter(|user| user.is_active && user.check_password(&state.hasher, &input.password))
		.ok_or(Error::InvalidEmailOrPassword)?;

	tracing::info!(user = %user.public_id, "logged in");

	Ok(Json(tokens(&state.keys, user)?))
}

/// Refresh token
/// Exchanges a refresh token for a new access token.
#[route(tag = tag::AUTH)]
pub async fn refresh(
	State(state): State<AppState>,
	Json(input): Json<model::RefreshInput>,
) -> Result<Json<model::AccessToken>, RouteError> {
	let claims = state
		.keys
		.verify(&input.refresh, token::Kind::Refresh)
		.map_err(Error::from)?;

	// Inactive accounts cannot refresh
	let user = manager::get_by_uuid(&state.database, claims.sub)
		.await?
		.filter(|user| user.is_active)
		.ok_or(Error::InvalidToken)?;

	Ok(Json(model::AccessToken {
		access: state.keys.access(user.public_id)?,
	}))
}
