#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod openapi;
mod ratelimit;
mod route;
#[cfg(test)]
mod test;
mod token;
mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{
	extract::Request,
	http::{HeaderValue, Method},
	Extension, ServiceExt,
};
use sqlx::postgres::PgPoolOptions;
use tower::Layer;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::{AllowOrigin, Any, CorsLayer},
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	config::Config,
	route::user::manager::{self, NewUser},
};

pub type Database = sqlx::Pool<sqlx::Postgres>;

/// The shared application state.
///
/// Handlers extract only the parts they need through `FromRef`, such as
/// `State<Database>` or the token [`Keys`](token::Keys).
#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub keys: token::Keys,
}

fn cors(origins: &[HeaderValue]) -> CorsLayer {
	let layer = CorsLayer::new()
		.allow_methods([
			Method::GET,
			Method::POST,
			Method::PUT,
			Method::PATCH,
			Method::DELETE,
		])
		.allow_headers(Any);

	if origins.is_empty() {
		layer.allow_origin(Any)
	} else {
		layer.allow_origin(AllowOrigin::list(origins.iter().cloned()))
	}
}

/// Builds the API router with its documentation and middleware.
///
/// Rate limiting and path normalisation are added by [`main`], since they
/// wrap the whole service.
pub fn app(state: AppState, cors_origins: &[HeaderValue]) -> axum::Router {
	let mut api = OpenApi::default();

	ApiRouter::new()
		.nest("/auth", route::auth::routes())
		.nest("/user", route::user::routes())
		.nest("/post", route::post::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(cors(cors_origins))
		.layer(CompressionLayer::new())
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(TraceLayer::new_for_http().make_span_with(trace::make_span))
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

/// Creates the configured superuser, unless an account with that email exists.
async fn bootstrap_superuser(state: &AppState, config: &Config) {
	let Some(superuser) = &config.superuser else {
		return;
	};

	let email = manager::normalize_email(&superuser.email);

	match manager::get_by_email(&state.database, &email).await {
		Ok(Some(user)) => {
			tracing::debug!(user = %user.public_id, "superuser already exists");
		}
		Ok(None) => {
			let new = NewUser::new(
				superuser.username.as_str(),
				email,
				superuser.password.as_str(),
			);

			if let Err(error) = manager::create_superuser(&state.database, &state.hasher, new).await
			{
				tracing::error!(%error, "failed to create superuser");
			}
		}
		Err(error) => tracing::error!(%error, "failed to look up superuser"),
	}
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");

	trace::init_tracing_subscriber(config.log_level);

	let database = PgPoolOptions::new()
		.max_connections(config.database_max_connections)
		.connect(&config.database_url)
		.await
		.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let state = AppState {
		database,
		hasher: Argon2::default(),
		keys: token::Keys::new(
			config.jwt_secret.as_bytes(),
			config.access_ttl_seconds,
			config.refresh_ttl_seconds,
		),
	};

	bootstrap_superuser(&state, &config).await;

	let governor = ratelimit::default().expect("invalid rate limit configuration");

	ratelimit::cleanup_old_limits(&[&governor]);

	let app = app(state, &config.cors_allowed_origins).layer(GovernorLayer { config: governor });
	let app = NormalizePathLayer::trim_trailing_slash().layer(app);

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(
		listener,
		ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.await
	.expect("server error");
}
