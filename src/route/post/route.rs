use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Auth, Json, MaybeAuth, Path, Query},
	openapi::tag,
	route::{model::Page, user::model::User},
	Database,
};

use super::{
	model,
	query::{self, PostRef},
	Error, RouteError,
};

async fn find_ref(database: &Database, post_id: Uuid) -> Result<PostRef, RouteError> {
	Ok(query::find_ref(database, post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?)
}

async fn find(
	database: &Database,
	post_id: Uuid,
	viewer: Option<&User>,
) -> Result<model::Post, RouteError> {
	Ok(query::find(database, post_id, viewer)
		.await?
		.ok_or(Error::UnknownPost(post_id))?)
}

/// Get all posts
/// Returns a paginated response of posts, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	viewer: MaybeAuth,
	Query(paginate): Query<model::Paginate>,
	Query(filter): Query<model::PostFilter>,
) -> Result<Json<Page<model::Post>>, RouteError> {
	let (posts, count) = query::list(
		&database,
		filter.author,
		paginate.limit,
		paginate.offset,
		viewer.user(),
	)
	.await?;

	Ok(Json(Page {
		count,
		results: posts,
	}))
}

/// Get single post
/// Returns a single post by its public id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	viewer: MaybeAuth,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	Ok(Json(find(&database, path.id, viewer.user()).await?))
}

/// Create post
/// Creates a new post written by the authenticated user.
#[route(tag = tag::POST, response(status = 201, description = "Created successfully.", shape = "Json<model::Post>"))]
pub async fn create_post(
	State(database): State<Database>,
	Auth(user): Auth,
	Json(input): Json<model::CreatePost>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post_id = sqlx::query_scalar::<_, Uuid>(
		r#"
			INSERT INTO post (public_id, author_id, body)
			VALUES ($1, $2, $3)
			RETURNING public_id
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(user.id)
	.bind(input.body)
	.fetch_one(&database)
	.await?;

	tracing::info!(post = %post_id, author = %user.public_id, "created post");

	let post = find(&database, post_id, Some(&user)).await?;

	Ok((StatusCode::CREATED, Json(post)).into_response())
}

/// Update post
/// Updates a post and marks it as edited. Only the author or a superuser may do this.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(database): State<Database>,
	Auth(user): Auth,
	Path(path): Path<model::IdInput>,
	Json(input): Json<model::UpdatePost>,
) -> Result<Json<model::Post>, RouteError> {
	let post = find_ref(&database, path.id).await?;

	if !user.can_modify(post.author_id) {
		return Err(Error::Forbidden.into());
	}

	sqlx::query(
		r#"
			UPDATE post
			SET body = COALESCE($1, body), edited = TRUE, updated = NOW()
			WHERE id = $2
		"#,
	)
	.bind(input.body)
	.bind(post.id)
	.execute(&database)
	.await?;

	Ok(Json(find(&database, path.id, Some(&user)).await?))
}

/// Delete post
/// Deletes a post along with its comments and likes. Only the author or a superuser may do this.
#[route(tag = tag::POST, response(status = 204, description = "Deleted successfully."))]
pub async fn delete_post(
	State(database): State<Database>,
	Auth(user): Auth,
	Path(path): Path<model::IdInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = find_ref(&database, path.id).await?;

	if !user.can_modify(post.author_id) {
		return Err(Error::Forbidden.into());
	}

	sqlx::query("DELETE FROM post WHERE id = $1")
		.bind(post.id)
		.execute(&database)
		.await?;

	tracing::info!(post = %path.id, by = %user.public_id, "deleted post");

	Ok(StatusCode::NO_CONTENT.into_response())
}

/// Like post
/// Likes a post as the authenticated user. Liking a post twice has no effect.
#[route(tag = tag::POST)]
pub async fn like_post(
	State(database): State<Database>,
	Auth(user): Auth,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = find_ref(&database, path.id).await?;

	sqlx::query(
		r#"
			INSERT INTO post_like (post_id, user_id) VALUES ($1, $2)
			ON CONFLICT DO NOTHING
		"#,
	)
	.bind(post.id)
	.bind(user.id)
	.execute(&database)
	.await?;

	Ok(Json(find(&database, path.id, Some(&user)).await?))
}

/// Remove like
/// Removes the authenticated user's like from a post, if there is one.
#[route(tag = tag::POST)]
pub async fn remove_like(
	State(database): State<Database>,
	Auth(user): Auth,
	Path(path): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let post = find_ref(&database, path.id).await?;

	sqlx::query("DELETE FROM post_like WHERE post_id = $1 AND user_id = $2")
		.bind(post.id)
		.bind(user.id)
		.execute(&database)
		.await?;

	Ok(Json(find(&database, path.id, Some(&user)).await?))
}
