use aide::axum::IntoApiResponse;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Auth, Json, Path, Query},
	openapi::tag,
	route::{
		model::Page,
		post::query::{self as post_query, PostRef},
		user::{manager, model::User},
	},
	Database,
};

use super::{model, Error, RouteError};

async fn find_post(database: &Database, post_id: Uuid) -> Result<PostRef, RouteError> {
	Ok(post_query::find_ref(database, post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?)
}

/// Looks up a comment, but only under the post it belongs to.
async fn find_row(
	database: &Database,
	post: &PostRef,
	path: &model::CommentPath,
) -> Result<model::CommentRow, RouteError> {
	let row = sqlx::query_as::<_, model::CommentRow>(
		"SELECT * FROM comment WHERE public_id = $1 AND post_id = $2",
	)
	.bind(path.comment_id)
	.bind(post.id)
	.fetch_optional(database)
	.await?;

	Ok(row.ok_or(Error::UnknownComment(path.comment_id))?)
}

async fn with_author(
	database: &Database,
	post: Uuid,
	row: model::CommentRow,
) -> Result<model::Comment, RouteError> {
	let author = manager::get_many(database, &[row.author_id])
		.await?
		.remove(&row.author_id)
		.unwrap_or_default();

	Ok(row.into_comment(post, author))
}

/// Get all comments
/// Returns a paginated response of the comments on a post, newest first.
#[route(tag = tag::COMMENT)]
pub async fn get_comments(
	State(database): State<Database>,
	Path(path): Path<model::PostPath>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Page<model::Comment>>, RouteError> {
	let post = find_post(&database, path.id).await?;

	let rows = sqlx::query_as::<_, model::CommentRow>(
		r#"
			SELECT * FROM comment
			WHERE post_id = $1
			ORDER BY created DESC, id DESC
			LIMIT $2 OFFSET $3
		"#,
	)
	.bind(post.id)
	.bind(paginate.limit)
	.bind(paginate.offset)
	.fetch_all(&database)
	.await?;

	let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comment WHERE post_id = $1")
		.bind(post.id)
		.fetch_one(&database)
		.await?;

	let ids = rows.iter().map(|row| row.author_id).collect::<Vec<_>>();
	let authors = manager::get_many(&database, &ids).await?;

	let results = rows
		.into_iter()
		.filter_map(|row| {
			let author = authors.get(&row.author_id)?.clone();

			Some(row.into_comment(path.id, author))
		})
		.collect();

	Ok(Json(Page { count, results }))
}

/// Get single comment
#[route(tag = tag::COMMENT)]
pub async fn get_comment(
	State(database): State<Database>,
	Path(path): Path<model::CommentPath>,
) -> Result<Json<model::Comment>, RouteError> {
	let post = find_post(&database, path.id).await?;
	let row = find_row(&database, &post, &path).await?;

	Ok(Json(with_author(&database, path.id, row).await?))
}

/// Create comment
/// Comments on a post as the authenticated user.
#[route(tag = tag::COMMENT, response(status = 201, description = "Created successfully.", shape = "Json<model::Comment>"))]
pub async fn create_comment(
	State(database): State<Database>,
	Auth(user): Auth,
	Path(path): Path<model::PostPath>,
	Json(input): Json<model::CreateComment>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = find_post(&database, path.id).await?;

	let row = sqlx::query_as::<_, model::CommentRow>(
		r#"
			INSERT INTO comment (public_id, post_id, author_id, body)
			VALUES ($1, $2, $3, $4)
			RETURNING *
		"#,
	)
	.bind(Uuid::new_v4())
	.bind(post.id)
	.bind(user.id)
	.bind(input.body)
	.fetch_one(&database)
	.await?;

	tracing::info!(comment = %row.public_id, post = %path.id, author = %user.public_id, "created comment");

	Ok((StatusCode::CREATED, Json(row.into_comment(path.id, user))).into_response())
}

/// Update comment
/// Updates a comment and marks it as edited. Only the comment author or a superuser may do this.
#[route(tag = tag::COMMENT)]
pub async fn update_comment(
	State(database): State<Database>,
	Auth(user): Auth,
	Path(path): Path<model::CommentPath>,
	Json(input): Json<model::UpdateComment>,
) -> Result<Json<model::Comment>, RouteError> {
	let post = find_post(&database, path.id).await?;
	let row = find_row(&database, &post, &path).await?;

	if !user.can_modify(row.author_id) {
		return Err(Error::Forbidden.into());
	}

	let row = sqlx::query_as::<_, model::CommentRow>(
		r#"
			UPDATE comment
			SET body = COALESCE($1, body), edited = TRUE, updated = NOW()
			WHERE id = $2
			RETURNING *
		"#,
	)
	.bind(input.body)
	.bind(row.id)
	.fetch_one(&database)
	.await?;

	Ok(Json(with_author(&database, path.id, row).await?))
}

/// Delete comment
/// Deletes a comment. Allowed for the comment author, the author of the post, and superusers.
#[route(tag = tag::COMMENT, response(status = 204, description = "Deleted successfully."))]
pub async fn delete_comment(
	State(database): State<Database>,
	Auth(user): Auth,
	Path(path): Path<model::CommentPath>,
) -> Result<impl IntoApiResponse, RouteError> {
	let post = find_post(&database, path.id).await?;
	let row = find_row(&database, &post, &path).await?;

	if !can_delete(&user, &post, &row) {
		return Err(Error::Forbidden.into());
	}

	sqlx::query("DELETE FROM comment WHERE id = $1")
		.bind(row.id)
		.execute(&database)
		.await?;

	tracing::info!(comment = %path.comment_id, by = %user.public_id, "deleted comment");

	Ok(StatusCode::NO_CONTENT.into_response())
}

fn can_delete(user: &User, post: &PostRef, row: &model::CommentRow) -> bool {
	user.can_modify(row.author_id) || user.id == post.author_id
}

#[cfg(test)]
mod test {
	use chrono::Utc;

	use super::*;

	fn row(author_id: i64) -> model::CommentRow {
		model::CommentRow {
			id: 1,
			public_id: Uuid::new_v4(),
			post_id: 1,
			author_id,
			body: "hello".into(),
			edited: false,
			created: Utc::now(),
			updated: Utc::now(),
		}
	}

	fn user(id: i64, is_superuser: bool) -> User {
		User {
			id,
			is_superuser,
			..Default::default()
		}
	}

	#[test]
	fn test_delete_permissions() {
		let post = PostRef { id: 1, author_id: 2 };
		let comment = row(3);

		assert!(can_delete(&user(3, false), &post, &comment));
		assert!(can_delete(&user(2, false), &post, &comment));
		assert!(can_delete(&user(4, true), &post, &comment));
		assert!(!can_delete(&user(4, false), &post, &comment));
	}
}
