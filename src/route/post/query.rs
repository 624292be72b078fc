//! Post queries shared by the post and comment routes.

use sqlx::PgExecutor;
use uuid::Uuid;

use super::model::{Post, PostRow};
use crate::{
	route::user::{manager, model::User},
	Database,
};

/// Selects posts with their like and comment counts. `$1` is the internal
/// id of the viewer, or `NULL` for anonymous requests.
const SELECT_POST: &str = r#"
	SELECT
		p.*,
		(SELECT COUNT(*) FROM post_like l WHERE l.post_id = p.id) AS likes_count,
		(SELECT COUNT(*) FROM comment c WHERE c.post_id = p.id) AS comments_count,
		EXISTS (
			SELECT 1 FROM post_like l WHERE l.post_id = p.id AND l.user_id = $1
		) AS liked
	FROM post p
"#;

/// The internal ids of a post, used for permission checks and foreign keys.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct PostRef {
	pub id: i64,
	pub author_id: i64,
}

pub async fn find_ref<'c>(
	executor: impl PgExecutor<'c>,
	public_id: Uuid,
) -> Result<Option<PostRef>, sqlx::Error> {
	sqlx::query_as::<_, PostRef>("SELECT id, author_id FROM post WHERE public_id = $1")
		.bind(public_id)
		.fetch_optional(executor)
		.await
}

/// Attaches the authors to the rows, keeping their order.
async fn with_authors(
	database: &Database,
	rows: Vec<PostRow>,
	viewer: Option<&User>,
) -> Result<Vec<Post>, sqlx::Error> {
	let ids = rows.iter().map(|row| row.author_id).collect::<Vec<_>>();
	let authors = manager::get_many(database, &ids).await?;

	Ok(rows
		.into_iter()
		.filter_map(|row| {
			let author = authors.get(&row.author_id)?.clone();

			Some(row.into_post(author, viewer))
		})
		.collect())
}

pub async fn find(
	database: &Database,
	public_id: Uuid,
	viewer: Option<&User>,
) -> Result<Option<Post>, sqlx::Error> {
	let row = sqlx::query_as::<_, PostRow>(&format!("{SELECT_POST} WHERE p.public_id = $2"))
		.bind(viewer.map(|viewer| viewer.id))
		.bind(public_id)
		.fetch_optional(database)
		.await?;

	let Some(row) = row else {
		return Ok(None);
	};

	Ok(with_authors(database, vec![row], viewer).await?.pop())
}

/// Returns a page of posts, newest first, optionally only those by `author`.
pub async fn list(
	database: &Database,
	author: Option<Uuid>,
	limit: i64,
	offset: i64,
	viewer: Option<&User>,
) -> Result<(Vec<Post>, i64), sqlx::Error> {
	let rows = sqlx::query_as::<_, PostRow>(&format!(
		r#"
			{SELECT_POST}
			WHERE $2::uuid IS NULL OR p.author_id = (SELECT id FROM "user" WHERE public_id = $2)
			ORDER BY p.created DESC, p.id DESC
			LIMIT $3 OFFSET $4
		"#
	))
	.bind(viewer.map(|viewer| viewer.id))
	.bind(author)
	.bind(limit)
	.bind(offset)
	.fetch_all(database)
	.await?;

	let count = sqlx::query_scalar::<_, i64>(
		r#"
			SELECT COUNT(*) FROM post p
			WHERE $1::uuid IS NULL OR p.author_id = (SELECT id FROM "user" WHERE public_id = $1)
		"#,
	)
	.bind(author)
	.fetch_one(database)
	.await?;

	Ok((with_authors(database, rows, viewer).await?, count))
}
