use axum::extract::State;
use macros::route;

use crate::{
	extract::{Auth, Json, Path, Query},
	openapi::tag,
	route::model::Page,
	AppState, Database,
};

use super::{manager, model, Error, RouteError};

/// Fetches a user the viewer is allowed to see, treating hidden users as unknown.
async fn visible_user(
	database: &Database,
	viewer: &model::User,
	public_id: &str,
) -> Result<model::User, RouteError> {
	let user = manager::get_by_public_id(database, public_id)
		.await?
		.filter(|user| viewer.can_see(user));

	Ok(user.ok_or_else(|| Error::UnknownUser(public_id.to_owned()))?)
}

/// List users
/// Returns a paginated list of users, newest first. Superusers are only listed for other superusers.
#[route(tag = tag::USER)]
pub async fn list_users(
	State(database): State<Database>,
	Auth(viewer): Auth,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Page<model::User>>, RouteError> {
	let users = sqlx::query_as::<_, model::User>(
		r#"
			SELECT * FROM "user"
			WHERE $1 OR NOT is_superuser
			ORDER BY created DESC, id DESC
			LIMIT $2 OFFSET $3
		"#,
	)
	.bind(viewer.is_superuser)
	.bind(paginate.limit)
	.bind(paginate.offset)
	.fetch_all(&database)
	.await?;

	let count = sqlx::query_scalar::<_, i64>(
		r#"
			SELECT COUNT(*) FROM "user"
			WHERE $1 OR NOT is_superuser
		"#,
	)
	.bind(viewer.is_superuser)
	.fetch_one(&database)
	.await?;

	Ok(Json(Page {
		count,
		results: users,
	}))
}

/// Get user
/// Returns a single user by their public id.
#[route(tag = tag::USER)]
pub async fn get_user(
	State(database): State<Database>,
	Auth(viewer): Auth,
	Path(path): Path<model::PublicIdInput>,
) -> Result<Json<model::User>, RouteError> {
	Ok(Json(visible_user(&database, &viewer, &path.id).await?))
}

/// Update user
/// Partially updates a user. Only the user themselves or a superuser may do this.
#[route(tag = tag::USER)]
pub async fn update_user(
	State(state): State<AppState>,
	Auth(viewer): Auth,
	Path(path): Path<model::PublicIdInput>,
	Json(input): Json<model::UpdateUser>,
) -> Result<Json<model::User>, RouteError> {
	let user = visible_user(&state.database, &viewer, &path.id).await?;

	if !viewer.can_modify(user.id) {
		return Err(Error::Forbidden.into());
	}

	let email = input.email.as_deref().map(manager::normalize_email);

	let user = sqlx::query_as::<_, model::User>(
		r#"
			UPDATE "user"
			SET
				username = COALESCE($1, username),
				email = COALESCE($2, email),
				first_name = COALESCE($3, first_name),
				last_name = COALESCE($4, last_name),
				bio = COALESCE($5, bio),
				avatar = COALESCE($6, avatar),
				updated = NOW()
			WHERE id = $7
			RETURNING *
		"#,
	)
	.bind(input.username)
	.bind(email)
	.bind(input.first_name)
	.bind(input.last_name)
	.bind(input.bio)
	.bind(input.avatar)
	.bind(user.id)
	.fetch_one(&state.database)
	.await
	.map_err(manager::map_unique_violation)?;

	tracing::info!(user = %user.public_id, by = %viewer.public_id, "updated user");

	Ok(Json(user))
}
