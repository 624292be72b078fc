use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
	scalar::Scalar,
};
use axum::{response::IntoResponse, Extension};

use crate::{extract::Json, openapi::SECURITY_SCHEME_BEARER};

/// The interactive documentation and the raw `OpenAPI` document it renders.
pub fn routes() -> ApiRouter {
	ApiRouter::new()
		.api_route_with(
			"/",
			get_with(
				Scalar::new("/docs/private/api.json")
					.with_title("Social API")
					.axum_handler(),
				|op| op.description("This documentation page."),
			),
			|p| p.security_requirement(SECURITY_SCHEME_BEARER),
		)
		.route("/private/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api.as_ref()).into_response()
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;

	use crate::test::*;

	#[tokio::test]
	async fn test_openapi_document() {
		let app = app(lazy_pool());

		let response = app.get("/docs/private/api.json").await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let api = response.json::<Value>();

		assert_eq!(api["info"]["title"], "Social API");
		let paths = api["paths"].as_object().unwrap();

		assert!(paths.keys().any(|path| path.ends_with("/like")));
		assert!(paths.keys().any(|path| path.contains("comment_id")));
		assert!(api["components"]["securitySchemes"]["Bearer"].is_object());
	}
}
