mod model;
mod route;

use proc_macro::TokenStream;

/// Generates an `aide` documentation function for a handler, named after the
/// handler with a `_docs` suffix.
///
/// The first line of the doc comment becomes the operation summary and the
/// remaining lines its description.
///
/// ```rust,ignore
/// /// Get post
/// /// Returns a single post by its public id.
/// #[route(tag = tag::POST, response(status = 200, shape = "Json<Post>"))]
/// pub async fn get_post(/* ... */) {}
/// ```
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Generates `CreateX` and `UpdateX` input structs next to the model `X`.
///
/// Fields marked `#[serde(skip)]` or `#[serde(skip_deserializing)]` are
/// server-controlled and left out of both inputs. Every other field is copied
/// with its attributes (minus `#[sqlx(..)]`); in `UpdateX` it becomes optional.
/// Either struct can be switched off with `#[model(create = false)]` or
/// `#[model(update = false)]`.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
