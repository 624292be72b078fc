use darling::{ast, FromDeriveInput, FromField, FromMeta};
use proc_macro2::{TokenStream, TokenTree};
use quote::{format_ident, quote, ToTokens};
use syn::{punctuated::Punctuated, Meta, Token};

fn enabled() -> bool {
	true
}

#[derive(FromMeta)]
struct ModelArgs {
	#[darling(default = "enabled")]
	create: bool,
	#[darling(default = "enabled")]
	update: bool,
}

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelReceiver {
	ident: syn::Ident,
	generics: syn::Generics,
	data: ast::Data<(), FieldReceiver>,
	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct FieldReceiver {
	ident: Option<syn::Ident>,
	ty: syn::Type,
	vis: syn::Visibility,
	attrs: Vec<syn::Attribute>,
}

struct InputField<'a> {
	ident: &'a syn::Ident,
	ty: &'a syn::Type,
	vis: &'a syn::Visibility,
	attrs: Vec<&'a syn::Attribute>,
}

pub fn from_input(
	args: proc_macro::TokenStream,
	input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match ModelArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(ident, "#[model] expects a struct with named fields")
			.into_compile_error()
			.into();
	};

	let struct_attrs = receiver
		.attrs
		.iter()
		.filter_map(forward_struct_attr)
		.collect::<Vec<_>>();

	let fields = fields
		.iter()
		.filter(|field| !is_server_controlled(&field.attrs))
		.filter_map(|field| {
			Some(InputField {
				ident: field.ident.as_ref()?,
				ty: &field.ty,
				vis: &field.vis,
				attrs: field
					.attrs
					.iter()
					.filter(|attr| !attr.path().is_ident("sqlx"))
					.collect(),
			})
		})
		.collect::<Vec<_>>();

	let create = args.create.then(|| {
		let create_ident = format_ident!("Create{}", ident);
		let doc = format!(" Fields accepted when creating a [`{ident}`].");
		let create_fields = fields.iter().map(|field| {
			let InputField {
				ident,
				ty,
				vis,
				attrs,
			} = field;

			quote! {
				#(#attrs)*
				#vis #ident: #ty,
			}
		});

		quote! {
			#[doc = #doc]
			#(#struct_attrs)*
			#vis struct #create_ident #generics {
				#(#create_fields)*
			}
		}
	});

	let update = args.update.then(|| {
		let update_ident = format_ident!("Update{}", ident);
		let doc = format!(" Fields accepted when updating a [`{ident}`]. Omitted fields are left unchanged.");
		let update_fields = fields.iter().map(|field| {
			let InputField {
				ident,
				ty,
				vis,
				attrs,
			} = field;

			// Optional model fields stay as they are, there is no way to clear them
			let ty = if is_option(ty) {
				quote!(#ty)
			} else {
				quote!(Option<#ty>)
			};

			quote! {
				#(#attrs)*
				#vis #ident: #ty,
			}
		});

		quote! {
			#[doc = #doc]
			#(#struct_attrs)*
			#vis struct #update_ident #generics {
				#(#update_fields)*
			}
		}
	});

	quote! {
		#input

		#create

		#update
	}
	.into()
}

/// Struct attributes copied onto the generated inputs. Docs are replaced and
/// `FromRow` is dropped since inputs never come from the database.
fn forward_struct_attr(attr: &syn::Attribute) -> Option<TokenStream> {
	if attr.path().is_ident("doc") || attr.path().is_ident("sqlx") {
		return None;
	}

	if !attr.path().is_ident("derive") {
		return Some(attr.to_token_stream());
	}

	let Ok(paths) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
	else {
		return Some(attr.to_token_stream());
	};

	let paths = paths
		.into_iter()
		.filter(|path| {
			path.segments
				.last()
				.map_or(true, |segment| segment.ident != "FromRow")
		})
		.collect::<Vec<_>>();

	if paths.is_empty() {
		return None;
	}

	Some(quote!(#[derive(#(#paths),*)]))
}

/// Whether the field has `#[serde(skip)]` or `#[serde(skip_deserializing)]`.
fn is_server_controlled(attrs: &[syn::Attribute]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
	})
}

fn is_option(ty: &syn::Type) -> bool {
	let syn::Type::Path(path) = ty else {
		return false;
	};

	path.qself.is_none()
		&& path
			.path
			.segments
			.last()
			.is_some_and(|segment| segment.ident == "Option")
}
