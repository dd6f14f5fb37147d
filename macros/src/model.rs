use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;

#[derive(Debug, Default, FromMeta)]
struct ModelArgs {
	#[darling(default)]
	skip_create: bool,
	#[darling(default)]
	skip_update: bool,
}

/// A client-writable field of the model.
struct InputField {
	ident: syn::Ident,
	ty: syn::Type,
	attrs: Vec<syn::Attribute>,
}

/// Attributes that carry over from the model field onto the generated inputs.
fn is_forwarded(attr: &syn::Attribute) -> bool {
	let path = attr.path();

	path.is_ident("doc") || path.is_ident("validate") || path.is_ident("serde")
}

/// Reads `#[model(skip)]` from a field.
fn is_skipped(attrs: &[syn::Attribute]) -> syn::Result<bool> {
	let mut skip = false;

	for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("skip") {
				skip = true;
				Ok(())
			} else {
				Err(meta.error("unsupported model field attribute, expected `skip`"))
			}
		})?;
	}

	Ok(skip)
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match ModelArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let mut item = syn::parse_macro_input!(input as syn::ItemStruct);

	match expand(&args, &mut item) {
		Ok(tokens) => tokens.into(),
		Err(e) => e.into_compile_error().into(),
	}
}

fn expand(args: &ModelArgs, item: &mut syn::ItemStruct) -> syn::Result<proc_macro2::TokenStream> {
	if !item.generics.params.is_empty() {
		return Err(syn::Error::new(
			item.generics.span(),
			"models with generic parameters are not supported",
		));
	}

	let syn::Fields::Named(ref mut named) = item.fields else {
		return Err(syn::Error::new(
			item.span(),
			"models must be structs with named fields",
		));
	};

	let mut inputs = Vec::new();

	for field in &mut named.named {
		let skip = is_skipped(&field.attrs)?;

		// `model` is not a real attribute, so it cannot stay on the emitted struct
		field.attrs.retain(|attr| !attr.path().is_ident("model"));

		if skip {
			continue;
		}

		let Some(ident) = field.ident.clone() else {
			continue;
		};

		inputs.push(InputField {
			ident,
			ty: field.ty.clone(),
			attrs: field.attrs.iter().filter(|a| is_forwarded(a)).cloned().collect(),
		});
	}

	let ident = &item.ident;
	let vis = &item.vis;

	let create = (!args.skip_create).then(|| {
		let create_ident = format_ident!("Create{}Input", ident);
		let doc = format!("The client-writable fields of a new [`{ident}`].");
		let fields = inputs.iter().map(|InputField { ident, ty, attrs }| {
			quote! {
				#(#attrs)*
				pub #ident: #ty,
			}
		});

		quote! {
			#[doc = #doc]
			#[derive(Debug, ::serde::Deserialize, ::schemars::JsonSchema, ::validator::Validate)]
			#vis struct #create_ident {
				#(#fields)*
			}
		}
	});

	let update = (!args.skip_update).then(|| {
		let update_ident = format_ident!("Update{}Input", ident);
		let doc = format!("A partial update of a [`{ident}`]; absent fields are left unchanged.");
		let fields = inputs.iter().map(|InputField { ident, ty, attrs }| {
			quote! {
				#(#attrs)*
				pub #ident: Option<#ty>,
			}
		});
		let assignments = inputs.iter().map(|InputField { ident, .. }| {
			quote! {
				if let Some(value) = self.#ident {
					target.#ident = value;
				}
			}
		});

		quote! {
			#[doc = #doc]
			#[derive(Debug, Default, ::serde::Deserialize, ::schemars::JsonSchema, ::validator::Validate)]
			#vis struct #update_ident {
				#(#fields)*
			}

			impl #update_ident {
				/// Writes every provided field onto `target`.
				#[allow(dead_code)]
				pub fn apply(self, target: &mut #ident) {
					#(#assignments)*
				}
			}
		}
	});

	Ok(quote! {
		#item

		#create

		#update
	})
}
