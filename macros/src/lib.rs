mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary, the rest the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates `CreateXInput` and `UpdateXInput` structs for the model, plus an
/// `UpdateXInput::apply` method that writes every provided field onto the model.
///
/// Fields marked with `#[model(skip)]` are server-owned and never appear in
/// either input. Pass `#[model(skip_create)]` or `#[model(skip_update)]` to
/// omit one of the inputs.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
