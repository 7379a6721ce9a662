use proc_macro2::TokenStream;
use quote::quote;
use relay_codegen::marker::{DefaultAccessMarker, FunctionMarker};

/// Returns `item` unchanged, preceded by a compile error for each problem found.
pub fn remote_function(attr: TokenStream, item: TokenStream) -> TokenStream {
	let mut errors = Vec::new();
	if let Err(error) = FunctionMarker::parse_args(attr) {
		errors.push(error.to_compile_error());
	}
	if let Err(error) = syn::parse2::<syn::ImplItemFn>(item.clone()) {
		errors.push(
			syn::Error::new(error.span(), "#[remote_function] can only be applied to functions and methods")
				.to_compile_error(),
		);
	}

	quote! {
		#(#errors)*
		#item
	}
}

pub fn default_access(input: TokenStream) -> TokenStream {
	match syn::parse2::<DefaultAccessMarker>(input) {
		Ok(_) => TokenStream::new(),
		Err(error) => error.to_compile_error(),
	}
}
