//! Adapter emission.
//!
//! Renders the ordered descriptor list into one Rust source unit: a header line,
//! then a module whose preamble imports the runtime, and one adapter per
//! descriptor in list order. Rendering is pure; identical descriptors always
//! produce identical text.

use std::fmt;

use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};

use crate::config::{Conventions, RUNTIME_IMPORTS};
use crate::descriptor::{Invocation, InvocationDescriptor};
use crate::error::{GenerateError, Result};


/// First line of every generated unit.
pub const HEADER: &str = "// @generated by relay-codegen. Do not edit.";

/// The single output of a generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAdapterUnit {
	source: String,
}

impl GeneratedAdapterUnit {
	pub fn as_str(&self) -> &str {
		&self.source
	}

	pub fn into_string(self) -> String {
		self.source
	}
}

impl fmt::Display for GeneratedAdapterUnit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

/// Renders `descriptors`, in order, into a generated unit.
pub fn emit(descriptors: &[InvocationDescriptor], conventions: &Conventions) -> Result<GeneratedAdapterUnit> {
	let module = &conventions.output_module;
	let preamble = preamble(conventions);
	let adapters = descriptors.iter().map(|descriptor| adapter(descriptor, conventions));

	let tokens = quote! {
		pub mod #module {
			#preamble
			#(#adapters)*
		}
	};

	Ok(GeneratedAdapterUnit {
		source: format!("{HEADER}\n\n{}", format_tokens(tokens)?),
	})
}

fn format_tokens(tokens: TokenStream) -> Result<String> {
	let syntax_tree = syn::parse2::<syn::File>(tokens).map_err(GenerateError::Render)?;
	Ok(prettyplease::unparse(&syntax_tree))
}

fn preamble(conventions: &Conventions) -> TokenStream {
	let runtime = &conventions.runtime;
	let runtime_names = RUNTIME_IMPORTS.iter().map(|name| format_ident!("{name}"));
	let service_client = conventions.service_client.ty();
	let logger = conventions.logger.ty();

	quote! {
		#![allow(non_snake_case, unused_imports, unused_mut, unused_variables)]

		use #runtime::{#(#runtime_names),*};
		use #service_client;
		use #logger;
	}
}

/// One adapter function.
pub(crate) fn adapter(descriptor: &InvocationDescriptor, conventions: &Conventions) -> TokenStream {
	let runtime = &conventions.runtime;
	let exposed_name = &descriptor.exposed_name;
	let access = descriptor.access.ident();
	let adapter_name = format_ident!("{}", descriptor.adapter_name());
	let logger = &conventions.logger_ident;
	let service_client = &conventions.service_client_ident;

	let argument = match &descriptor.argument {
		Some(ty) => ty.ty().to_token_stream(),
		None => quote!(()),
	};
	let construction = construction(descriptor, conventions);
	let call = call(descriptor);
	let response = match descriptor.result {
		Some(_) => quote! {
			let result = #call;
			ActionResult::ok_with_body(result)
		},
		None => quote! {
			#call;
			ActionResult::ok()
		},
	};

	quote! {
		#[#runtime::http_trigger(name = #exposed_name, access = #access, method = "post", route = None)]
		pub async fn #adapter_name(req: HttpRequest, log: #logger) -> ActionResult {
			let function_context = match FunctionContext::<#argument>::create(req).await {
				Ok(function_context) => function_context,
				Err(error) => return ActionResult::from(error),
			};
			let server = #service_client::new(function_context.api_settings, function_context.authentication_context);
			let current_player_id = function_context.current_player_id;
			#construction
			#response
		}
	}
}

/// Statements building the receiver for the instance convention.
fn construction(descriptor: &InvocationDescriptor, conventions: &Conventions) -> TokenStream {
	let Invocation::Instance(instance) = &descriptor.invocation else {
		return TokenStream::new();
	};
	let containing_type = &instance.containing_type;
	let server_field = &conventions.server_field;
	let caller_id_field = &conventions.caller_id_field;
	quote! {
		let mut instance = <#containing_type as ::core::default::Default>::default();
		instance.#server_field = server;
		instance.#caller_id_field = current_player_id;
	}
}

/// The domain call, awaited when the declaration is async.
pub(crate) fn call(descriptor: &InvocationDescriptor) -> TokenStream {
	let mut arguments = Vec::new();
	let callee = match &descriptor.invocation {
		Invocation::Static(invocation) => {
			arguments.push(quote!(server));
			arguments.push(quote!(current_player_id));
			invocation.path.to_token_stream()
		}
		Invocation::Instance(invocation) => {
			let method = &invocation.method;
			quote!(instance.#method)
		}
	};
	if descriptor.argument.is_some() {
		arguments.push(quote!(function_context.function_argument));
	}
	if descriptor.wants_logger {
		arguments.push(quote!(log));
	}

	let call = quote!(#callee(#(#arguments),*));
	if descriptor.is_async { quote!(#call.await) } else { call }
}
