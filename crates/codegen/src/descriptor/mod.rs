//! Invocation descriptors: the normalized form of an accepted declaration.

use syn::ext::IdentExt;

use crate::index::TypeIdentity;
use crate::marker::AccessLevel;
use crate::validate::{Accepted, Convention};

#[cfg(test)]
mod tests;

/// Calls a free or associated function by its full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticInvocation {
	pub path: syn::Path,
}

/// Builds the containing type, sets its two fields, then calls the method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInvocation {
	pub containing_type: syn::Path,
	pub method: syn::Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
	Static(StaticInvocation),
	Instance(InstanceInvocation),
}

/// Everything the emitter needs to render one adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationDescriptor {
	pub exposed_name: String,
	pub argument: Option<TypeIdentity>,
	pub result: Option<TypeIdentity>,
	/// The marker's own level; the process-wide default is never substituted here.
	pub access: AccessLevel,
	pub is_async: bool,
	pub wants_logger: bool,
	/// Parameters the adapter will not pass.
	pub ignored_parameters: Vec<String>,
	pub invocation: Invocation,
}

impl InvocationDescriptor {
	/// Name of the generated adapter function.
	pub fn adapter_name(&self) -> String {
		format!("{}_Generated", self.exposed_name)
	}
}

/// Builds the descriptor for an accepted declaration. Never fails.
pub fn classify(accepted: Accepted<'_>) -> InvocationDescriptor {
	let declaration = accepted.declaration;
	let exposed_name = accepted
		.marker
		.name
		.unwrap_or_else(|| declaration.name.unraw().to_string());

	let invocation = match (accepted.convention, &declaration.containing_type) {
		(Convention::Instance, Some(containing)) => Invocation::Instance(InstanceInvocation {
			containing_type: containing.path.clone(),
			method: declaration.name.clone(),
		}),
		// Validation only accepts the instance convention with a containing type.
		_ => Invocation::Static(StaticInvocation {
			path: declaration.callable_path(),
		}),
	};

	InvocationDescriptor {
		exposed_name,
		argument: accepted.slots.argument,
		result: accepted.result,
		access: accepted.marker.access.unwrap_or_default(),
		is_async: declaration.is_async,
		wants_logger: accepted.slots.logger,
		ignored_parameters: accepted.slots.ignored,
		invocation,
	}
}
