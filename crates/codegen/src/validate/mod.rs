//! Shape validation.
//!
//! Decides, per declaration, whether it follows the static or the instance
//! calling convention. A declaration that fits neither is rejected with a
//! [`Rejection`]; rejections never abort the pass and never affect other
//! declarations.

use thiserror::Error;

use crate::config::Conventions;
use crate::index::{AnnotatedDeclaration, DeclarationIndex, Parameter, TypeIdentity};
use crate::marker::FunctionMarker;


/// Why a marked declaration produced no adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
	#[error("not visible to the rest of the crate (needs `pub` or `pub(crate)`)")]
	NotAccessible,
	#[error("marker arguments are malformed: {0}")]
	MalformedMarker(String),
	#[error("exposed name `{0}` is not a valid identifier")]
	InvalidExposedName(String),
	#[error("generated code cannot name this function (generic parameters, or an `impl` whose self type is not a plain path)")]
	NotNameable,
	#[error("a static function needs at least a service client and a caller id, found {found} parameter(s)")]
	TooFewParameters { found: usize },
	#[error("first parameter must be the service client `{expected}`, found `{found}`")]
	ServiceClientMismatch { expected: String, found: String },
	#[error("second parameter must be the caller id `{expected}`, found `{found}`")]
	CallerIdMismatch { expected: String, found: String },
	#[error("method is not declared on a concrete struct of this crate")]
	UnknownContainingType,
	#[error("containing type does not implement `Default`")]
	NoParameterlessConstructor,
	#[error("containing type has no crate-visible `{field}` field of type `{ty}`")]
	MissingServerField { field: String, ty: String },
	#[error("containing type has no crate-visible `{field}` field of type `{ty}`")]
	MissingCallerIdField { field: String, ty: String },
}

/// The calling convention a declaration was accepted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
	/// `f(service_client, caller_id, [argument], [logger])`
	Static,
	/// `Type::default()`, then `server` and `current_player_id` set, then `.f([argument], [logger])`
	Instance,
}

/// Positional slots of an accepted declaration after the convention's fixed prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slots {
	pub argument: Option<TypeIdentity>,
	pub logger: bool,
	/// Parameters that fill neither slot; they are not passed by the adapter.
	pub ignored: Vec<String>,
}

/// A declaration that passed validation, with its slots assigned.
#[derive(Debug, Clone)]
pub struct Accepted<'a> {
	pub declaration: &'a AnnotatedDeclaration,
	pub marker: FunctionMarker,
	pub convention: Convention,
	pub slots: Slots,
	/// `None` for `()` or an omitted return type.
	pub result: Option<TypeIdentity>,
}

/// Checks `declaration` against both conventions.
pub fn validate<'a>(
	declaration: &'a AnnotatedDeclaration,
	index: &DeclarationIndex,
	conventions: &Conventions,
) -> Result<Accepted<'a>, Rejection> {
	if !declaration.accessibility.is_crate_visible() {
		return Err(Rejection::NotAccessible);
	}

	let marker = declaration
		.marker
		.clone()
		.map_err(|error| Rejection::MalformedMarker(error.to_string()))?;
	if let Some(name) = &marker.name
		&& syn::parse_str::<syn::Ident>(&format!("{name}_Generated")).is_err()
	{
		return Err(Rejection::InvalidExposedName(name.clone()));
	}

	if declaration.has_generic_params {
		return Err(Rejection::NotNameable);
	}

	let (convention, slots) = if declaration.is_static {
		(Convention::Static, check_static(declaration, conventions)?)
	} else {
		(Convention::Instance, check_instance(declaration, index, conventions)?)
	};

	let result = declaration.return_type.clone().filter(|ty| !ty.is_unit());

	Ok(Accepted {
		declaration,
		marker,
		convention,
		slots,
		result,
	})
}

fn check_static(declaration: &AnnotatedDeclaration, conventions: &Conventions) -> Result<Slots, Rejection> {
	if declaration.in_impl && declaration.containing_type.as_ref().is_none_or(|containing| containing.is_generic) {
		return Err(Rejection::NotNameable);
	}
	let [client, caller_id, ..] = declaration.parameters.as_slice() else {
		return Err(Rejection::TooFewParameters {
			found: declaration.parameters.len(),
		});
	};
	if client.ty != conventions.service_client {
		return Err(Rejection::ServiceClientMismatch {
			expected: conventions.service_client.to_string(),
			found: client.ty.to_string(),
		});
	}
	if caller_id.ty != conventions.text {
		return Err(Rejection::CallerIdMismatch {
			expected: conventions.text.to_string(),
			found: caller_id.ty.to_string(),
		});
	}
	Ok(assign_slots(&declaration.parameters[2..], &conventions.logger))
}

fn check_instance(
	declaration: &AnnotatedDeclaration,
	index: &DeclarationIndex,
	conventions: &Conventions,
) -> Result<Slots, Rejection> {
	let Some(containing) = &declaration.containing_type else {
		return Err(Rejection::UnknownContainingType);
	};
	let shape = index.containing_shape(containing, conventions);
	if !shape.is_concrete {
		return Err(Rejection::UnknownContainingType);
	}
	if !shape.has_parameterless_constructor {
		return Err(Rejection::NoParameterlessConstructor);
	}
	if !shape.server_settable {
		return Err(Rejection::MissingServerField {
			field: conventions.server_field.to_string(),
			ty: conventions.service_client.to_string(),
		});
	}
	if !shape.caller_id_settable {
		return Err(Rejection::MissingCallerIdField {
			field: conventions.caller_id_field.to_string(),
			ty: conventions.text.to_string(),
		});
	}
	Ok(assign_slots(&declaration.parameters, &conventions.logger))
}

/// Splits the parameters after the fixed prefix into argument and logger slots.
///
/// The logger slot is only ever the final parameter. The argument slot is the
/// first remaining parameter; anything between the two is ignored.
pub fn assign_slots(parameters: &[Parameter], logger: &TypeIdentity) -> Slots {
	let (has_logger, rest) = match parameters.split_last() {
		Some((last, rest)) if last.ty == *logger => (true, rest),
		_ => (false, parameters),
	};
	Slots {
		argument: rest.first().map(|parameter| parameter.ty.clone()),
		logger: has_logger,
		ignored: rest.iter().skip(1).map(|parameter| parameter.name.clone()).collect(),
	}
}
