//! Declaration index.
//!
//! Built once per pass from the parsed source files. It owns every marked
//! declaration together with the facts validation needs about the surrounding
//! program: struct layouts, `Default` implementations, and the single
//! default-access declaration.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use syn::{Attribute, FnArg, ImplItem, Item, Pat, ReturnType, Signature, Visibility};
use tracing::debug;

use crate::config::Conventions;
use crate::error::{GenerateError, Result};
use crate::marker::{AccessLevel, DefaultAccessMarker, FunctionMarker, is_marker};

mod identity;
mod scope;

pub use identity::TypeIdentity;
pub(crate) use scope::ModuleScope;
pub use scope::ModulePath;

#[cfg(test)]
mod tests;

/// One parsed source file and the module it defines.
#[derive(Debug, Clone)]
pub struct SourceFile {
	pub module: ModulePath,
	pub syntax: syn::File,
	/// Where the file was read from, for diagnostics.
	pub origin: Option<PathBuf>,
}

impl SourceFile {
	pub fn new(module: ModulePath, syntax: syn::File) -> Self {
		Self {
			module,
			syntax,
			origin: None,
		}
	}

	pub fn parse(module: ModulePath, source: &str) -> syn::Result<Self> {
		Ok(Self::new(module, syn::parse_file(source)?))
	}

	pub fn with_origin(mut self, origin: &Path) -> Self {
		self.origin = Some(origin.to_path_buf());
		self
	}
}

/// Declared visibility, reduced to what matters for generated code at the crate root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
	/// `pub`
	Public,
	/// `pub(crate)` or `pub(in crate)`
	Crate,
	/// `pub(super)` or `pub(in path)`
	Restricted,
	/// No modifier, or `pub(self)`
	Private,
}

impl Accessibility {
	pub fn of(vis: &Visibility) -> Self {
		match vis {
			Visibility::Public(_) => Self::Public,
			Visibility::Inherited => Self::Private,
			Visibility::Restricted(restricted) => {
				if restricted.path.is_ident("crate") {
					Self::Crate
				} else if restricted.path.is_ident("self") {
					Self::Private
				} else {
					Self::Restricted
				}
			}
		}
	}

	/// Whether code elsewhere in the same crate can name the item.
	pub fn is_crate_visible(self) -> bool {
		matches!(self, Self::Public | Self::Crate)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
	/// Binding name, or `argN` for patterns that are not a plain identifier.
	pub name: String,
	pub ty: TypeIdentity,
}

/// The self type of the `impl` block a method was declared in.
#[derive(Debug, Clone)]
pub struct ContainingType {
	/// Resolved path, generic arguments included.
	pub path: syn::Path,
	/// The `impl` block declares its own generic parameters.
	pub is_generic: bool,
}

/// A function carrying the function marker, as found in the source.
#[derive(Debug, Clone)]
pub struct AnnotatedDeclaration {
	pub name: syn::Ident,
	pub module: ModulePath,
	pub containing_type: Option<ContainingType>,
	/// No `self` receiver.
	pub is_static: bool,
	pub accessibility: Accessibility,
	/// Parameters after the receiver, in declaration order.
	pub parameters: Vec<Parameter>,
	/// `None` when the return type is omitted.
	pub return_type: Option<TypeIdentity>,
	pub is_async: bool,
	/// The signature declares its own generic parameters.
	pub has_generic_params: bool,
	/// Declared inside an `impl` block, whether or not its self type could be resolved.
	pub in_impl: bool,
	pub marker: std::result::Result<FunctionMarker, syn::Error>,
	/// File the declaration was read from, when known.
	pub origin: Option<PathBuf>,
}

impl AnnotatedDeclaration {
	/// Fully qualified path of the function, usable in expression position.
	pub fn callable_path(&self) -> syn::Path {
		let mut path = match &self.containing_type {
			Some(containing) => containing.path.clone(),
			None => self.module.to_path(),
		};
		for segment in path.segments.iter_mut() {
			if let syn::PathArguments::AngleBracketed(arguments) = &mut segment.arguments {
				arguments.colon2_token = Some(Default::default());
			}
		}
		path.segments.push(syn::PathSegment::from(self.name.clone()));
		path
	}

	/// Human-readable location, e.g. `crate::api::Inventory::grant`.
	pub fn qualified_name(&self) -> String {
		let path = self.callable_path();
		path.segments
			.iter()
			.map(|segment| segment.ident.to_string())
			.collect::<Vec<_>>()
			.join("::")
	}
}

#[derive(Debug, Clone)]
pub struct FieldShape {
	pub name: String,
	pub accessibility: Accessibility,
	pub ty: TypeIdentity,
}

/// A struct declared somewhere in the program.
#[derive(Debug, Clone)]
pub struct StructShape {
	pub path: syn::Path,
	pub fields: Vec<FieldShape>,
	pub derives_default: bool,
}

/// Facts about a containing type needed by the instance convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainingTypeShape {
	/// A non-generic struct declared in the program.
	pub is_concrete: bool,
	/// Implements `Default`, by derive or by an explicit `impl`.
	pub has_parameterless_constructor: bool,
	/// A crate-visible field of the service-client type under the configured name.
	pub server_settable: bool,
	/// A crate-visible text field under the configured caller-id name.
	pub caller_id_settable: bool,
}

/// Snapshot of the program taken once per generation pass.
#[derive(Debug)]
pub struct DeclarationIndex {
	default_access: AccessLevel,
	declarations: Vec<AnnotatedDeclaration>,
	structs: HashMap<String, StructShape>,
	default_impls: HashSet<String>,
}

impl DeclarationIndex {
	/// Scans `files` in order. Fails if no default-access declaration exists.
	pub fn build(files: &[SourceFile], conventions: &Conventions) -> Result<Self> {
		let mut scanner = Scanner {
			conventions,
			origin: None,
			default_access: None,
			declarations: Vec::new(),
			structs: HashMap::new(),
			default_impls: HashSet::new(),
		};
		for file in files {
			scanner.origin = file.origin.clone();
			scanner.scan_items(file.module.clone(), &file.syntax.items)?;
		}

		let Some(default_access) = scanner.default_access else {
			return Err(GenerateError::MissingDefaultAccess {
				marker: conventions.default_access_marker.clone(),
			});
		};

		debug!(
			declarations = scanner.declarations.len(),
			structs = scanner.structs.len(),
			%default_access,
			"declaration index built"
		);

		Ok(Self {
			default_access,
			declarations: scanner.declarations,
			structs: scanner.structs,
			default_impls: scanner.default_impls,
		})
	}

	/// The process-wide default access level.
	pub fn default_access(&self) -> AccessLevel {
		self.default_access
	}

	/// Marked declarations in discovery order.
	pub fn declarations(&self) -> impl Iterator<Item = &AnnotatedDeclaration> {
		self.declarations.iter()
	}

	pub fn struct_shape(&self, path: &syn::Path) -> Option<&StructShape> {
		self.structs.get(&type_key(path))
	}

	/// Derives the instance-convention facts for `containing`.
	pub fn containing_shape(&self, containing: &ContainingType, conventions: &Conventions) -> ContainingTypeShape {
		let Some(shape) = self.struct_shape(&containing.path) else {
			return ContainingTypeShape::default();
		};
		let key = type_key(&containing.path);
		let settable = |name: &syn::Ident, ty: &TypeIdentity| {
			shape
				.fields
				.iter()
				.any(|field| *name == field.name && field.accessibility.is_crate_visible() && field.ty == *ty)
		};

		ContainingTypeShape {
			is_concrete: !containing.is_generic,
			has_parameterless_constructor: shape.derives_default || self.default_impls.contains(&key),
			server_settable: settable(&conventions.server_field, &conventions.service_client),
			caller_id_settable: settable(&conventions.caller_id_field, &conventions.text),
		}
	}
}

struct Scanner<'a> {
	conventions: &'a Conventions,
	origin: Option<PathBuf>,
	default_access: Option<AccessLevel>,
	declarations: Vec<AnnotatedDeclaration>,
	structs: HashMap<String, StructShape>,
	default_impls: HashSet<String>,
}

impl Scanner<'_> {
	fn scan_items(&mut self, module: ModulePath, items: &[Item]) -> Result<()> {
		let scope = ModuleScope::collect(module, items);
		for item in items {
			match item {
				Item::Fn(item) => {
					if let Some(attr) = self.function_marker(&item.attrs) {
						let declaration = declaration(&scope, &item.sig, &item.vis, attr, None, false);
						self.push(declaration);
					}
				}
				Item::Impl(item) => self.scan_impl(&scope, item),
				Item::Struct(item) => self.record_struct(&scope, item),
				Item::Mod(item) => {
					if let Some((_, content)) = &item.content {
						self.scan_items(scope.module().child(&item.ident.to_string()), content)?;
					}
				}
				Item::Macro(item) => self.record_default_access(&scope, item)?,
				_ => {}
			}
		}
		Ok(())
	}

	fn push(&mut self, mut declaration: AnnotatedDeclaration) {
		declaration.origin = self.origin.clone();
		self.declarations.push(declaration);
	}

	fn function_marker<'b>(&self, attrs: &'b [Attribute]) -> Option<&'b Attribute> {
		attrs.iter().find(|attr| is_marker(attr, &self.conventions.function_marker))
	}

	fn scan_impl(&mut self, scope: &ModuleScope, item: &syn::ItemImpl) {
		let self_path = match &*item.self_ty {
			syn::Type::Path(ty) if ty.qself.is_none() => Some(scope.resolve_path(&ty.path, None)),
			_ => None,
		};

		if let (Some((_, trait_path, _)), Some(self_path)) = (&item.trait_, &self_path)
			&& trait_path.segments.last().is_some_and(|segment| segment.ident == "Default")
		{
			self.default_impls.insert(type_key(self_path));
		}

		let containing = self_path.map(|path| ContainingType {
			path,
			is_generic: !item.generics.params.is_empty(),
		});

		for impl_item in &item.items {
			let ImplItem::Fn(function) = impl_item else {
				continue;
			};
			if let Some(attr) = self.function_marker(&function.attrs) {
				let declaration = declaration(scope, &function.sig, &function.vis, attr, containing.clone(), true);
				self.push(declaration);
			}
		}
	}

	fn record_struct(&mut self, scope: &ModuleScope, item: &syn::ItemStruct) {
		let path = scope.module().join(&item.ident);
		let fields = match &item.fields {
			syn::Fields::Named(fields) => fields
				.named
				.iter()
				.filter_map(|field| {
					Some(FieldShape {
						name: field.ident.as_ref()?.to_string(),
						accessibility: Accessibility::of(&field.vis),
						ty: scope.resolve_type(&field.ty, Some(&path)),
					})
				})
				.collect(),
			_ => Vec::new(),
		};
		let shape = StructShape {
			derives_default: derives(&item.attrs, "Default"),
			path,
			fields,
		};
		self.structs.insert(type_key(&shape.path), shape);
	}

	fn record_default_access(&mut self, scope: &ModuleScope, item: &syn::ItemMacro) -> Result<()> {
		let marker = &self.conventions.default_access_marker;
		if !item.mac.path.segments.last().is_some_and(|segment| segment.ident == marker) {
			return Ok(());
		}

		let DefaultAccessMarker(level) =
			item.mac
				.parse_body::<DefaultAccessMarker>()
				.map_err(|error| GenerateError::InvalidDefaultAccess {
					marker: marker.clone(),
					module: scope.module().to_string(),
					error,
				})?;

		match self.default_access {
			None => self.default_access = Some(level),
			Some(first) => debug!(
				module = %scope.module(),
				ignored = %level,
				kept = %first,
				"additional default-access declaration ignored"
			),
		}
		Ok(())
	}
}

fn declaration(
	scope: &ModuleScope,
	sig: &Signature,
	vis: &Visibility,
	marker: &Attribute,
	containing_type: Option<ContainingType>,
	in_impl: bool,
) -> AnnotatedDeclaration {
	let self_type = containing_type.as_ref().map(|containing| &containing.path);
	let mut is_static = true;
	let mut parameters = Vec::new();

	for input in &sig.inputs {
		match input {
			FnArg::Receiver(_) => is_static = false,
			FnArg::Typed(typed) => parameters.push(Parameter {
				name: parameter_name(&typed.pat, parameters.len()),
				ty: scope.resolve_type(&typed.ty, self_type),
			}),
		}
	}

	let return_type = match &sig.output {
		ReturnType::Default => None,
		ReturnType::Type(_, ty) => Some(scope.resolve_type(ty, self_type)),
	};

	AnnotatedDeclaration {
		name: sig.ident.clone(),
		module: scope.module().clone(),
		containing_type,
		is_static,
		accessibility: Accessibility::of(vis),
		parameters,
		return_type,
		is_async: sig.asyncness.is_some(),
		has_generic_params: !sig.generics.params.is_empty(),
		in_impl,
		marker: FunctionMarker::from_attribute(marker),
		origin: None,
	}
}

fn parameter_name(pat: &Pat, position: usize) -> String {
	match pat {
		Pat::Ident(ident) => ident.ident.to_string(),
		_ => format!("arg{position}"),
	}
}

/// Returns true if `#[derive(...)]` on the item lists `name`.
fn derives(attrs: &[Attribute], name: &str) -> bool {
	let mut found = false;
	for attr in attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
		let parsed = attr.parse_nested_meta(|meta| {
			if meta.path.segments.last().is_some_and(|segment| segment.ident == name) {
				found = true;
			}
			Ok(())
		});
		if let Err(error) = parsed {
			debug!(%error, derive = name, "unreadable derive list, treating the derive as absent");
		}
	}
	found
}

/// Lookup key for a type path: its segments without generic arguments.
fn type_key(path: &syn::Path) -> String {
	path.segments
		.iter()
		.map(|segment| segment.ident.to_string())
		.collect::<Vec<_>>()
		.join("::")
}
