//! Module paths and per-module name resolution.

use std::collections::{HashMap, HashSet};
use std::fmt;

use proc_macro2::Span;
use quote::format_ident;
use syn::punctuated::Punctuated;
use syn::visit_mut::{self, VisitMut};
use syn::{Item, PathSegment, UseTree};

use super::TypeIdentity;

/// Absolute path of a module, always rooted at `crate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
	pub fn root() -> Self {
		Self(vec!["crate".to_string()])
	}

	/// Parses `crate`, `crate::api` and the like.
	pub fn parse(path: &str) -> Option<Self> {
		let segments: Vec<String> = path.split("::").map(|s| s.trim().to_string()).collect();
		if segments.first().map(String::as_str) != Some("crate")
			|| segments[1..].iter().any(|segment| syn::parse_str::<syn::Ident>(segment).is_err())
		{
			return None;
		}
		Some(Self(segments))
	}

	pub fn child(&self, name: &str) -> Self {
		let mut segments = self.0.clone();
		segments.push(name.to_string());
		Self(segments)
	}

	/// The enclosing module; the crate root is its own parent.
	pub fn parent(&self) -> Self {
		if self.0.len() > 1 {
			Self(self.0[..self.0.len() - 1].to_vec())
		} else {
			self.clone()
		}
	}

	/// The module as a `syn` path.
	pub fn to_path(&self) -> syn::Path {
		syn::Path {
			leading_colon: None,
			segments: self.segments().collect(),
		}
	}

	/// `crate::module::name` for an item declared in this module.
	pub fn join(&self, name: &syn::Ident) -> syn::Path {
		let mut path = self.to_path();
		path.segments.push(PathSegment::from(name.clone()));
		path
	}

	fn segments(&self) -> impl Iterator<Item = PathSegment> + '_ {
		self.0
			.iter()
			.map(|segment| PathSegment::from(format_ident!("{segment}")))
	}
}

impl fmt::Display for ModulePath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.join("::"))
	}
}

/// Names visible inside one module: its `use` imports and the items it declares.
#[derive(Debug, Clone)]
pub(crate) struct ModuleScope {
	module: ModulePath,
	imports: HashMap<String, syn::Path>,
	locals: HashSet<String>,
}

impl ModuleScope {
	pub fn collect(module: ModulePath, items: &[Item]) -> Self {
		let mut scope = Self {
			module,
			imports: HashMap::new(),
			locals: HashSet::new(),
		};

		for item in items {
			let ident = match item {
				Item::Struct(item) => &item.ident,
				Item::Enum(item) => &item.ident,
				Item::Union(item) => &item.ident,
				Item::Type(item) => &item.ident,
				Item::Trait(item) => &item.ident,
				Item::Mod(item) => &item.ident,
				_ => continue,
			};
			scope.locals.insert(ident.to_string());
		}

		for item in items {
			if let Item::Use(item) = item {
				scope.collect_use(&item.tree, &mut Vec::new(), item.leading_colon.is_some());
			}
		}

		scope
	}

	pub fn module(&self) -> &ModulePath {
		&self.module
	}

	fn collect_use(&mut self, tree: &UseTree, prefix: &mut Vec<syn::Ident>, external: bool) {
		match tree {
			UseTree::Path(path) => {
				prefix.push(path.ident.clone());
				self.collect_use(&path.tree, prefix, external);
				prefix.pop();
			}
			UseTree::Name(name) if name.ident == "self" => {
				if let Some(last) = prefix.last() {
					let key = last.to_string();
					self.insert_import(key, prefix.clone(), external);
				}
			}
			UseTree::Name(name) => {
				let mut target = prefix.clone();
				target.push(name.ident.clone());
				self.insert_import(name.ident.to_string(), target, external);
			}
			UseTree::Rename(rename) => {
				let mut target = prefix.clone();
				if rename.ident != "self" {
					target.push(rename.ident.clone());
				}
				if rename.rename != "_" {
					self.insert_import(rename.rename.to_string(), target, external);
				}
			}
			UseTree::Group(group) => {
				for tree in &group.items {
					self.collect_use(tree, prefix, external);
				}
			}
			UseTree::Glob(_) => {
				tracing::trace!(module = %self.module, "glob import left unresolved");
			}
		}
	}

	fn insert_import(&mut self, key: String, target: Vec<syn::Ident>, external: bool) {
		let path = syn::Path {
			leading_colon: None,
			segments: target.into_iter().map(PathSegment::from).collect(),
		};
		let path = if external { path } else { self.absolutize(&path) };
		self.imports.insert(key, path);
	}

	/// Rewrites `self::`, `super::` and local-module heads to `crate::` paths.
	fn absolutize(&self, path: &syn::Path) -> syn::Path {
		let segments: Vec<PathSegment> = path.segments.iter().cloned().collect();
		let Some(first) = segments.first() else {
			return path.clone();
		};

		let resolved = if first.ident == "crate" {
			segments
		} else if first.ident == "self" {
			prefixed(&self.module, &segments[1..])
		} else if first.ident == "super" {
			let mut module = self.module.clone();
			let mut rest = &segments[..];
			while rest.first().is_some_and(|segment| segment.ident == "super") {
				module = module.parent();
				rest = &rest[1..];
			}
			prefixed(&module, rest)
		} else if self.locals.contains(&first.ident.to_string()) {
			prefixed(&self.module, &segments)
		} else {
			segments
		};

		syn::Path {
			leading_colon: None,
			segments: resolved.into_iter().collect(),
		}
	}

	/// Resolves a path as it would be seen from this module.
	pub fn resolve_path(&self, path: &syn::Path, self_type: Option<&syn::Path>) -> syn::Path {
		if path.leading_colon.is_some() {
			let mut path = path.clone();
			path.leading_colon = None;
			return canonical(path);
		}

		let Some(first) = path.segments.first() else {
			return path.clone();
		};
		let rest: Vec<PathSegment> = path.segments.iter().skip(1).cloned().collect();
		let head = first.ident.to_string();

		let replace_head = |target: &syn::Path| -> syn::Path {
			let mut segments: Vec<PathSegment> = target.segments.iter().cloned().collect();
			if let Some(last) = segments.last_mut()
				&& !first.arguments.is_none()
			{
				last.arguments = first.arguments.clone();
			}
			segments.extend(rest.iter().cloned());
			syn::Path {
				leading_colon: None,
				segments: segments.into_iter().collect(),
			}
		};

		let resolved = match head.as_str() {
			"Self" => match self_type {
				Some(self_type) => replace_head(self_type),
				None => path.clone(),
			},
			"crate" | "self" | "super" => self.absolutize(path),
			_ => {
				if let Some(target) = self.imports.get(&head) {
					replace_head(target)
				} else if self.locals.contains(&head) {
					self.absolutize(path)
				} else {
					path.clone()
				}
			}
		};
		canonical(resolved)
	}

	/// Resolves every path inside `ty` and wraps the result as an identity.
	pub fn resolve_type(&self, ty: &syn::Type, self_type: Option<&syn::Path>) -> TypeIdentity {
		let mut ty = ty.clone();
		Resolver { scope: self, self_type }.visit_type_mut(&mut ty);
		TypeIdentity::new(strip_groups(ty))
	}
}

struct Resolver<'a> {
	scope: &'a ModuleScope,
	self_type: Option<&'a syn::Path>,
}

impl VisitMut for Resolver<'_> {
	fn visit_type_path_mut(&mut self, node: &mut syn::TypePath) {
		visit_mut::visit_type_path_mut(self, node);
		if node.qself.is_none() {
			node.path = self.scope.resolve_path(&node.path, self.self_type);
		}
	}

	fn visit_trait_bound_mut(&mut self, node: &mut syn::TraitBound) {
		visit_mut::visit_trait_bound_mut(self, node);
		node.path = self.scope.resolve_path(&node.path, self.self_type);
	}
}

fn prefixed(module: &ModulePath, rest: &[PathSegment]) -> Vec<PathSegment> {
	module.segments().chain(rest.iter().cloned()).collect()
}

/// Collapses the spellings of the standard text type to `String`.
fn canonical(path: syn::Path) -> syn::Path {
	let idents: Vec<String> = path.segments.iter().map(|segment| segment.ident.to_string()).collect();
	let is_text = matches!(
		idents.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
		["std", "string", "String"] | ["alloc", "string", "String"]
	) && path.segments.iter().all(|segment| segment.arguments.is_none());

	if is_text {
		let segments: Punctuated<PathSegment, syn::Token![::]> =
			std::iter::once(PathSegment::from(syn::Ident::new("String", Span::call_site()))).collect();
		syn::Path {
			leading_colon: None,
			segments,
		}
	} else {
		path
	}
}

/// Drops invisible `Type::Group` wrappers left behind by macro expansion.
fn strip_groups(ty: syn::Type) -> syn::Type {
	match ty {
		syn::Type::Group(group) => strip_groups(*group.elem),
		syn::Type::Paren(paren) => strip_groups(*paren.elem),
		other => other,
	}
}
