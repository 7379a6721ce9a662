use std::fmt;
use std::hash::{Hash, Hasher};

use quote::ToTokens;

/// A resolved type, compared by its canonical rendering.
///
/// Two identities are equal when their resolved token streams render the same,
/// which makes `ServiceClient` imported from `relay_runtime` equal to a written-out
/// `relay_runtime::ServiceClient`.
#[derive(Debug, Clone)]
pub struct TypeIdentity {
	ty: syn::Type,
	key: String,
}

impl TypeIdentity {
	/// Wraps an already resolved type.
	pub fn new(ty: syn::Type) -> Self {
		let key = ty.to_token_stream().to_string();
		Self { ty, key }
	}

	pub fn from_path(path: syn::Path) -> Self {
		Self::new(syn::Type::Path(syn::TypePath { qself: None, path }))
	}

	/// The text type every `String` spelling canonicalizes to.
	pub fn text() -> Self {
		Self::from_path(syn::parse_quote!(String))
	}

	/// Returns true for `()`.
	pub fn is_unit(&self) -> bool {
		matches!(&self.ty, syn::Type::Tuple(tuple) if tuple.elems.is_empty())
	}

	pub fn ty(&self) -> &syn::Type {
		&self.ty
	}

	pub fn as_str(&self) -> &str {
		&self.key
	}
}

impl PartialEq for TypeIdentity {
	fn eq(&self, other: &Self) -> bool {
		self.key == other.key
	}
}

impl Eq for TypeIdentity {}

impl Hash for TypeIdentity {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.key.hash(state);
	}
}

impl fmt::Display for TypeIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let compact = self
			.key
			.replace(" :: ", "::")
			.replace(":: ", "::")
			.replace(" < ", "<")
			.replace(" >", ">")
			.replace(" ,", ",")
			.replace("& ", "&");
		f.write_str(&compact)
	}
}
