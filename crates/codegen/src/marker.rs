//! Marker arguments: the function marker and the default-access marker.
//!
//! Both the generator and the `relay-macros` crate parse markers through this
//! module, so an attribute the compiler accepts is exactly one the generator
//! understands.

use proc_macro2::TokenStream;
use quote::format_ident;
use serde::Deserialize;
use strum::{Display, EnumString};
use syn::meta::ParseNestedMeta;
use syn::parse::{Parse, ParseStream, Parser};
use syn::{Attribute, LitStr, Meta};

/// Who may invoke a generated adapter.
#[derive(Debug, Default, Display, EnumString, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
	/// No explicit level; the trigger runtime applies its own default.
	#[default]
	Unspecified,
	/// Callers must present a function key.
	Restricted,
	/// Anyone may call.
	Open,
}

impl AccessLevel {
	/// Identifier used when the level is rendered into generated code.
	pub fn ident(self) -> syn::Ident {
		format_ident!("{}", self.to_string())
	}
}

/// Parses `Open`, `AccessLevel::Open` or `relay::AccessLevel::Open`.
fn parse_access_level(path: &syn::Path) -> syn::Result<AccessLevel> {
	let Some(last) = path.segments.last() else {
		return Err(syn::Error::new_spanned(path, "expected an access level"));
	};
	last.ident.to_string().parse().map_err(|_| {
		syn::Error::new_spanned(
			path,
			format!("unknown access level `{}`; expected Unspecified, Restricted or Open", last.ident),
		)
	})
}

/// Arguments of a `#[remote_function(...)]` attribute.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FunctionMarker {
	/// Exposed-name override.
	pub name: Option<String>,
	/// Desired access-level override.
	pub access: Option<AccessLevel>,
}

impl FunctionMarker {
	/// Reads the marker from an attribute already known to be the function marker.
	///
	/// A bare `#[remote_function]` carries no overrides.
	pub fn from_attribute(attr: &Attribute) -> syn::Result<Self> {
		let mut marker = Self::default();
		match &attr.meta {
			Meta::Path(_) => {}
			Meta::List(_) => attr.parse_nested_meta(|meta| marker.parse_meta(meta))?,
			Meta::NameValue(_) => {
				return Err(syn::Error::new_spanned(
					attr,
					"expected `#[remote_function]` or `#[remote_function(name = \"..\", access = ..)]`",
				));
			}
		}
		Ok(marker)
	}

	/// Parses the argument tokens of the attribute, as handed to an attribute macro.
	pub fn parse_args(args: TokenStream) -> syn::Result<Self> {
		let mut marker = Self::default();
		syn::meta::parser(|meta| marker.parse_meta(meta)).parse2(args)?;
		Ok(marker)
	}

	fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
		if meta.path.is_ident("name") {
			if self.name.is_some() {
				return Err(meta.error("duplicate `name` argument"));
			}
			let value: LitStr = meta.value()?.parse()?;
			self.name = Some(value.value());
			Ok(())
		} else if meta.path.is_ident("access") {
			if self.access.is_some() {
				return Err(meta.error("duplicate `access` argument"));
			}
			let path: syn::Path = meta.value()?.parse()?;
			self.access = Some(parse_access_level(&path)?);
			Ok(())
		} else {
			Err(meta.error("unknown remote_function argument; expected `name` or `access`"))
		}
	}
}

/// Body of the `default_access!(Level)` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultAccessMarker(pub AccessLevel);

impl Parse for DefaultAccessMarker {
	fn parse(input: ParseStream) -> syn::Result<Self> {
		let path: syn::Path = input.parse()?;
		let level = parse_access_level(&path)?;
		let _: Option<syn::Token![,]> = input.parse()?;
		Ok(Self(level))
	}
}

/// Returns true when the attribute's last path segment is `marker`.
pub(crate) fn is_marker(attr: &Attribute, marker: &str) -> bool {
	attr.path().segments.last().is_some_and(|segment| segment.ident == marker)
}

#[cfg(test)]
mod tests {
	use quote::quote;
	use syn::parse_quote;

	use super::*;

	#[test]
	fn bare_attribute_has_no_overrides() {
		let attr: Attribute = parse_quote!(#[remote_function]);
		assert_eq!(FunctionMarker::from_attribute(&attr).unwrap(), FunctionMarker::default());
	}

	#[test]
	fn reads_name_and_access() {
		let attr: Attribute = parse_quote!(#[relay::remote_function(name = "Foo", access = AccessLevel::Open)]);
		let marker = FunctionMarker::from_attribute(&attr).unwrap();
		assert_eq!(marker.name.as_deref(), Some("Foo"));
		assert_eq!(marker.access, Some(AccessLevel::Open));
	}

	#[test]
	fn macro_arguments_parse_like_attributes() {
		let marker = FunctionMarker::parse_args(quote!(access = Restricted)).unwrap();
		assert_eq!(marker.name, None);
		assert_eq!(marker.access, Some(AccessLevel::Restricted));
	}

	#[test]
	fn rejects_unknown_level_and_duplicates() {
		assert!(FunctionMarker::parse_args(quote!(access = Everyone)).is_err());
		assert!(FunctionMarker::parse_args(quote!(name = "a", name = "b")).is_err());
		assert!(FunctionMarker::parse_args(quote!(route = "/x")).is_err());
	}

	#[test]
	fn default_access_body() {
		let marker: DefaultAccessMarker = syn::parse2(quote!(AccessLevel::Restricted)).unwrap();
		assert_eq!(marker, DefaultAccessMarker(AccessLevel::Restricted));
		assert!(syn::parse2::<DefaultAccessMarker>(quote!(Nobody)).is_err());
	}

	#[test]
	fn marker_matches_last_segment() {
		let attr: Attribute = parse_quote!(#[relay_macros::remote_function]);
		assert!(is_marker(&attr, "remote_function"));
		assert!(!is_marker(&attr, "default_access"));
	}
}
