use pretty_assertions::assert_eq;
use rstest::rstest;
use syn::parse_quote;

use super::*;
use crate::config::GeneratorConfig;

fn conventions() -> Conventions {
	GeneratorConfig::default().conventions().unwrap()
}

fn file(module: &str, source: &str) -> SourceFile {
	SourceFile::parse(ModulePath::parse(module).unwrap(), source).unwrap()
}

fn index(files: &[SourceFile]) -> DeclarationIndex {
	DeclarationIndex::build(files, &conventions()).unwrap()
}

fn only(index: &DeclarationIndex) -> &AnnotatedDeclaration {
	let declarations: Vec<_> = index.declarations().collect();
	assert_eq!(declarations.len(), 1, "expected exactly one declaration");
	declarations[0]
}

const ROOT: &str = "relay_macros::default_access!(Restricted);";

#[test]
fn missing_default_access_is_fatal() {
	let files = [file(
		"crate",
		"#[remote_function] pub async fn foo(c: relay_runtime::ServiceClient, id: String) {}",
	)];
	let err = DeclarationIndex::build(&files, &conventions()).unwrap_err();
	assert!(matches!(err, GenerateError::MissingDefaultAccess { ref marker } if marker == "default_access"));
}

#[test]
fn malformed_default_access_is_fatal() {
	let files = [file("crate", "default_access!(Everyone);")];
	let err = DeclarationIndex::build(&files, &conventions()).unwrap_err();
	assert!(matches!(err, GenerateError::InvalidDefaultAccess { .. }));
}

#[test]
fn first_default_access_wins() {
	let files = [
		file("crate", "default_access!(Open);"),
		file("crate::api", "default_access!(AccessLevel::Restricted);"),
	];
	assert_eq!(index(&files).default_access(), AccessLevel::Open);
}

#[test]
fn default_access_may_live_in_a_nested_module() {
	let files = [file("crate", "mod settings { default_access!(Restricted); }")];
	assert_eq!(index(&files).default_access(), AccessLevel::Restricted);
}

#[test]
fn unmarked_functions_are_skipped() {
	let files = [file(
		"crate",
		r#"
default_access!(Open);
pub async fn plain(c: relay_runtime::ServiceClient, id: String) {}
#[inline]
pub fn inlined() {}
"#,
	)];
	assert_eq!(index(&files).declarations().count(), 0);
}

#[test]
fn resolves_imports_renames_and_local_types() {
	let files = [file(
		"crate::api",
		r#"
use relay_runtime::{ServiceClient, Logger as Log};
use crate::models::Reward;

pub struct GrantRequest { pub amount: u32 }

#[remote_function(name = "Grant")]
pub async fn grant(c: ServiceClient, id: std::string::String, req: GrantRequest, log: Log) -> Vec<Reward> {
	todo!()
}
"#,
	)];
	let mut all = vec![file("crate", ROOT)];
	all.extend(files);
	let index = index(&all);
	let declaration = only(&index);

	let types: Vec<String> = declaration.parameters.iter().map(|p| p.ty.to_string()).collect();
	assert_eq!(
		types,
		vec![
			"relay_runtime::ServiceClient",
			"String",
			"crate::api::GrantRequest",
			"relay_runtime::Logger",
		]
	);
	assert_eq!(
		declaration.return_type.as_ref().map(ToString::to_string).as_deref(),
		Some("Vec<crate::models::Reward>")
	);
	assert_eq!(declaration.marker.as_ref().unwrap().name.as_deref(), Some("Grant"));
	assert!(declaration.is_static);
	assert!(declaration.is_async);
	assert_eq!(declaration.qualified_name(), "crate::api::grant");
}

#[test]
fn relative_imports_are_absolutized() {
	let files = [
		file("crate", ROOT),
		file(
			"crate::api::v1",
			r#"
use super::shared::Request;
use self::inner::Reply;
mod inner { pub struct Reply; }
#[remote_function]
pub fn call(c: ::relay_runtime::ServiceClient, id: String, r: Request) -> Reply { todo!() }
"#,
		),
	];
	let index = index(&files);
	let declaration = only(&index);
	assert_eq!(declaration.parameters[0].ty, conventions().service_client);
	assert_eq!(declaration.parameters[2].ty.to_string(), "crate::api::shared::Request");
	assert_eq!(
		declaration.return_type.as_ref().unwrap().to_string(),
		"crate::api::v1::inner::Reply"
	);
	assert!(!declaration.is_async);
}

#[test]
fn inline_modules_extend_the_module_path() {
	let files = [file(
		"crate",
		r#"
default_access!(Open);
pub mod shop {
	pub struct Cart;
	#[remote_function]
	pub fn checkout(c: relay_runtime::ServiceClient, id: String, cart: Cart) {}
}
"#,
	)];
	let index = index(&files);
	let declaration = only(&index);
	assert_eq!(declaration.module.to_string(), "crate::shop");
	assert_eq!(declaration.parameters[2].ty.to_string(), "crate::shop::Cart");
	assert_eq!(declaration.return_type, None);
}

#[test]
fn methods_record_their_containing_type() {
	let files = [
		file("crate", ROOT),
		file(
			"crate::player",
			r#"
use relay_runtime::ServiceClient;

#[derive(Debug, Default)]
pub struct Profile {
	pub server: ServiceClient,
	pub(crate) current_player_id: String,
	cache: Vec<u8>,
}

impl Profile {
	#[relay_macros::remote_function(access = Open)]
	pub async fn rename(&self, name: String) -> Self { todo!() }
}
"#,
		),
	];
	let index = index(&files);
	let declaration = only(&index);
	assert!(!declaration.is_static);
	assert_eq!(declaration.parameters.len(), 1);
	assert_eq!(declaration.return_type.as_ref().unwrap().to_string(), "crate::player::Profile");

	let containing = declaration.containing_type.as_ref().unwrap();
	let expected: syn::Path = parse_quote!(crate::player::Profile);
	assert_eq!(containing.path, expected);
	assert_eq!(
		index.containing_shape(containing, &conventions()),
		ContainingTypeShape {
			is_concrete: true,
			has_parameterless_constructor: true,
			server_settable: true,
			caller_id_settable: true,
		}
	);
}

#[test]
fn explicit_default_impl_counts_as_constructor() {
	let files = [
		file("crate", ROOT),
		file(
			"crate::a",
			r#"
pub struct Session { pub server: relay_runtime::ServiceClient, current_player_id: String }
impl Session {
	#[remote_function]
	pub fn ping(&self) {}
}
"#,
		),
		file(
			"crate::b",
			"impl Default for crate::a::Session { fn default() -> Self { todo!() } }",
		),
	];
	let index = index(&files);
	let containing = only(&index).containing_type.clone().unwrap();
	let shape = index.containing_shape(&containing, &conventions());
	assert!(shape.has_parameterless_constructor);
	assert!(shape.server_settable);
	assert!(!shape.caller_id_settable, "private field is not settable");
}

#[test]
fn unknown_and_generic_containing_types() {
	let files = [file(
		"crate",
		r#"
default_access!(Open);
#[derive(Default)]
pub struct Holder<T> { pub server: relay_runtime::ServiceClient, pub current_player_id: String, value: T }
impl<T> Holder<T> {
	#[remote_function]
	pub fn hold(&self) {}
}
impl std::fmt::Display {
	#[remote_function]
	pub fn odd(&self) {}
}
"#,
	)];
	let index = index(&files);
	let declarations: Vec<_> = index.declarations().collect();
	assert_eq!(declarations.len(), 2);

	let generic = declarations[0].containing_type.as_ref().unwrap();
	assert!(generic.is_generic);
	assert!(!index.containing_shape(generic, &conventions()).is_concrete);

	let unknown = declarations[1].containing_type.as_ref().unwrap();
	assert_eq!(index.containing_shape(unknown, &conventions()), ContainingTypeShape::default());
}

#[test]
fn malformed_marker_is_kept_for_validation() {
	let files = [file(
		"crate",
		r#"
default_access!(Open);
#[remote_function(route = "/x")]
pub fn routed(c: relay_runtime::ServiceClient, id: String) {}
"#,
	)];
	let index = index(&files);
	assert!(only(&index).marker.is_err());
}

#[rstest]
#[case(parse_quote!(pub), Accessibility::Public)]
#[case(parse_quote!(pub(crate)), Accessibility::Crate)]
#[case(parse_quote!(pub(in crate)), Accessibility::Crate)]
#[case(parse_quote!(pub(super)), Accessibility::Restricted)]
#[case(parse_quote!(pub(in crate::api)), Accessibility::Restricted)]
#[case(parse_quote!(pub(self)), Accessibility::Private)]
#[case(Visibility::Inherited, Accessibility::Private)]
fn accessibility_of_visibility(#[case] vis: Visibility, #[case] expected: Accessibility) {
	assert_eq!(Accessibility::of(&vis), expected);
}

#[test]
fn module_paths() {
	let module = ModulePath::parse("crate::api::v1").unwrap();
	assert_eq!(module.parent().to_string(), "crate::api");
	assert_eq!(ModulePath::root().parent(), ModulePath::root());
	assert_eq!(module.child("inner").to_string(), "crate::api::v1::inner");
	assert!(ModulePath::parse("api::v1").is_none());
	assert!(ModulePath::parse("crate::").is_none());
}

#[test]
fn unreadable_derive_list_is_treated_as_absent() {
	let files = [
		file("crate", ROOT),
		file(
			"crate::a",
			r#"
#[derive(= Default)]
pub struct Session { pub server: relay_runtime::ServiceClient, pub current_player_id: String }
impl Session {
	#[remote_function]
	pub fn ping(&self) {}
}
"#,
		),
	];
	let index = index(&files);
	let containing = only(&index).containing_type.clone().unwrap();
	assert!(!index.struct_shape(&containing.path).unwrap().derives_default);
	assert!(!index.containing_shape(&containing, &conventions()).has_parameterless_constructor);
}
