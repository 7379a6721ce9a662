use pretty_assertions::assert_eq;
use syn::parse_quote;

use super::*;
use crate::config::{Conventions, GeneratorConfig};
use crate::index::{DeclarationIndex, ModulePath, SourceFile};
use crate::validate::validate;

fn descriptors(source: &str) -> Vec<InvocationDescriptor> {
	let conventions: Conventions = GeneratorConfig::default().conventions().unwrap();
	let files = [
		SourceFile::parse(ModulePath::root(), "default_access!(Open);").unwrap(),
		SourceFile::parse(ModulePath::parse("crate::api").unwrap(), source).unwrap(),
	];
	let index = DeclarationIndex::build(&files, &conventions).unwrap();
	index
		.declarations()
		.filter_map(|declaration| validate(declaration, &index, &conventions).ok())
		.map(classify)
		.collect()
}

const SOURCE: &str = r#"
use relay_runtime::{Logger, ServiceClient};

pub struct Req;

#[remote_function(name = "Foo")]
pub async fn foo(c: ServiceClient, id: String, r: Req) -> u32 { todo!() }

#[remote_function(access = Restricted)]
pub fn sync_call(c: ServiceClient, id: String, log: Logger) {}

#[derive(Default)]
pub struct Handler { pub server: ServiceClient, pub current_player_id: String }

impl Handler {
	#[remote_function]
	pub async fn bar(&self) {}
}
"#;

#[test]
fn static_descriptor_from_marker_override() {
	let descriptors = descriptors(SOURCE);
	let foo = &descriptors[0];
	assert_eq!(foo.exposed_name, "Foo");
	assert_eq!(foo.adapter_name(), "Foo_Generated");
	assert_eq!(foo.argument.as_ref().map(ToString::to_string).as_deref(), Some("crate::api::Req"));
	assert_eq!(foo.result.as_ref().map(ToString::to_string).as_deref(), Some("u32"));
	assert!(foo.is_async);
	assert!(!foo.wants_logger);
	assert_eq!(
		foo.invocation,
		Invocation::Static(StaticInvocation {
			path: parse_quote!(crate::api::foo),
		})
	);
}

#[test]
fn access_level_comes_only_from_the_marker() {
	let descriptors = descriptors(SOURCE);
	// The program default is `Open`, but it is never applied to a descriptor.
	assert_eq!(descriptors[0].access, AccessLevel::Unspecified);
	assert_eq!(descriptors[1].access, AccessLevel::Restricted);
	assert_eq!(descriptors[2].access, AccessLevel::Unspecified);
}

#[test]
fn declaration_name_is_the_default_exposed_name() {
	let descriptors = descriptors(SOURCE);
	let sync_call = &descriptors[1];
	assert_eq!(sync_call.exposed_name, "sync_call");
	assert!(!sync_call.is_async);
	assert!(sync_call.wants_logger);
	assert_eq!(sync_call.argument, None);
	assert_eq!(sync_call.result, None);
}

#[test]
fn instance_descriptor_carries_the_containing_type() {
	let descriptors = descriptors(SOURCE);
	assert_eq!(descriptors.len(), 3);
	let bar = &descriptors[2];
	assert_eq!(bar.exposed_name, "bar");
	assert_eq!(
		bar.invocation,
		Invocation::Instance(InstanceInvocation {
			containing_type: parse_quote!(crate::api::Handler),
			method: parse_quote!(bar),
		})
	);
}

#[test]
fn ignored_parameters_are_recorded() {
	let source = r#"
use relay_runtime::ServiceClient;
#[remote_function]
pub fn wide(c: ServiceClient, id: String, a: u8, b: u16, c2: u32) {}
"#;
	let descriptors = descriptors(source);
	assert_eq!(descriptors[0].argument.as_ref().map(ToString::to_string).as_deref(), Some("u8"));
	assert_eq!(descriptors[0].ignored_parameters, vec!["b", "c2"]);
}
