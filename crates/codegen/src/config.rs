//! Generator configuration.
//!
//! Every field has a default, so an absent `relay.toml` (or an empty one) yields
//! the stock conventions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::index::TypeIdentity;

/// File name looked up next to the manifest of the crate being generated for.
pub const CONFIG_FILE: &str = "relay.toml";

/// Errors that can occur while loading or checking the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("I/O error reading {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},
	#[error("failed to parse {CONFIG_FILE}: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("`{field}` must be a type path, got `{value}`")]
	InvalidType { field: &'static str, value: String },
	#[error("`{field}` must be an identifier, got `{value}`")]
	InvalidIdent { field: &'static str, value: String },
	#[error("`{field}` must be a module path, got `{value}`")]
	InvalidPath { field: &'static str, value: String },
	#[error("`{first}` and `{second}` would both be imported as `{name}` in the generated module")]
	ConflictingImport {
		name: String,
		first: String,
		second: String,
	},
}

/// User-facing configuration, deserialized from `relay.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
	/// Type a static candidate takes first, and the type of the instance `server` field.
	pub service_client_type: String,
	/// Logging abstraction recognised as the trailing logger slot.
	pub logger_type: String,
	/// Crate providing `http_trigger`, `HttpRequest`, `FunctionContext` and `ActionResult`.
	pub runtime_crate: String,
	pub server_field: String,
	pub caller_id_field: String,
	/// Last path segment of the function marker attribute.
	pub function_marker: String,
	/// Last path segment of the default-access declaration macro.
	pub default_access_marker: String,
	/// Name of the module wrapping every generated adapter.
	pub output_module: String,
	/// Surface rejected candidates as build warnings instead of dropping them silently.
	pub warn_on_rejection: bool,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			service_client_type: "relay_runtime::ServiceClient".to_string(),
			logger_type: "relay_runtime::Logger".to_string(),
			runtime_crate: "relay_runtime".to_string(),
			server_field: "server".to_string(),
			caller_id_field: "current_player_id".to_string(),
			function_marker: "remote_function".to_string(),
			default_access_marker: "default_access".to_string(),
			output_module: "generated_functions".to_string(),
			warn_on_rejection: false,
		}
	}
}

impl GeneratorConfig {
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(source)?)
	}

	/// Loads `path`, falling back to the defaults when the file does not exist.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			return Ok(Self::default());
		}
		let source = fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&source)
	}

	/// Checks every field and resolves it into the form the pipeline works with.
	pub fn conventions(&self) -> Result<Conventions, ConfigError> {
		let service_client = parse_type_path("service_client_type", &self.service_client_type)?;
		let logger = parse_type_path("logger_type", &self.logger_type)?;
		let runtime = syn::parse_str::<syn::Path>(&self.runtime_crate).map_err(|_| ConfigError::InvalidPath {
			field: "runtime_crate",
			value: self.runtime_crate.clone(),
		})?;

		let conventions = Conventions {
			service_client_ident: last_ident(&service_client),
			logger_ident: last_ident(&logger),
			service_client: TypeIdentity::from_path(service_client),
			logger: TypeIdentity::from_path(logger),
			text: TypeIdentity::text(),
			runtime,
			server_field: parse_ident("server_field", &self.server_field)?,
			caller_id_field: parse_ident("caller_id_field", &self.caller_id_field)?,
			function_marker: parse_ident("function_marker", &self.function_marker)?.to_string(),
			default_access_marker: parse_ident("default_access_marker", &self.default_access_marker)?.to_string(),
			output_module: parse_ident("output_module", &self.output_module)?,
		};
		conventions.check_imports(self)?;
		Ok(conventions)
	}
}

/// Validated configuration, threaded explicitly through every pipeline stage.
#[derive(Debug, Clone)]
pub struct Conventions {
	pub service_client: TypeIdentity,
	pub logger: TypeIdentity,
	pub text: TypeIdentity,
	pub runtime: syn::Path,
	pub service_client_ident: syn::Ident,
	pub logger_ident: syn::Ident,
	pub server_field: syn::Ident,
	pub caller_id_field: syn::Ident,
	pub function_marker: String,
	pub default_access_marker: String,
	pub output_module: syn::Ident,
}

/// Names the generated preamble imports from the runtime crate.
pub(crate) const RUNTIME_IMPORTS: [&str; 3] = ["ActionResult", "FunctionContext", "HttpRequest"];

impl Conventions {
	fn check_imports(&self, config: &GeneratorConfig) -> Result<(), ConfigError> {
		let mut seen: HashMap<String, String> = RUNTIME_IMPORTS
			.iter()
			.map(|name| (name.to_string(), format!("{}::{name}", config.runtime_crate)))
			.collect();
		for (ident, source) in [
			(&self.service_client_ident, &config.service_client_type),
			(&self.logger_ident, &config.logger_type),
		] {
			if let Some(first) = seen.insert(ident.to_string(), source.clone()) {
				return Err(ConfigError::ConflictingImport {
					name: ident.to_string(),
					first,
					second: source.clone(),
				});
			}
		}
		Ok(())
	}
}

fn parse_type_path(field: &'static str, value: &str) -> Result<syn::Path, ConfigError> {
	match syn::parse_str::<syn::Type>(value) {
		Ok(syn::Type::Path(ty)) if ty.qself.is_none() => {
			let mut path = ty.path;
			path.leading_colon = None;
			Ok(path)
		}
		_ => Err(ConfigError::InvalidType {
			field,
			value: value.to_string(),
		}),
	}
}

fn parse_ident(field: &'static str, value: &str) -> Result<syn::Ident, ConfigError> {
	syn::parse_str::<syn::Ident>(value).map_err(|_| ConfigError::InvalidIdent {
		field,
		value: value.to_string(),
	})
}

fn last_ident(path: &syn::Path) -> syn::Ident {
	path.segments
		.last()
		.map(|segment| segment.ident.clone())
		.unwrap_or_else(|| quote::format_ident!("_"))
}
