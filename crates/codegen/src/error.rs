//! Fatal errors of a generation pass.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that abort a generation pass with no output.
///
/// Per-candidate problems are never errors; see [`crate::validate::Rejection`].
#[derive(Debug, Error)]
pub enum GenerateError {
	/// The program declares no default access level.
	#[error("no `{marker}!` declaration found in the program; exactly one is required")]
	MissingDefaultAccess { marker: String },

	/// The default-access declaration exists but its argument is not an access level.
	#[error("invalid `{marker}!` declaration in `{module}`: {error}")]
	InvalidDefaultAccess {
		marker: String,
		module: String,
		error: syn::Error,
	},

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("I/O error at {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	#[error("failed to parse {path}: {error}")]
	Parse { path: PathBuf, error: syn::Error },

	/// The emitter produced tokens that do not form a source file.
	#[error("failed to render generated source: {0}")]
	Render(syn::Error),

	#[error("environment variable `{0}` is not set")]
	MissingEnv(&'static str),
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerateError>;
