//! Build-time generator of HTTP adapter functions.
//!
//! Domain functions are marked with `#[remote_function]`; one program-wide
//! `default_access!(Level);` must also be present. A generation pass runs
//! four stages over the parsed sources:
//!
//! 1. [`index`] collects every marked declaration and the program facts around it.
//! 2. [`validate`] accepts each declaration under the static or the instance
//!    calling convention, or rejects it.
//! 3. [`descriptor`] normalizes accepted declarations into invocation descriptors.
//! 4. [`emit`] renders all descriptors into one Rust source unit.
//!
//! Rejected declarations are reported and skipped; the only fatal conditions
//! are a missing default-access declaration, bad configuration, and I/O or
//! parse failures. Build scripts normally go through [`compile::BuildCtx`].

use std::path::PathBuf;

use tracing::{debug, info};

pub mod compile;
pub mod config;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod index;
pub mod marker;
pub mod validate;

pub use config::{Conventions, GeneratorConfig};
pub use descriptor::{InvocationDescriptor, classify};
pub use emit::{GeneratedAdapterUnit, emit};
pub use error::{GenerateError, Result};
pub use index::{DeclarationIndex, ModulePath, SourceFile};
pub use marker::AccessLevel;
pub use validate::{Rejection, validate};

/// A marked declaration that produced no adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCandidate {
	/// Qualified name, e.g. `crate::api::Inventory::grant`.
	pub name: String,
	pub origin: Option<PathBuf>,
	pub reason: Rejection,
}

/// Everything a generation pass produced.
#[derive(Debug)]
pub struct GenerationReport {
	pub unit: GeneratedAdapterUnit,
	/// Accepted candidates, in discovery order.
	pub descriptors: Vec<InvocationDescriptor>,
	pub rejections: Vec<RejectedCandidate>,
	pub default_access: AccessLevel,
}

/// Runs a full pass over `files`, in the given order.
pub fn generate(files: &[SourceFile], config: &GeneratorConfig) -> Result<GenerationReport> {
	let conventions = config.conventions()?;
	let index = DeclarationIndex::build(files, &conventions)?;

	let mut descriptors = Vec::new();
	let mut rejections = Vec::new();
	for declaration in index.declarations() {
		match validate(declaration, &index, &conventions) {
			Ok(accepted) => descriptors.push(classify(accepted)),
			Err(reason) => {
				let name = declaration.qualified_name();
				debug!(candidate = %name, %reason, "candidate rejected");
				rejections.push(RejectedCandidate {
					name,
					origin: declaration.origin.clone(),
					reason,
				});
			}
		}
	}

	let unit = emit(&descriptors, &conventions)?;

	info!(
		adapters = descriptors.len(),
		rejected = rejections.len(),
		default_access = %index.default_access(),
		"adapter generation complete"
	);

	Ok(GenerationReport {
		unit,
		descriptors,
		rejections,
		default_access: index.default_access(),
	})
}
