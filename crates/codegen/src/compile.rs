//! Build-script driver.
//!
//! Discovers the crate's sources under `src/`, runs a generation pass and
//! writes the unit to `OUT_DIR`, where the crate pulls it in with
//! `include!(concat!(env!("OUT_DIR"), "/generated_functions.rs"));`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{CONFIG_FILE, GeneratorConfig};
use crate::error::{GenerateError, Result};
use crate::index::{ModulePath, SourceFile};
use crate::{GenerationReport, generate};

/// File written into `OUT_DIR`.
pub const OUTPUT_FILE: &str = "generated_functions.rs";

pub struct BuildCtx {
	pub manifest_dir: PathBuf,
	pub out_dir: PathBuf,
}

impl BuildCtx {
	/// Reads the directories cargo hands to build scripts.
	pub fn new() -> Result<Self> {
		let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR").ok_or(GenerateError::MissingEnv("CARGO_MANIFEST_DIR"))?;
		let out_dir = std::env::var_os("OUT_DIR").ok_or(GenerateError::MissingEnv("OUT_DIR"))?;
		Ok(Self::with_dirs(manifest_dir, out_dir))
	}

	pub fn with_dirs(manifest_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
		Self {
			manifest_dir: manifest_dir.into(),
			out_dir: out_dir.into(),
		}
	}

	pub fn source_root(&self) -> PathBuf {
		self.manifest_dir.join("src")
	}

	pub fn output_path(&self) -> PathBuf {
		self.out_dir.join(OUTPUT_FILE)
	}

	pub fn rerun_if_changed(&self, path: &Path) {
		println!("cargo:rerun-if-changed={}", path.display());
	}

	/// Loads `relay.toml` next to the manifest, or the defaults when absent.
	pub fn load_config(&self) -> Result<GeneratorConfig> {
		Ok(GeneratorConfig::load(&self.manifest_dir.join(CONFIG_FILE))?)
	}

	/// Parses every `.rs` file under `src/`, sorted by path. Binary targets under `src/bin` are skipped.
	pub fn collect_sources(&self) -> Result<Vec<SourceFile>> {
		let root = self.source_root();
		let mut paths = Vec::new();
		for entry in WalkDir::new(&root).into_iter().filter_entry(|entry| !is_bin_dir(entry)) {
			let entry = entry.map_err(|error| GenerateError::Io {
				path: error.path().map_or_else(|| root.clone(), Path::to_path_buf),
				error: error.into(),
			})?;
			if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "rs") {
				paths.push(entry.into_path());
			}
		}
		paths.sort();

		let mut sources = Vec::with_capacity(paths.len());
		for path in paths {
			let Some(module) = path.strip_prefix(&root).ok().and_then(module_path_for) else {
				debug!(path = %path.display(), "file name is not a module name, skipping");
				continue;
			};
			let content = fs::read_to_string(&path).map_err(|error| GenerateError::Io {
				path: path.clone(),
				error,
			})?;
			let syntax = syn::parse_file(&content).map_err(|error| GenerateError::Parse {
				path: path.clone(),
				error,
			})?;
			sources.push(SourceFile::new(module, syntax).with_origin(&path));
		}
		Ok(sources)
	}

	/// Runs a full pass and writes the unit. Nothing is written when the pass fails.
	pub fn run(&self) -> Result<GenerationReport> {
		let config = self.load_config()?;
		let sources = self.collect_sources()?;

		self.rerun_if_changed(&self.manifest_dir.join(CONFIG_FILE));
		self.rerun_if_changed(&self.source_root());
		for source in &sources {
			if let Some(origin) = &source.origin {
				self.rerun_if_changed(origin);
			}
		}

		let report = generate(&sources, &config)?;

		let output = self.output_path();
		fs::write(&output, report.unit.as_str()).map_err(|error| GenerateError::Io { path: output, error })?;

		self.report(&report, &config);
		Ok(report)
	}

	fn report(&self, report: &GenerationReport, config: &GeneratorConfig) {
		if config.warn_on_rejection {
			for rejected in &report.rejections {
				let location = rejected
					.origin
					.as_ref()
					.map(|origin| format!(" ({})", origin.display()))
					.unwrap_or_default();
				println!("cargo:warning=`{}`{location} was not exposed: {}", rejected.name, rejected.reason);
			}
		}
		for descriptor in &report.descriptors {
			if descriptor.ignored_parameters.is_empty() {
				continue;
			}
			warn!(
				adapter = %descriptor.adapter_name(),
				ignored = ?descriptor.ignored_parameters,
				"parameters will not be passed by the adapter"
			);
			println!(
				"cargo:warning=`{}` ignores parameter(s) {}; only the first one after the caller id is passed",
				descriptor.exposed_name,
				descriptor.ignored_parameters.join(", ")
			);
		}
	}
}

/// Module path of a file relative to `src/`: `lib.rs`/`main.rs` are the crate root,
/// `a/mod.rs` is `crate::a` and `a/b.rs` is `crate::a::b`.
pub fn module_path_for(relative: &Path) -> Option<ModulePath> {
	let mut names = relative
		.iter()
		.map(|component| component.to_str())
		.collect::<Option<Vec<_>>>()?;
	let file = names.pop()?.strip_suffix(".rs")?;

	if !(names.is_empty() && matches!(file, "lib" | "main")) && file != "mod" {
		names.push(file);
	}

	let mut module = ModulePath::root();
	for name in names {
		syn::parse_str::<syn::Ident>(name).ok()?;
		module = module.child(name);
	}
	Some(module)
}

fn is_bin_dir(entry: &DirEntry) -> bool {
	entry.depth() == 1 && entry.file_type().is_dir() && entry.file_name() == "bin"
}

/// Build-script entry point: generates for the crate being built and aborts the build on error.
pub fn build() {
	if let Err(error) = BuildCtx::new().and_then(|ctx| ctx.run()) {
		panic!("relay-codegen: {error}");
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("lib.rs", Some("crate"))]
	#[case("main.rs", Some("crate"))]
	#[case("api.rs", Some("crate::api"))]
	#[case("api/mod.rs", Some("crate::api"))]
	#[case("api/v1/shop.rs", Some("crate::api::v1::shop"))]
	#[case("api/lib.rs", Some("crate::api::lib"))]
	#[case("my-file.rs", None)]
	#[case("notes.txt", None)]
	fn module_paths_follow_the_file_layout(#[case] relative: &str, #[case] expected: Option<&str>) {
		let module = module_path_for(Path::new(relative)).map(|module| module.to_string());
		assert_eq!(module.as_deref(), expected);
	}
}
