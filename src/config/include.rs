//! Include-path resolution and merge-strategy dispatch.
//!
//! A child `strata.toml` may declare an `[include]` block pointing at a
//! parent config. Resolving the include parses the parent and combines it
//! with the child according to the declared merge strategy.

use crate::config::merge::{MergeDecision, MergeTrace, merge_with_parent};
use crate::config::parser::parse_config_file;
use crate::config::types::{IncludeConfig, MergeStrategy, UnitConfig};
use crate::error::{Result, StrataError};
use std::path::{Component, Path, PathBuf};

/// Resolve a config's include reference, producing the effective config.
///
/// This is the single entry point for include inheritance. The strategy is
/// parsed up front so an unknown value fails before anything is loaded:
/// - no-merge: return the child unchanged; the parent file is never read
/// - shallow-merge: parse the parent and merge the child into it
/// - deep-merge: declared in the schema but not implemented; always fails
pub fn resolve_include(
	child: &UnitConfig,
	include: &IncludeConfig,
	including_path: &Path,
	trace: &mut MergeTrace,
) -> Result<UnitConfig> {
	match include.strategy(including_path)? {
		MergeStrategy::NoMerge => {
			trace.record(MergeDecision::NoMerge {
				include_path: include.path.clone(),
			});
			Ok(child.clone())
		}
		MergeStrategy::ShallowMerge => {
			trace.record(MergeDecision::ShallowMerge {
				include_path: include.path.clone(),
			});
			let parent = resolve_included_config(include, including_path)?;
			Ok(merge_with_parent(child, parent, trace))
		}
		MergeStrategy::DeepMerge => Err(StrataError::DeepMergeUnimplemented {
			path: including_path.to_path_buf(),
		}),
	}
}

/// Parse the parent config an include reference points at.
///
/// Relative targets resolve against the directory containing the including
/// file, not the process working directory.
pub fn resolve_included_config(
	include: &IncludeConfig,
	including_path: &Path,
) -> Result<UnitConfig> {
	if include.path.is_empty() {
		return Err(StrataError::MissingIncludePath {
			path: including_path.to_path_buf(),
		});
	}

	parse_config_file(&resolve_include_path(&include.path, including_path))
}

/// Load the config at `path` and resolve its include reference, if any.
pub fn load_effective_config(path: &Path) -> Result<(UnitConfig, MergeTrace)> {
	let config = parse_config_file(path)?;
	let mut trace = MergeTrace::new();

	let effective = match config.include {
		Some(ref include) => resolve_include(&config, include, path, &mut trace)?,
		None => config,
	};

	Ok((effective, trace))
}

/// Resolve an include target against the including file's directory.
fn resolve_include_path(target: &str, including_path: &Path) -> PathBuf {
	let target = Path::new(target);

	if target.is_absolute() {
		return target.to_path_buf();
	}

	let joined = match including_path.parent() {
		Some(dir) => dir.join(target),
		None => target.to_path_buf(),
	};

	normalize_path(&joined)
}

/// Lexically normalize `.` and `..` components so resolved include paths
/// are readable in diagnostics. Purely textual, no filesystem access.
fn normalize_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !normalized.pop() && !normalized.has_root() {
					normalized.push("..");
				}
			}
			other => normalized.push(other.as_os_str()),
		}
	}

	normalized
}
