use crate::error::{Result, StrataError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration from a `strata.toml` file.
///
/// Every field is independently optional. A child config inherits unset
/// fields from its included parent according to the merge rules in
/// [`crate::config::merge`]; `skip` is the one exception and is never
/// inherited.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct UnitConfig {
	/// Reference to a parent config to inherit from.
	#[serde(default)]
	pub include: Option<IncludeConfig>,

	/// Remote state backend for this unit.
	#[serde(default)]
	pub remote_state: Option<RemoteState>,

	/// If set, refuse destroy operations on this unit.
	#[serde(default)]
	pub prevent_destroy: Option<bool>,

	/// If true, skip this unit entirely. Never inherited: each file that
	/// wants skip behavior must set it explicitly.
	#[serde(default)]
	pub skip: bool,

	/// Settings for the wrapped provisioning tool.
	#[serde(default)]
	pub tool: Option<ToolBlock>,

	/// Paths of other units this unit depends on.
	#[serde(default)]
	pub dependencies: Option<Vec<String>>,

	/// Directory the tool source is downloaded into.
	#[serde(default)]
	pub download_dir: Option<PathBuf>,

	/// Role to assume before running the tool.
	#[serde(default)]
	pub assume_role: Option<String>,

	/// Session duration in seconds for the assumed role.
	#[serde(default)]
	pub assume_role_duration_secs: Option<u64>,

	/// Version constraint for the wrapped tool.
	#[serde(default)]
	pub tool_version: Option<String>,

	/// Explicit path to the tool binary.
	#[serde(default)]
	pub tool_binary: Option<PathBuf>,

	/// Version constraint for strata itself.
	#[serde(default)]
	pub engine_version: Option<String>,

	/// Regex patterns for tool errors that should be retried.
	#[serde(default)]
	pub retryable_errors: Option<Vec<String>>,

	/// Maximum number of retry attempts.
	#[serde(default)]
	pub retry_max_attempts: Option<u32>,

	/// Seconds to sleep between retries.
	#[serde(default)]
	pub retry_sleep_interval_secs: Option<u64>,

	/// Files to generate before running the tool, keyed by block name.
	#[serde(default)]
	pub generate: BTreeMap<String, GenerateBlock>,

	/// Input variables passed to the tool, keyed by variable name.
	#[serde(default)]
	pub inputs: BTreeMap<String, toml::Value>,
}

/// Reference to a parent config file and how to combine it with the child.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct IncludeConfig {
	/// Path to the parent config. Relative paths resolve against the
	/// directory containing the file that declares the include.
	#[serde(default)]
	pub path: String,

	/// Raw merge strategy value: "no-merge", "shallow-merge" or
	/// "deep-merge". Absent means shallow-merge.
	#[serde(default)]
	pub merge_strategy: Option<String>,
}

/// How a parent config is combined with the child that includes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
	/// Return the child untouched; the parent is never even loaded.
	NoMerge,

	/// Merge field by field, one level deep.
	ShallowMerge,

	/// Declared in the schema but not implemented; always an error.
	DeepMerge,
}

impl IncludeConfig {
	/// Parse the declared merge strategy, failing on unknown values.
	pub fn strategy(&self, declared_in: &std::path::Path) -> Result<MergeStrategy> {
		match self.merge_strategy.as_deref() {
			None => Ok(MergeStrategy::ShallowMerge),
			Some("no-merge") => Ok(MergeStrategy::NoMerge),
			Some("shallow-merge") => Ok(MergeStrategy::ShallowMerge),
			Some("deep-merge") => Ok(MergeStrategy::DeepMerge),
			Some(other) => Err(StrataError::UnknownMergeStrategy {
				strategy: other.to_string(),
				path: declared_in.to_path_buf(),
			}),
		}
	}
}

/// Remote state backend descriptor.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteState {
	/// Backend kind, e.g. "s3" or "gcs".
	pub backend: String,

	/// Backend-specific settings.
	#[serde(default)]
	pub config: BTreeMap<String, toml::Value>,

	/// If set, generate a backend config file instead of passing settings
	/// on the command line.
	#[serde(default)]
	pub generate: Option<RemoteStateGenerate>,
}

/// Generation policy for the remote state backend config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteStateGenerate {
	/// Path of the generated file, relative to the unit directory.
	pub path: PathBuf,

	/// What to do when the target file already exists.
	#[serde(default)]
	pub if_exists: ConflictPolicy,
}

/// A file to generate before the tool runs.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct GenerateBlock {
	/// Contents template for the generated file.
	pub contents: String,

	/// Path of the generated file, relative to the unit directory.
	pub path: PathBuf,

	/// What to do when the target file already exists.
	#[serde(default)]
	pub if_exists: ConflictPolicy,
}

/// What to do when a generated file's target path already exists.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
	/// Replace the existing file.
	#[default]
	Overwrite,

	/// Leave the existing file alone.
	Skip,

	/// Fail the run.
	Error,
}

/// Settings for the wrapped provisioning tool.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ToolBlock {
	/// Where the tool's source module comes from.
	#[serde(default)]
	pub source: Option<String>,

	/// Extra command-line arguments, in the order they are passed.
	#[serde(default)]
	pub extra_args: Vec<ExtraArgs>,

	/// Hooks run before the tool command.
	#[serde(default)]
	pub before_hooks: Vec<Hook>,

	/// Hooks run after the tool command.
	#[serde(default)]
	pub after_hooks: Vec<Hook>,
}

/// A named block of extra command-line arguments.
///
/// The name is the lookup key when a child config overrides a parent's
/// block; it only needs to be unique within one config's list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ExtraArgs {
	/// Lookup key for include merging.
	pub name: String,

	/// Tool sub-commands this block applies to.
	#[serde(default)]
	pub commands: Vec<String>,

	/// Arguments to append to the command line.
	#[serde(default)]
	pub arguments: Vec<String>,

	/// Environment variables to set for the command.
	#[serde(default)]
	pub env_vars: BTreeMap<String, String>,
}

/// A named hook run before or after the tool command.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Hook {
	/// Lookup key for include merging.
	pub name: String,

	/// Tool sub-commands this hook triggers on.
	#[serde(default)]
	pub commands: Vec<String>,

	/// Command line to execute.
	#[serde(default)]
	pub execute: Vec<String>,

	/// If true, run this hook even when the tool command failed.
	#[serde(default)]
	pub run_on_error: bool,
}

impl ToolBlock {
	/// Flatten the extra-args blocks that apply to `subcommand` into one
	/// argument list, in declaration order.
	///
	/// After an include merge, parent-declared blocks come first and
	/// child-only blocks last, so a tool with last-occurrence-wins option
	/// handling gives child additions final say.
	pub fn arguments_for(&self, subcommand: &str) -> Vec<String> {
		self.extra_args
			.iter()
			.filter(|block| block.commands.iter().any(|c| c == subcommand))
			.flat_map(|block| block.arguments.iter().cloned())
			.collect()
	}
}

impl UnitConfig {
	/// Validate fields the type system can't check: names used as merge
	/// keys must be non-empty, and retryable-error patterns must compile.
	pub fn validate(&self) -> Result<()> {
		if let Some(ref tool) = self.tool {
			validate_names("tool.extra-args", tool.extra_args.iter().map(|a| a.name.as_str()))?;
			validate_names(
				"tool.before-hooks",
				tool.before_hooks.iter().map(|h| h.name.as_str()),
			)?;
			validate_names(
				"tool.after-hooks",
				tool.after_hooks.iter().map(|h| h.name.as_str()),
			)?;
		}

		if let Some(ref patterns) = self.retryable_errors {
			for pattern in patterns {
				regex::Regex::new(pattern).map_err(|source| StrataError::InvalidRegex {
					pattern: pattern.clone(),
					source,
				})?;
			}
		}

		Ok(())
	}
}

fn validate_names<'a>(list: &'static str, names: impl Iterator<Item = &'a str>) -> Result<()> {
	for (index, name) in names.enumerate() {
		if name.is_empty() {
			return Err(StrataError::EmptyItemName { list, index });
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;

	fn args_block(name: &str, commands: &[&str], arguments: &[&str]) -> ExtraArgs {
		ExtraArgs {
			name: name.to_string(),
			commands: commands.iter().map(|s| s.to_string()).collect(),
			arguments: arguments.iter().map(|s| s.to_string()).collect(),
			env_vars: BTreeMap::new(),
		}
	}

	#[test]
	fn test_strategy_defaults_to_shallow() {
		let include = IncludeConfig {
			path: "../strata.toml".to_string(),
			merge_strategy: None,
		};
		let strategy = include.strategy(Path::new("/a/b/strata.toml")).unwrap();
		assert_eq!(strategy, MergeStrategy::ShallowMerge);
	}

	#[test]
	fn test_strategy_parses_known_values() {
		for (raw, expected) in [
			("no-merge", MergeStrategy::NoMerge),
			("shallow-merge", MergeStrategy::ShallowMerge),
			("deep-merge", MergeStrategy::DeepMerge),
		] {
			let include = IncludeConfig {
				path: "../strata.toml".to_string(),
				merge_strategy: Some(raw.to_string()),
			};
			let strategy = include.strategy(Path::new("/a/b/strata.toml")).unwrap();
			assert_eq!(strategy, expected);
		}
	}

	#[test]
	fn test_strategy_rejects_unknown_value() {
		let include = IncludeConfig {
			path: "../strata.toml".to_string(),
			merge_strategy: Some("recursive".to_string()),
		};
		let err = include.strategy(Path::new("/a/b/strata.toml")).unwrap_err();
		match err {
			StrataError::UnknownMergeStrategy { strategy, path } => {
				assert_eq!(strategy, "recursive");
				assert_eq!(path, Path::new("/a/b/strata.toml"));
			}
			other => panic!("Expected UnknownMergeStrategy, got {other:?}"),
		}
	}

	#[test]
	fn test_arguments_for_filters_by_subcommand() {
		let tool = ToolBlock {
			source: None,
			extra_args: vec![
				args_block("common", &["plan", "apply"], &["-lock-timeout=5m"]),
				args_block("plan_only", &["plan"], &["-refresh=false"]),
			],
			before_hooks: vec![],
			after_hooks: vec![],
		};

		assert_eq!(
			tool.arguments_for("plan"),
			vec!["-lock-timeout=5m", "-refresh=false"]
		);
		assert_eq!(tool.arguments_for("apply"), vec!["-lock-timeout=5m"]);
		assert!(tool.arguments_for("destroy").is_empty());
	}

	#[test]
	fn test_validate_rejects_empty_hook_name() {
		let config = UnitConfig {
			tool: Some(ToolBlock {
				before_hooks: vec![Hook::default()],
				..ToolBlock::default()
			}),
			..UnitConfig::default()
		};

		match config.validate().unwrap_err() {
			StrataError::EmptyItemName { list, index } => {
				assert_eq!(list, "tool.before-hooks");
				assert_eq!(index, 0);
			}
			other => panic!("Expected EmptyItemName, got {other:?}"),
		}
	}

	#[test]
	fn test_validate_rejects_bad_retry_pattern() {
		let config = UnitConfig {
			retryable_errors: Some(vec!["(unclosed".to_string()]),
			..UnitConfig::default()
		};

		assert!(matches!(
			config.validate().unwrap_err(),
			StrataError::InvalidRegex { .. }
		));
	}

	#[test]
	fn test_validate_accepts_valid_config() {
		let config = UnitConfig {
			retryable_errors: Some(vec!["(?s).*Error creating SSM parameter.*".to_string()]),
			tool: Some(ToolBlock {
				before_hooks: vec![Hook {
					name: "fmt".to_string(),
					..Hook::default()
				}],
				..ToolBlock::default()
			}),
			..UnitConfig::default()
		};

		assert!(config.validate().is_ok());
	}
}
