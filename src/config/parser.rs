use crate::config::types::UnitConfig;
use crate::error::{Result, StrataError};
use std::path::Path;

/// Parse a unit config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<UnitConfig> {
	let content = std::fs::read_to_string(path).map_err(|source| StrataError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a unit config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<UnitConfig> {
	let config: UnitConfig =
		toml::from_str(content).map_err(|source| StrataError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	// Validate the parsed config
	config.validate()?;

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::ConflictPolicy;
	use std::path::PathBuf;

	#[test]
	fn test_parse_empty_config() {
		let content = "";
		let path = PathBuf::from("strata.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert!(config.include.is_none());
		assert!(config.remote_state.is_none());
		assert!(config.prevent_destroy.is_none());
		assert!(!config.skip);
		assert!(config.tool.is_none());
		assert!(config.inputs.is_empty());
		assert!(config.generate.is_empty());
	}

	#[test]
	fn test_parse_include_block() {
		let content = r#"
[include]
path = "../../strata.toml"
merge-strategy = "no-merge"
"#;
		let path = PathBuf::from("strata.toml");
		let config = parse_config_str(content, &path).unwrap();

		let include = config.include.unwrap();
		assert_eq!(include.path, "../../strata.toml");
		assert_eq!(include.merge_strategy, Some("no-merge".to_string()));
	}

	#[test]
	fn test_parse_remote_state() {
		let content = r#"
[remote-state]
backend = "s3"

[remote-state.config]
bucket = "my-state-bucket"
key = "stage/my-app/state"
encrypt = true

[remote-state.generate]
path = "backend.tf"
if-exists = "overwrite"
"#;
		let path = PathBuf::from("strata.toml");
		let config = parse_config_str(content, &path).unwrap();

		let remote_state = config.remote_state.unwrap();
		assert_eq!(remote_state.backend, "s3");
		assert_eq!(
			remote_state.config.get("bucket").and_then(|v| v.as_str()),
			Some("my-state-bucket")
		);
		assert_eq!(
			remote_state.config.get("encrypt").and_then(|v| v.as_bool()),
			Some(true)
		);

		let generate = remote_state.generate.unwrap();
		assert_eq!(generate.path, PathBuf::from("backend.tf"));
		assert_eq!(generate.if_exists, ConflictPolicy::Overwrite);
	}

	#[test]
	fn test_parse_tool_block() {
		let content = r#"
[tool]
source = "git::https://example.com/modules.git//app"

[[tool.extra-args]]
name = "common"
commands = ["plan", "apply"]
arguments = ["-lock-timeout=20m"]

[[tool.before-hooks]]
name = "fmt"
commands = ["plan"]
execute = ["tofu", "fmt", "-check"]

[[tool.after-hooks]]
name = "notify"
commands = ["apply"]
execute = ["./notify.sh"]
run_on_error = true
"#;
		let path = PathBuf::from("strata.toml");
		let config = parse_config_str(content, &path).unwrap();

		let tool = config.tool.unwrap();
		assert_eq!(
			tool.source,
			Some("git::https://example.com/modules.git//app".to_string())
		);
		assert_eq!(tool.extra_args.len(), 1);
		assert_eq!(tool.extra_args[0].name, "common");
		assert_eq!(tool.before_hooks.len(), 1);
		assert_eq!(tool.before_hooks[0].execute, vec!["tofu", "fmt", "-check"]);
		assert_eq!(tool.after_hooks.len(), 1);
		assert!(tool.after_hooks[0].run_on_error);
	}

	#[test]
	fn test_parse_scalars_and_retry_settings() {
		let content = r#"
prevent-destroy = true
download-dir = ".strata-cache"
assume-role = "arn:aws:iam::123456789012:role/deploy"
assume-role-duration-secs = 3600
tool-version = ">= 1.6.0"
engine-version = ">= 0.1.0"
retryable-errors = ["(?s).*Throttling.*"]
retry-max-attempts = 3
retry-sleep-interval-secs = 5

[inputs]
instance_count = 3
environment = "stage"
"#;
		let path = PathBuf::from("strata.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert_eq!(config.prevent_destroy, Some(true));
		assert_eq!(config.download_dir, Some(PathBuf::from(".strata-cache")));
		assert_eq!(config.assume_role_duration_secs, Some(3600));
		assert_eq!(config.retry_max_attempts, Some(3));
		assert_eq!(config.retry_sleep_interval_secs, Some(5));
		assert_eq!(
			config.inputs.get("instance_count").and_then(|v| v.as_integer()),
			Some(3)
		);
		assert_eq!(
			config.inputs.get("environment").and_then(|v| v.as_str()),
			Some("stage")
		);
	}

	#[test]
	fn test_parse_rejects_invalid_retry_pattern() {
		let content = r#"
retryable-errors = ["(unclosed"]
"#;
		let path = PathBuf::from("strata.toml");
		let result = parse_config_str(content, &path);

		assert!(matches!(
			result.unwrap_err(),
			StrataError::InvalidRegex { .. }
		));
	}

	#[test]
	fn test_parse_error_carries_path() {
		let content = "not [valid toml";
		let path = PathBuf::from("/stage/my-app/strata.toml");
		let result = parse_config_str(content, &path);

		match result.unwrap_err() {
			StrataError::ConfigParseError { path: p, .. } => {
				assert_eq!(p, path);
			}
			other => panic!("Expected ConfigParseError, got {other:?}"),
		}
	}
}
