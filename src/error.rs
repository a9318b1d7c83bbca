use std::path::PathBuf;

/// Library-level structured errors for strata.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum StrataError {
	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Include block in {path} has no path to a parent config")]
	MissingIncludePath { path: PathBuf },

	#[error("Unknown merge strategy '{strategy}' in include block of {path}")]
	UnknownMergeStrategy { strategy: String, path: PathBuf },

	#[error("Include in {path} requests deep merge, which is not implemented")]
	DeepMergeUnimplemented { path: PathBuf },

	#[error("Invalid retryable-error pattern: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Entry {index} in {list} has an empty name")]
	EmptyItemName { list: &'static str, index: usize },
}

/// Result type alias using StrataError.
pub type Result<T> = std::result::Result<T, StrataError>;
