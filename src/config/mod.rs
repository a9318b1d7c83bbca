//! Configuration loading and include inheritance for strata.
//!
//! This module handles:
//! - TOML config file parsing
//! - Include-path resolution and merge-strategy dispatch
//! - Field-level config merging

pub mod include;
pub mod merge;
pub mod parser;
pub mod types;

pub use include::{load_effective_config, resolve_include, resolve_included_config};
pub use merge::{MergeDecision, MergeTrace, Named, merge_map, merge_named, merge_with_parent};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{
	ConflictPolicy, ExtraArgs, GenerateBlock, Hook, IncludeConfig, MergeStrategy, RemoteState,
	RemoteStateGenerate, ToolBlock, UnitConfig,
};
