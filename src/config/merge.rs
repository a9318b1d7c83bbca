//! Field-level merge rules for include inheritance.
//!
//! `merge_with_parent` combines a child config with its parsed parent:
//! the child is read-only, the parent is consumed and returned as the
//! merged result. Anything set in the child overrides the parent.

use crate::config::types::{ExtraArgs, Hook, UnitConfig};
use std::collections::BTreeMap;
use std::fmt;

/// Items merged by name during include inheritance.
pub trait Named {
	/// The per-list lookup key. Not required to be unique across parent
	/// and child, only within one list.
	fn name(&self) -> &str;
}

impl Named for Hook {
	fn name(&self) -> &str {
		&self.name
	}
}

impl Named for ExtraArgs {
	fn name(&self) -> &str {
		&self.name
	}
}

/// One decision the merge engine made, recorded for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
	/// The include declared no-merge; the parent was never loaded.
	NoMerge { include_path: String },

	/// The include declared (or defaulted to) shallow-merge.
	ShallowMerge { include_path: String },

	/// A child item replaced a same-named parent item in place.
	NamedOverride { list: &'static str, name: String },
}

impl fmt::Display for MergeDecision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MergeDecision::NoMerge { include_path } => {
				write!(f, "include {include_path}: no-merge, parent not loaded")
			}
			MergeDecision::ShallowMerge { include_path } => {
				write!(f, "include {include_path}: shallow-merge, merging parent in")
			}
			MergeDecision::NamedOverride { list, name } => {
				write!(f, "{list} '{name}' from child overriding parent")
			}
		}
	}
}

/// Explicit event sink for merge decisions.
///
/// Threaded through the merge functions instead of a global logger so the
/// engine stays deterministic and testable; the CLI prints the trace from
/// `config show`.
#[derive(Debug, Default)]
pub struct MergeTrace {
	decisions: Vec<MergeDecision>,
}

impl MergeTrace {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, decision: MergeDecision) {
		self.decisions.push(decision);
	}

	pub fn decisions(&self) -> &[MergeDecision] {
		&self.decisions
	}

	pub fn is_empty(&self) -> bool {
		self.decisions.is_empty()
	}
}

/// Merge the child config with its included parent. Anything set in the
/// child overrides the parent's value; the parent is consumed and returned
/// as the merged result.
pub fn merge_with_parent(
	child: &UnitConfig,
	mut parent: UnitConfig,
	trace: &mut MergeTrace,
) -> UnitConfig {
	if child.remote_state.is_some() {
		parent.remote_state = child.remote_state.clone();
	}

	if child.prevent_destroy.is_some() {
		parent.prevent_destroy = child.prevent_destroy;
	}

	// Skip has to be set specifically in each file that should be skipped
	parent.skip = child.skip;

	parent.tool = match (child.tool.as_ref(), parent.tool.take()) {
		(None, parent_tool) => parent_tool,
		(Some(child_tool), None) => Some(child_tool.clone()),
		(Some(child_tool), Some(mut parent_tool)) => {
			if child_tool.source.is_some() {
				parent_tool.source = child_tool.source.clone();
			}
			parent_tool.extra_args = merge_named(
				&child_tool.extra_args,
				parent_tool.extra_args,
				"tool.extra-args",
				trace,
			);
			parent_tool.before_hooks = merge_named(
				&child_tool.before_hooks,
				parent_tool.before_hooks,
				"tool.before-hooks",
				trace,
			);
			parent_tool.after_hooks = merge_named(
				&child_tool.after_hooks,
				parent_tool.after_hooks,
				"tool.after-hooks",
				trace,
			);
			Some(parent_tool)
		}
	};

	if child.dependencies.is_some() {
		parent.dependencies = child.dependencies.clone();
	}

	if child.download_dir.is_some() {
		parent.download_dir = child.download_dir.clone();
	}

	if child.assume_role.is_some() {
		parent.assume_role = child.assume_role.clone();
	}

	if child.assume_role_duration_secs.is_some() {
		parent.assume_role_duration_secs = child.assume_role_duration_secs;
	}

	if child.tool_version.is_some() {
		parent.tool_version = child.tool_version.clone();
	}

	if child.tool_binary.is_some() {
		parent.tool_binary = child.tool_binary.clone();
	}

	if child.engine_version.is_some() {
		parent.engine_version = child.engine_version.clone();
	}

	if child.retryable_errors.is_some() {
		parent.retryable_errors = child.retryable_errors.clone();
	}

	if child.retry_max_attempts.is_some() {
		parent.retry_max_attempts = child.retry_max_attempts;
	}

	if child.retry_sleep_interval_secs.is_some() {
		parent.retry_sleep_interval_secs = child.retry_sleep_interval_secs;
	}

	// Generate blocks merge shallowly: a child block with the same name
	// replaces the parent's block whole.
	parent.generate = merge_map(&child.generate, parent.generate);

	parent.inputs = merge_map(&child.inputs, parent.inputs);

	// The include reference is consumed by resolution; the merged result
	// stands on its own.
	parent.include = None;

	parent
}

/// Merge two named-item lists (hooks or extra-args blocks).
///
/// A child item with the same name as a parent item replaces it in place,
/// keeping the parent's position. Child items with new names are appended
/// after all parent items, in the order the child declared them. On the
/// eventual command line the parent's blocks therefore come first, so a
/// tool with last-occurrence-wins option handling gives child additions
/// final say.
pub fn merge_named<T: Named + Clone>(
	child_items: &[T],
	parent_items: Vec<T>,
	list: &'static str,
	trace: &mut MergeTrace,
) -> Vec<T> {
	let mut result = parent_items;

	for child in child_items {
		match result.iter().position(|item| item.name() == child.name()) {
			Some(index) => {
				trace.record(MergeDecision::NamedOverride {
					list,
					name: child.name().to_string(),
				});
				result[index] = child.clone();
			}
			None => result.push(child.clone()),
		}
	}

	result
}

/// Merge two keyed maps, one level deep: the result is the parent's map
/// with every child entry written over it.
pub fn merge_map<V: Clone>(
	child: &BTreeMap<String, V>,
	mut parent: BTreeMap<String, V>,
) -> BTreeMap<String, V> {
	for (key, value) in child {
		parent.insert(key.clone(), value.clone());
	}
	parent
}
