//! Strata - CLI tool for hierarchical infrastructure configuration with
//! include-based inheritance.
//!
//! This library provides the core functionality for strata, including:
//! - TOML config file parsing and validation
//! - Include-path resolution against the including file's directory
//! - Merge-strategy dispatch (no-merge, shallow-merge, deep-merge)
//! - Field-level merging of a child config with its included parent
//!
//! # Example
//!
//! ```no_run
//! use strata_cli::config::{MergeTrace, parse_config_file, resolve_include};
//! use std::path::Path;
//!
//! let child_path = Path::new("/infra/stage/my-app/strata.toml");
//! let child = parse_config_file(child_path).unwrap();
//!
//! if let Some(ref include) = child.include {
//!     let mut trace = MergeTrace::new();
//!     let effective = resolve_include(&child, include, child_path, &mut trace).unwrap();
//!     println!("effective inputs: {:?}", effective.inputs);
//! }
//! ```

pub mod config;
pub mod error;

pub use error::{Result, StrataError};
