use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use strata_cli::config::{
	MergeStrategy, UnitConfig, load_effective_config, parse_config_file, resolve_included_config,
};

#[derive(Parser)]
#[command(name = "strata")]
#[command(
	author,
	version,
	about = "CLI tool for hierarchical infrastructure configuration with include-based inheritance"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template strata.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing strata.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective configuration after include resolution
	Show,
	/// Check the config file and its include chain for errors
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(command) = cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(),
				ConfigAction::Validate => handle_config_validate(),
			},
		};
	}

	// No command specified - this shouldn't happen due to arg_required_else_help
	Ok(ExitCode::SUCCESS)
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from("strata.toml");

	if config_path.exists() && !force {
		anyhow::bail!("strata.toml already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created strata.toml");
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let config_path = unit_config_path()?;

	let (effective, trace) = load_effective_config(&config_path)
		.with_context(|| format!("Failed to load {}", config_path.display()))?;

	println!("Effective configuration for {}", config_path.display());

	if !trace.is_empty() {
		println!("\nMerge decisions:");
		for decision in trace.decisions() {
			println!("  {decision}");
		}
	}

	println!();
	print_config(&effective);

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let config_path = unit_config_path()?;

	match validate_chain(&config_path) {
		Ok(summary) => {
			println!("Configuration is valid:");
			for line in summary {
				println!("  {line}");
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e}");
			Ok(ExitCode::FAILURE)
		}
	}
}

/// Parse and validate the child config and, when the declared strategy
/// needs it, its included parent. No merging is performed.
fn validate_chain(config_path: &Path) -> strata_cli::Result<Vec<String>> {
	let config = parse_config_file(config_path)?;
	let mut summary = vec![config_path.display().to_string()];

	if let Some(ref include) = config.include {
		match include.strategy(config_path)? {
			MergeStrategy::NoMerge => {
				// The parent is never loaded under no-merge, so there is
				// nothing further to check.
				summary.push(format!("include {} (no-merge, parent not checked)", include.path));
			}
			MergeStrategy::ShallowMerge => {
				resolve_included_config(include, config_path)?;
				summary.push(format!("include {} (shallow-merge)", include.path));
			}
			MergeStrategy::DeepMerge => {
				return Err(strata_cli::StrataError::DeepMergeUnimplemented {
					path: config_path.to_path_buf(),
				});
			}
		}
	}

	Ok(summary)
}

fn unit_config_path() -> Result<PathBuf> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	Ok(cwd.join("strata.toml"))
}

fn print_config(config: &UnitConfig) {
	if let Some(ref remote_state) = config.remote_state {
		println!("remote-state.backend: {}", remote_state.backend);
		for (key, value) in &remote_state.config {
			println!("remote-state.config.{key}: {value}");
		}
		if let Some(ref generate) = remote_state.generate {
			println!("remote-state.generate.path: {}", generate.path.display());
		}
	}

	if let Some(prevent_destroy) = config.prevent_destroy {
		println!("prevent-destroy: {prevent_destroy}");
	}

	println!("skip: {}", config.skip);

	if let Some(ref tool) = config.tool {
		if let Some(ref source) = tool.source {
			println!("tool.source: {source}");
		}
		for block in &tool.extra_args {
			println!(
				"tool.extra-args.{}: {}",
				block.name,
				block.arguments.join(" ")
			);
		}
		for hook in &tool.before_hooks {
			println!("tool.before-hooks.{}: {}", hook.name, hook.execute.join(" "));
		}
		for hook in &tool.after_hooks {
			println!("tool.after-hooks.{}: {}", hook.name, hook.execute.join(" "));
		}
	}

	if let Some(ref dependencies) = config.dependencies {
		println!("dependencies: {}", dependencies.join(", "));
	}

	if let Some(ref download_dir) = config.download_dir {
		println!("download-dir: {}", download_dir.display());
	}

	if let Some(ref assume_role) = config.assume_role {
		println!("assume-role: {assume_role}");
	}

	if let Some(duration) = config.assume_role_duration_secs {
		println!("assume-role-duration-secs: {duration}");
	}

	if let Some(ref tool_version) = config.tool_version {
		println!("tool-version: {tool_version}");
	}

	if let Some(ref tool_binary) = config.tool_binary {
		println!("tool-binary: {}", tool_binary.display());
	}

	if let Some(ref engine_version) = config.engine_version {
		println!("engine-version: {engine_version}");
	}

	if let Some(ref patterns) = config.retryable_errors {
		println!("retryable-errors: {}", patterns.join(", "));
	}

	if let Some(attempts) = config.retry_max_attempts {
		println!("retry-max-attempts: {attempts}");
	}

	if let Some(interval) = config.retry_sleep_interval_secs {
		println!("retry-sleep-interval-secs: {interval}");
	}

	for (name, block) in &config.generate {
		println!("generate.{name}: {}", block.path.display());
	}

	for (name, value) in &config.inputs {
		println!("inputs.{name}: {value}");
	}
}

fn init_template() -> &'static str {
	r#"# strata unit configuration
#
# A child unit inherits from a parent config via an include block:
#
# [include]
# path = "../../strata.toml"
# merge-strategy = "shallow-merge"  # or "no-merge"

[remote-state]
backend = "s3"

[remote-state.config]
bucket = "my-state-bucket"
key = "my-app/state"

[[tool.extra-args]]
name = "common"
commands = ["plan", "apply"]
arguments = ["-lock-timeout=20m"]

[inputs]
environment = "dev"
"#
}
