// crates/infra-harness-cli/src/main.rs
// ============================================================================
// Module: Infra Harness CLI Entry Point
// Description: Command dispatcher for suite runs and definition validation.
// Purpose: Run infrastructure validation suites from CI and developer shells.
// Dependencies: clap, infra-harness-cli, infra-harness-config, infra-harness-core,
//               serde_json, thiserror
// ============================================================================

//! ## Overview
//! `infra-harness` loads a suite file, applies environment overrides, and runs
//! the selected scenarios. Every scenario whose apply was requested is
//! destroyed before the command returns. Exit codes: 0 when every selected
//! scenario passed, 1 when any failed or errored, 2 on usage or
//! configuration errors.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use infra_harness_cli::RunMode;
use infra_harness_cli::RunReporter;
use infra_harness_cli::RunSummary;
use infra_harness_cli::ScenarioSummary;
use infra_harness_cli::SuiteRunner;
use infra_harness_cli::runner::audit_sink;
use infra_harness_cli::runner::terraform_provisioner;
use infra_harness_config::DEFAULT_SUITE_NAME;
use infra_harness_config::EnvOverrides;
use infra_harness_config::HarnessSettings;
use infra_harness_config::SuiteConfig;
use infra_harness_core::Harness;
use infra_harness_core::HarnessNoopAuditSink;
use infra_harness_core::ScenarioId;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Exit code for runs where a scenario failed or errored.
const EXIT_FAILED: u8 = 1;
/// Exit code for usage and configuration errors.
const EXIT_USAGE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "infra-harness",
    about = "Provision, check, and tear down infrastructure scenarios",
    version,
    disable_help_subcommand = true
)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run scenarios from a suite file.
    Run(RunCommand),
    /// Statically validate infrastructure definitions in a directory.
    Validate(ValidateCommand),
    /// List scenarios defined in a suite file.
    List(ListCommand),
    /// Suite configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Suite file path.
    #[arg(value_name = "SUITE", default_value = DEFAULT_SUITE_NAME)]
    suite: PathBuf,
    /// Run only the named scenario (repeatable; defaults to all).
    #[arg(long = "scenario", value_name = "ID")]
    scenarios: Vec<String>,
    /// Validate definitions instead of provisioning anything.
    #[arg(long, action = ArgAction::SetTrue)]
    validate_only: bool,
    /// Root directory for run artifacts (overrides the suite setting).
    #[arg(long, value_name = "PATH")]
    run_root: Option<PathBuf>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Directory holding infrastructure definitions.
    #[arg(value_name = "DIR")]
    dir: PathBuf,
    /// Provisioning binary (defaults to `INFRA_HARNESS_TERRAFORM_BIN` or `terraform`).
    #[arg(long, value_name = "PATH")]
    terraform_binary: Option<PathBuf>,
}

/// Arguments for the `list` command.
#[derive(Args, Debug)]
struct ListCommand {
    /// Suite file path.
    #[arg(value_name = "SUITE", default_value = DEFAULT_SUITE_NAME)]
    suite: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t = ListFormat::Text)]
    format: ListFormat,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a suite file without running anything.
    Check(ConfigCheckCommand),
}

/// Arguments for `config check`.
#[derive(Args, Debug)]
struct ConfigCheckCommand {
    /// Suite file path.
    #[arg(value_name = "SUITE", default_value = DEFAULT_SUITE_NAME)]
    suite: PathBuf,
}

/// Output formats for `list`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ListFormat {
    /// One scenario per line.
    Text,
    /// JSON array of scenario entries.
    Json,
}

/// Scenario entry printed by `list --format json`.
#[derive(Debug, Serialize)]
struct ListEntry {
    /// Scenario identifier.
    id: String,
    /// Resolved working directory.
    working_dir: String,
    /// Environment tag.
    environment: String,
    /// Number of checks.
    checks: usize,
    /// True when the scenario needs cloud credentials for fact checks.
    requires_cloud_facts: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying the exit code it maps to.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Process exit code.
    code: u8,
}

impl CliError {
    /// Constructs a runtime error (exit code 1).
    const fn new(message: String) -> Self {
        Self {
            message,
            code: EXIT_FAILED,
        }
    }

    /// Constructs a usage or configuration error (exit code 2).
    const fn usage(message: String) -> Self {
        Self {
            message,
            code: EXIT_USAGE,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Run(command) => command_run(&command),
        Commands::Validate(command) => command_validate(&command),
        Commands::List(command) => command_list(&command),
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Check(command) => command_config_check(&command),
        },
    }
}

// ============================================================================
// SECTION: Suite Loading
// ============================================================================

/// Loads a suite file and applies environment overrides.
fn load_suite(path: &Path) -> CliResult<SuiteConfig> {
    let overrides = EnvOverrides::load().map_err(|err| CliError::usage(err.to_string()))?;
    let mut suite = SuiteConfig::load(path)
        .map_err(|err| CliError::usage(format!("failed to load {}: {err}", path.display())))?;
    suite.apply_env(&overrides);
    suite.harness.validate().map_err(|err| CliError::usage(err.to_string()))?;
    Ok(suite)
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let mut suite = load_suite(&command.suite)?;
    if let Some(run_root) = &command.run_root {
        suite.harness.run_root = Some(run_root.clone());
    }
    let ids: Vec<ScenarioId> = command.scenarios.iter().map(ScenarioId::new).collect();
    let selected = suite.select(&ids).map_err(|err| CliError::usage(err.to_string()))?;

    let audit = audit_sink(&suite.harness).map_err(|err| CliError::usage(err.to_string()))?;
    let provisioner =
        terraform_provisioner(&suite.harness).map_err(|err| CliError::usage(err.to_string()))?;
    let runner = SuiteRunner::new(provisioner, audit);

    let mode = if command.validate_only { RunMode::Validate } else { RunMode::Run };
    let mut reporter = RunReporter::new(&command.suite, mode, suite.harness.run_root.as_deref())
        .map_err(|err| CliError::new(format!("failed to create run artifacts: {err}")))?;

    if command.validate_only {
        for summary in runner.validate_scenarios(&selected) {
            write_scenario_line(&summary)?;
            reporter.record(summary);
        }
    } else {
        for scenario in &selected {
            let summary = runner.run_scenario(scenario);
            write_scenario_line(&summary)?;
            reporter.record(summary);
        }
    }

    let summary = reporter
        .finish()
        .map_err(|err| CliError::new(format!("failed to write run summary: {err}")))?;
    write_run_footer(&summary, reporter.artifacts().root())?;
    Ok(exit_for(&summary))
}

/// Maps a run summary to the process exit code.
fn exit_for(summary: &RunSummary) -> ExitCode {
    if summary.passed() { ExitCode::SUCCESS } else { ExitCode::from(EXIT_FAILED) }
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let overrides = EnvOverrides::load().map_err(|err| CliError::usage(err.to_string()))?;
    let mut settings = HarnessSettings::default();
    if let Some(binary) = command.terraform_binary.as_ref().or(overrides.terraform_binary.as_ref())
    {
        settings.terraform_binary.clone_from(binary);
    }
    let provisioner =
        terraform_provisioner(&settings).map_err(|err| CliError::usage(err.to_string()))?;
    let harness = Harness::new(provisioner, Arc::new(HarnessNoopAuditSink));
    harness.validate_definitions(&command.dir).map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line(&format!("{}: definitions are valid", command.dir.display()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: List and Config Commands
// ============================================================================

/// Executes the `list` command.
fn command_list(command: &ListCommand) -> CliResult<ExitCode> {
    let suite = load_suite(&command.suite)?;
    match command.format {
        ListFormat::Text => {
            for scenario in &suite.scenarios {
                write_stdout_line(&format!(
                    "{}\t{}\t{} checks",
                    scenario.id,
                    scenario.working_dir.display(),
                    scenario.checks.len()
                ))?;
            }
        }
        ListFormat::Json => {
            let entries: Vec<ListEntry> = suite
                .scenarios
                .iter()
                .map(|scenario| ListEntry {
                    id: scenario.id.to_string(),
                    working_dir: scenario.working_dir.display().to_string(),
                    environment: scenario.environment.clone(),
                    checks: scenario.checks.len(),
                    requires_cloud_facts: scenario.requires_cloud_facts(),
                })
                .collect();
            let json = serde_json::to_string_pretty(&entries)
                .map_err(|err| CliError::new(format!("failed to encode scenario list: {err}")))?;
            write_stdout_line(&json)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `config check`.
fn command_config_check(command: &ConfigCheckCommand) -> CliResult<ExitCode> {
    let suite = load_suite(&command.suite)?;
    write_stdout_line(&format!(
        "{}: suite is valid ({} scenarios)",
        command.suite.display(),
        suite.scenarios.len()
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Formats the per-scenario status line.
fn scenario_line(summary: &ScenarioSummary) -> String {
    match &summary.message {
        Some(message) => format!("{}: {} ({message})", summary.scenario_id, summary.status),
        None => format!("{}: {}", summary.scenario_id, summary.status),
    }
}

/// Writes the per-scenario status line.
fn write_scenario_line(summary: &ScenarioSummary) -> CliResult<()> {
    write_stdout_line(&scenario_line(summary))
}

/// Writes the closing lines of a run.
fn write_run_footer(summary: &RunSummary, artifacts: &Path) -> CliResult<()> {
    write_stdout_line(&format!(
        "{} of {} scenarios passed; summary written to {}",
        summary.scenarios.len() - summary.failed_count(),
        summary.scenarios.len(),
        artifacts.display()
    ))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = write_stderr_line(&format!("infra-harness: {err}"));
    ExitCode::from(err.code)
}
