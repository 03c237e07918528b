// crates/fcs-runner/src/main.rs
// ============================================================================
// Module: Conformance Suite CLI Entry Point
// Description: Command dispatcher for planning, result collection and reports.
// Purpose: Drive a conformance journey from an operator configuration file.
// Dependencies: clap, fcs-config, fcs-core, fcs-report, fcs-runner, fcs-schema, tokio
// ============================================================================

//! ## Overview
//! `fcs plan` compiles the configured discovery document and prints the test
//! plan summary. `fcs run` collects results from a framed result stream,
//! prints them, exports the report archive and signs it when a signing key is
//! configured. `fcs verify` checks a report token; `fcs check-update` compares
//! the running version with published tags. The exit status is success only
//! when every collected result passed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use fcs_config::FcsConfig;
use fcs_config::HttpConfig;
use fcs_core::DiscoveryModel;
use fcs_core::EventSink;
use fcs_core::MacroTable;
use fcs_core::ManifestSource;
use fcs_core::load_discovery;
use fcs_report::CertifiedBy;
use fcs_report::Environment;
use fcs_report::ReportSigner;
use fcs_report::ReportVerifier;
use fcs_report::export_report_file;
use fcs_report::import_report_file;
use fcs_runner::HttpTransport;
use fcs_runner::Journey;
use fcs_runner::ResultAggregator;
use fcs_runner::ResultStreamReader;
use fcs_runner::RunnerError;
use fcs_runner::TestPlan;
use fcs_runner::ValidatorMap;
use fcs_runner::VersionChecker;
use fcs_runner::all_passed;
use fcs_runner::build_report;
use fcs_runner::event_sink;
use fcs_runner::sign_report;
use fcs_runner::verify_report;
use fcs_runner::write_results;
use fcs_schema::load_validator_file;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Conformance suite command line.
#[derive(Parser, Debug)]
#[command(name = "fcs", version, disable_help_subcommand = true)]
struct Cli {
    /// Configuration file; defaults to `$FCS_CONFIG` or `fcs.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory `file://` URIs resolve against.
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    root: PathBuf,
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Compile the test plan and print its summary as JSON.
    Plan(PlanArgs),
    /// Collect streamed results, print them and export the report.
    Run(RunArgs),
    /// Verify a signed report.
    Verify(VerifyArgs),
    /// Compare the running version with published tags.
    CheckUpdate(CheckUpdateArgs),
}

/// Validator selection shared by planning commands.
#[derive(Args, Debug)]
struct SchemaArgs {
    /// OpenAPI document for a schema URL, as `URL=PATH`.
    #[arg(long = "schema", value_name = "URL=PATH")]
    schemas: Vec<String>,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
struct PlanArgs {
    /// Validator documents.
    #[command(flatten)]
    schemas: SchemaArgs,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunArgs {
    /// Validator documents.
    #[command(flatten)]
    schemas: SchemaArgs,
    /// Framed result stream to read.
    #[arg(long, value_name = "PATH")]
    results: PathBuf,
    /// Report archive to write.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,
    /// Environment the suite ran against.
    #[arg(long, value_enum, default_value_t = EnvironmentArg::Sandbox)]
    environment: EnvironmentArg,
    /// Brand under test.
    #[arg(long)]
    brand: String,
    /// Person authorising the submission.
    #[arg(long)]
    authorised_by: String,
    /// Job title of the authorising person.
    #[arg(long)]
    job_title: String,
    /// Accept the terms and conditions.
    #[arg(long)]
    agree: bool,
}

/// Arguments for `verify`.
#[derive(Args, Debug)]
struct VerifyArgs {
    /// Report archive.
    #[arg(long, value_name = "PATH")]
    report: PathBuf,
    /// File holding the compact token.
    #[arg(long, value_name = "PATH")]
    token: PathBuf,
    /// PEM public key of the issuer.
    #[arg(long, value_name = "PATH")]
    public_key: PathBuf,
}

/// Arguments for `check-update`.
#[derive(Args, Debug)]
struct CheckUpdateArgs {
    /// Tag list URL.
    #[arg(long)]
    url: String,
}

/// Report environment names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
enum EnvironmentArg {
    /// Testing environment.
    Testing,
    /// Sandbox environment.
    Sandbox,
    /// Production environment.
    Production,
}

impl From<EnvironmentArg> for Environment {
    fn from(value: EnvironmentArg) -> Self {
        match value {
            EnvironmentArg::Testing => Self::Testing,
            EnvironmentArg::Sandbox => Self::Sandbox,
            EnvironmentArg::Production => Self::Production,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failure carrying a printable message.
#[derive(Debug, Error)]
#[error("{0}")]
struct CliError(String);

impl From<RunnerError> for CliError {
    fn from(err: RunnerError) -> Self {
        Self(err.to_string())
    }
}

/// CLI result alias.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the selected command.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = FcsConfig::load(cli.config.as_deref()).map_err(|err| CliError(err.to_string()))?;
    let events = event_sink(&config.logging).map_err(|err| CliError(format!("event sink: {err}")))?;
    let source = ManifestSource::new(cli.root.clone());
    match cli.command {
        Command::Plan(args) => command_plan(&config, &source, events, &args),
        Command::Run(args) => command_run(&config, &source, events, args).await,
        Command::Verify(args) => command_verify(&config, &source, events, &args),
        Command::CheckUpdate(args) => {
            let http = config.http.clone();
            tokio::task::spawn_blocking(move || command_check_update(&http, events.as_ref(), &args))
                .await
                .map_err(|err| CliError(format!("version check task: {err}")))?
        }
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Summary of one planned specification.
#[derive(Debug, Serialize)]
struct SpecificationSummary {
    /// Specification name.
    name: String,
    /// Specification version.
    version: String,
    /// Specification family.
    spec_type: String,
    /// Manifest URI.
    manifest: String,
    /// Test-case identifiers in plan order.
    test_cases: Vec<String>,
    /// Token groups.
    tokens: Vec<TokenSummary>,
}

/// Summary of one token group.
#[derive(Debug, Serialize)]
struct TokenSummary {
    /// Token name.
    name: String,
    /// Space-joined consent scope.
    scope: String,
    /// Test cases sharing the token.
    test_cases: Vec<String>,
}

/// Runs `plan`.
fn command_plan(
    config: &FcsConfig,
    source: &ManifestSource,
    events: Arc<dyn EventSink>,
    args: &PlanArgs,
) -> CliResult<ExitCode> {
    let (_, plan) = compile_plan(config, source, events, &args.schemas)?;
    let summary: Vec<SpecificationSummary> = plan
        .specifications
        .iter()
        .map(|specification| SpecificationSummary {
            name: specification.specification.name.clone(),
            version: specification.specification.version.clone(),
            spec_type: specification.spec_type.to_string(),
            manifest: specification.manifest_uri.clone(),
            test_cases: specification.test_cases.iter().map(|test_case| test_case.id.to_string()).collect(),
            tokens: specification
                .token_groups
                .iter()
                .map(|group| TokenSummary {
                    name: group.name.to_string(),
                    scope: group.scope(),
                    test_cases: group.test_cases.iter().map(ToString::to_string).collect(),
                })
                .collect(),
        })
        .collect();
    let json = serde_json::to_string_pretty(&summary).map_err(|err| CliError(err.to_string()))?;
    write_stdout_line(&json)?;
    Ok(ExitCode::SUCCESS)
}

/// Runs `run`.
async fn command_run(
    config: &FcsConfig,
    source: &ManifestSource,
    events: Arc<dyn EventSink>,
    args: RunArgs,
) -> CliResult<ExitCode> {
    let (discovery, plan) = compile_plan(config, source, Arc::clone(&events), &args.schemas)?;

    let file = tokio::fs::File::open(&args.results)
        .await
        .map_err(|err| CliError(format!("{}: {err}", args.results.display())))?;
    let (reader, channels) = ResultStreamReader::new(events).spawn(file, config.runner.results_capacity);
    let results = ResultAggregator::new(config.runner.timeout()).collect(channels).await;
    reader.abort();
    let results = results?;

    let mut stdout = std::io::stdout().lock();
    write_results(&mut stdout, &results).map_err(|err| CliError(format!("stdout: {err}")))?;

    let certified_by = CertifiedBy {
        environment: args.environment.into(),
        brand: args.brand,
        authorised_by: args.authorised_by,
        job_title: args.job_title,
        agreed_terms_conditions: args.agree,
    };
    let now = OffsetDateTime::now_utc();
    let report = build_report(&plan, &discovery, &results, certified_by, &config.report, now)?;
    export_report_file(&report, &args.out).map_err(|err| CliError(err.to_string()))?;

    if let Some(key_path) = &config.report.signing_key {
        let signer = ReportSigner::from_file(Path::new(key_path)).map_err(|err| CliError(err.to_string()))?;
        let token = sign_report(&report, &plan, &config.report, &signer, now)?;
        let token_path = args.out.with_extension("jws");
        fs::write(&token_path, token).map_err(|err| CliError(format!("{}: {err}", token_path.display())))?;
    }

    Ok(if all_passed(&results) { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Runs `verify`.
fn command_verify(
    config: &FcsConfig,
    source: &ManifestSource,
    events: Arc<dyn EventSink>,
    args: &VerifyArgs,
) -> CliResult<ExitCode> {
    let report = import_report_file(&args.report).map_err(|err| CliError(err.to_string()))?;
    let (_, plan) = compile_plan(config, source, events, &SchemaArgs {
        schemas: Vec::new(),
    })?;
    let token =
        fs::read_to_string(&args.token).map_err(|err| CliError(format!("{}: {err}", args.token.display())))?;
    let verifier = ReportVerifier::from_file(&args.public_key).map_err(|err| CliError(err.to_string()))?;
    let claims = verify_report(token.trim(), &report, &plan, &verifier, OffsetDateTime::now_utc())?;
    write_stdout_line(&format!("report {} verified for {}", claims.jti, claims.iss))?;
    Ok(ExitCode::SUCCESS)
}

/// Runs `check-update`; the blocking client must stay off the async runtime.
fn command_check_update(http: &HttpConfig, events: &dyn EventSink, args: &CheckUpdateArgs) -> CliResult<ExitCode> {
    let transport = HttpTransport::from_config(http, events)?;
    let status = VersionChecker::new(args.url.clone()).check(&transport)?;
    let json = serde_json::to_string_pretty(&status).map_err(|err| CliError(err.to_string()))?;
    write_stdout_line(&json)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads discovery and validators, then compiles the plan.
fn compile_plan(
    config: &FcsConfig,
    source: &ManifestSource,
    events: Arc<dyn EventSink>,
    schemas: &SchemaArgs,
) -> CliResult<(DiscoveryModel, TestPlan)> {
    let discovery = load_discovery(source, &config.discovery).map_err(RunnerError::from)?;
    let validators = load_validators(&schemas.schemas)?;
    let mut journey =
        Journey::new(source.clone(), events, MacroTable::now_utc()).with_api_versions(config.api_versions.clone());
    let plan = journey.plan(&discovery, &config.seed_context(), &validators)?;
    Ok((discovery, plan))
}

/// Parses `URL=PATH` pairs and loads each document.
fn load_validators(pairs: &[String]) -> CliResult<ValidatorMap> {
    let mut validators = ValidatorMap::new();
    for pair in pairs {
        let (url, path) =
            pair.split_once('=').ok_or_else(|| CliError(format!("--schema expects URL=PATH, got {pair}")))?;
        let validator = load_validator_file(Path::new(path)).map_err(RunnerError::from)?;
        validators.insert(url.to_string(), validator);
    }
    Ok(validators)
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError(format!("stdout: {err}")))
}

/// Writes an error line to stderr and returns the failure code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "fcs: {message}");
    ExitCode::FAILURE
}
