use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use voevent_author::cli::{CheckArgs, Cli, Command, DemoArgs, OutputFormat, ShowArgs, VerbosityLevel};
use voevent_author::config::{Config, ConfigManager};
use voevent_author::demo::gaia_packet;
use voevent_author::error::VoeventError;
use voevent_author::error_reporter::ErrorReporter;
use voevent_author::file_discovery::FileDiscovery;
use voevent_author::output::{Output, format_json};
use voevent_author::schema_loader::SchemaSource;
use voevent_author::validator::{SchemaValidator, ValidationConfig, ValidationEngine};
use voevent_author::{parse, serialize};

/// Exit status when a packet or file failed validation
const EXIT_INVALID: u8 = 1;
/// Exit status for usage, configuration and IO errors
const EXIT_ERROR: u8 = 2;

fn init_logging(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn validator_for(config: &Config) -> Result<SchemaValidator> {
    let source = SchemaSource::from(config.validation.schema_path.clone());
    Ok(SchemaValidator::from_source(source)?)
}

/// Build, validate and write the Gaia14adi packet. Returns whether it is valid.
fn run_demo(args: &DemoArgs, config: &Config) -> Result<bool> {
    let voevent = gaia_packet(Utc::now())?;
    let validator = validator_for(config)?;

    let valid = match validator.assert_valid(&voevent) {
        Ok(()) => true,
        Err(VoeventError::SchemaViolation { path, reason }) => {
            warn!(%path, %reason, "Demo packet is not schema-valid");
            false
        }
        Err(err) => return Err(err.into()),
    };

    serialize::dump_to_path(&voevent, &args.output, config.output.pretty)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if let Some(line) = Output::new(config.verbosity()).format_packet_written(&args.output, valid) {
        println!("{}", line);
    }
    Ok(valid)
}

/// Validate every discovered file. Returns whether all of them passed.
fn run_check(args: &CheckArgs, config: &Config) -> Result<bool> {
    let discovery = FileDiscovery::new()
        .with_extensions(config.files.extensions.clone())
        .with_include_patterns(config.files.include_patterns.clone())?
        .with_exclude_patterns(config.files.exclude_patterns.clone())?;

    let engine = ValidationEngine::new(
        validator_for(config)?,
        discovery,
        ValidationConfig {
            threads: ConfigManager::get_thread_count(config),
            fail_fast: config.validation.fail_fast,
        },
    )?;

    let results = engine.validate_paths(&args.paths)?;
    debug!(
        total = results.total_files,
        valid = results.valid_files,
        "Check finished"
    );

    match OutputFormat::from(config.output.format) {
        OutputFormat::Human => print!("{}", Output::new(config.verbosity()).format_results(&results)),
        OutputFormat::Json => println!("{}", format_json(&results, config.output.pretty)?),
    }

    Ok(!results.has_errors())
}

/// Print a parsed packet, or one of its sections
fn run_show(args: &ShowArgs, config: &Config) -> Result<bool> {
    let voevent = parse::load_path(&args.file)?;

    let text = match args.section {
        None => voevent.to_xml_string(config.output.pretty),
        Some(section) => {
            let root = serialize::to_element(&voevent);
            match root.child(section.tag()) {
                Some(element) => element.to_xml_string(config.output.pretty),
                None => bail!("{} has no {} section", args.file.display(), section.tag()),
            }
        }
    };

    println!("{}", text.trim_end());
    Ok(true)
}

fn run(cli: &Cli, config: &Config) -> Result<bool> {
    match &cli.command {
        Command::Demo(args) => run_demo(args, config),
        Command::Check(args) => run_check(args, config),
        Command::Show(args) => run_show(args, config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let config = match ConfigManager::load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            init_logging(cli.verbosity());
            ErrorReporter::new(cli.verbosity()).report(&anyhow::Error::from(err));
            return ExitCode::from(EXIT_ERROR);
        }
    };
    init_logging(config.verbosity());

    match run(&cli, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID),
        Err(err) => {
            ErrorReporter::new(config.verbosity()).report(&err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
