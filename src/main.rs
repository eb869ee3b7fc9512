//! Audit Logging - configuration tooling for the audit interceptor.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use audit_logging::config::{ConfigError, ConfigLoader};
use audit_logging::interceptor::MethodName;
use audit_logging::rules::most_relevant;

#[derive(Parser)]
#[command(
    name = "audit-logging",
    about = "Audit logging rules and pipeline configuration",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration.
    Validate,
    /// Show the rule governing a method.
    Match {
        /// Method name, either `/pkg.Service/Method` or `pkg.Service.Method`.
        method: String,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<(), ConfigError> {
    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = loader.load()?;

    match cli.command {
        Commands::Validate => {
            tracing::info!(rules = config.rules.len(), "Configuration is valid");
            println!(
                "OK: {} rule(s), log mode {}",
                config.rules.len(),
                config.log_mode.as_str()
            );
        }
        Commands::Match { method } => {
            let name = MethodName::parse(&method);
            let rule = most_relevant(&name.full, &config.rules);
            if rule.is_unset() {
                println!("{}: not audited (no matching rule)", name.full);
            } else {
                println!(
                    "{}: selector '{}', directive {}, log type {}",
                    name.full,
                    rule.selector,
                    rule.directive.as_str(),
                    rule.log_type.as_str()
                );
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
