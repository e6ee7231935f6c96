pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use intake_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "intake",
    about = "Quote-request intake wizard CLI",
    long_about = "Drive the quote-request wizard from an answers file: inspect the step plan, validate answers against each gate, and submit completed requests to the intake endpoint.",
    after_help = "Examples:\n  intake steps\n  intake check --file answers.toml\n  intake submit --file answers.toml"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Print the wizard step plan with owned fields and requirement markers")]
    Steps,
    #[command(about = "Validate an answers file against one step gate or every step gate")]
    Check {
        #[arg(long, help = "Path to a flat TOML answers file")]
        file: PathBuf,
        #[arg(long, help = "Validate a single 1-based step instead of all steps")]
        step: Option<u32>,
    },
    #[command(about = "Walk the wizard through every gate and submit to the intake endpoint")]
    Submit {
        #[arg(long, help = "Path to a flat TOML answers file")]
        file: PathBuf,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands report configuration problems themselves; logging setup only
    // needs a best-effort view of the level and format.
    let logging_config =
        AppConfig::load(LoadOptions::default()).unwrap_or_else(|_| AppConfig::default());
    init_logging(&logging_config);

    let result = match cli.command {
        Command::Steps => commands::steps::run(),
        Command::Check { file, step } => commands::check::run(&file, step),
        Command::Submit { file } => commands::submit::run(&file),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
