//! minrand CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use minrand_cli::commands::{
    AssignOptions, run_assign, run_create, run_list, run_reassign, run_remove, run_set_open,
    run_stats,
};
use minrand_cli::logging::{LogConfig, LogFormat, init_logging};
use minrand_store::{FileStore, StoreError};
use tracing::level_filters::LevelFilter;

mod cli;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::summary::{print_assignment, print_created, print_list, print_reassignment, print_report};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(error) => {
            report_error(&error);
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let store = FileStore::new(cli.store_dir);
    match cli.command {
        Command::Create(args) => {
            let (key, project) = run_create(&store, &args.definition, args.key.as_deref())?;
            print_created(&key, &project);
        }
        Command::Assign(args) => {
            let options = AssignOptions {
                subject_id: args.subject,
                assigner: args.assigner,
                values: args.values,
                seed: args.seed,
                max_attempts: args.max_attempts,
            };
            let result = run_assign(&store, &args.project, &options)?;
            print_assignment(&result);
        }
        Command::Remove(args) => {
            run_remove(&store, &args.project, &args.subject)?;
            println!("Subject {} removed from {}", args.subject, args.project);
        }
        Command::Reassign(args) => {
            let moved = run_reassign(&store, &args.project, &args.subject, &args.group)?;
            print_reassignment(&moved);
        }
        Command::Open(args) => {
            let was_open = run_set_open(&store, &args.project, true)?;
            print_enrollment(&args.project, was_open, true);
        }
        Command::Close(args) => {
            let was_open = run_set_open(&store, &args.project, false)?;
            print_enrollment(&args.project, was_open, false);
        }
        Command::Stats(args) => {
            let report = run_stats(&store, &args.project)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::List => print_list(&run_list(&store)?),
    }
    Ok(())
}

fn print_enrollment(project: &str, was_open: bool, open: bool) {
    let state = if open { "open" } else { "closed" };
    if was_open == open {
        println!("Enrollment for {project} was already {state}");
    } else {
        println!("Enrollment for {project} is now {state}");
    }
}

/// Print the error chain, with store guidance where available.
fn report_error(error: &anyhow::Error) {
    if let Some(store_error) = error.downcast_ref::<StoreError>() {
        eprintln!("error: {}", store_error.user_message());
        if let Some(suggestion) = store_error.suggestion() {
            eprintln!("hint: {suggestion}");
        }
        tracing::debug!("{error:?}");
    } else {
        eprintln!("error: {error:#}");
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
