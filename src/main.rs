//! argcomp - dynamic shell tab completion
//!
//! Prints shell hooks, explains how a line would be completed and answers
//! completion requests for programs described by a JSON spec.
//!
//! # Usage
//!
//! ```bash
//! # Enable completion for a program that embeds the interceptor
//! eval "$(argcomp register myprog)"
//!
//! # Complete a program from a JSON spec
//! eval "$(argcomp register mytool --spec mytool.json)"
//!
//! # Inspect the pipeline
//! argcomp explain --line "myprog --protocol h"
//! ```

use argcomp::cli::register::ENV_SPEC_FILE;
use argcomp::cli::{CliInterface, argcomp_spec};
use argcomp::config::CompletionConfig;
use argcomp::error::Result;
use argcomp::interceptor::Interceptor;
use argcomp::shell::ENV_REQUEST;
use argcomp::spec::CommandSpec;

/// Application entry point
fn main() {
    if std::env::var_os(ENV_REQUEST).is_some() {
        let spec = completion_spec();
        let config = CompletionConfig::load().unwrap_or_default();
        Interceptor::new(&spec).with_config(config).intercept();
    }

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Spec answered during a completion request
///
/// A JSON spec named by the hook wins over argcomp's own command line. An
/// unreadable spec yields no candidates rather than argcomp's.
fn completion_spec() -> CommandSpec {
    match std::env::var_os(ENV_SPEC_FILE) {
        Some(path) => CommandSpec::from_json_file(&path)
            .unwrap_or_else(|_| CommandSpec::new("argcomp")),
        None => argcomp_spec(),
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Handle the subcommand
fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.handle_subcommand()
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
