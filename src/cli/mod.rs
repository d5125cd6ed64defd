//! Command-line interface for argcomp
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - The `register`, `explain` and `config` sub-commands

pub mod explain;
pub mod register;

use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::completion::CompletionEngine;
use crate::config::{CONFIG_ENV_VAR, CompletionConfig, LogLevel};
use crate::error::Result;
use crate::shell::{ShellContext, ShellKind};
use crate::spec::{CommandSpec, from_clap};

use explain::{ExplainFormatter, explain};
use register::{HookOptions, generate_hook};

/// Shell names accepted by `--shell`
const SHELL_NAMES: [&str; 5] = ["bash", "zsh", "tcsh", "fish", "powershell"];

/// argcomp - dynamic tab completion for command-line programs
#[derive(Parser, Debug)]
#[command(
    name = "argcomp",
    version,
    about = "Dynamic tab completion for command-line programs",
    long_about = "Routes shell tab completion through a program's own argument spec.
Programs call the interceptor first thing in main; `argcomp register` prints the
shell hook that triggers it."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for argcomp
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the shell hook that enables completion for a program
    Register {
        /// Program to complete
        #[arg(value_name = "PROGRAM", value_hint = ValueHint::CommandName)]
        program: String,

        /// Target shell
        #[arg(short, long, default_value = "bash", value_parser = SHELL_NAMES)]
        shell: String,

        /// Answer requests from a JSON spec instead of the program itself
        #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
        spec: Option<PathBuf>,
    },

    /// Show how a command line would be completed
    Explain {
        /// JSON spec to complete against (argcomp's own surface if omitted)
        #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
        spec: Option<PathBuf>,

        /// Command line, program name first
        #[arg(short, long, value_name = "LINE", allow_hyphen_values = true)]
        line: String,

        /// Cursor byte offset (end of line if omitted)
        #[arg(short, long, value_name = "OFFSET")]
        point: Option<usize>,

        /// Shell whose payload is shown
        #[arg(short, long, default_value = "bash", value_parser = SHELL_NAMES)]
        shell: String,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Print the configuration file path
        #[arg(long)]
        path: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// The spec tree of argcomp's own command line
pub fn argcomp_spec() -> CommandSpec {
    from_clap(&CliArgs::command())
}

/// Load a JSON spec file, or argcomp's own spec when no file is given
///
/// # Arguments
/// * `path` - Optional JSON spec file
///
/// # Returns
/// * `Result<CommandSpec>` - Validated spec tree or error
pub fn load_spec(path: Option<&Path>) -> Result<CommandSpec> {
    match path {
        Some(path) => CommandSpec::from_json_file(path),
        None => Ok(argcomp_spec()),
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: CompletionConfig,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Load configuration from file and apply arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<CompletionConfig>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<CompletionConfig> {
        let mut config = match &args.config_file {
            Some(path) => CompletionConfig::load_from_file(Some(path.as_path()))?,
            None => CompletionConfig::load()?,
        };

        Self::apply_logging_args(&mut config, args);

        Ok(config)
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut CompletionConfig, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Get the configuration
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Handle the selected subcommand
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn handle_subcommand(&self) -> Result<()> {
        match &self.args.command {
            Commands::Register {
                program,
                shell,
                spec,
            } => {
                let hook = self.register_hook(program, shell, spec.as_deref())?;
                print!("{}", hook);
                Ok(())
            }
            Commands::Explain {
                spec,
                line,
                point,
                shell,
            } => {
                let output = self.explain_line(spec.as_deref(), line, *point, shell)?;
                print!("{}", output);
                Ok(())
            }
            Commands::Config {
                show,
                path,
                validate,
            } => self.handle_config_command(*show, *path, *validate),
        }
    }

    /// Build the shell hook for `register`
    ///
    /// # Arguments
    /// * `program` - Program to complete
    /// * `shell` - Target shell name
    /// * `spec` - Optional JSON spec answered by this binary
    ///
    /// # Returns
    /// * `Result<String>` - Hook snippet or error
    fn register_hook(&self, program: &str, shell: &str, spec: Option<&Path>) -> Result<String> {
        let kind: ShellKind = shell.parse()?;
        let mut options = HookOptions::new(program, kind);

        if let Some(path) = spec {
            load_spec(Some(path))?;
            let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            let executable = std::env::current_exe()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "argcomp".to_string());
            options = options.spec_file(path, executable);
        }

        Ok(generate_hook(&options))
    }

    /// Run the pipeline for `explain` and format the result
    fn explain_line(
        &self,
        spec: Option<&Path>,
        line: &str,
        point: Option<usize>,
        shell: &str,
    ) -> Result<String> {
        let kind: ShellKind = shell.parse()?;
        let spec = load_spec(spec)?;
        let engine = CompletionEngine::new(self.config.clone());
        let ctx = ShellContext::local(kind, line, point.unwrap_or(line.len()));

        let use_colors = !self.args.no_color && std::io::stdout().is_terminal();
        Ok(ExplainFormatter::new(use_colors).format(&explain(&spec, &engine, &ctx)))
    }

    /// Handle config subcommand
    ///
    /// # Arguments
    /// * `show` - Whether to show configuration
    /// * `path` - Whether to print the file path
    /// * `validate` - Whether to validate configuration
    fn handle_config_command(&self, show: bool, path: bool, validate: bool) -> Result<()> {
        if path {
            println!("{}", self.config_path().display());
        }

        if validate {
            self.validate_config_file();
        }

        if show || !(path || validate) {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist, defaults apply");
            return;
        }

        match CompletionConfig::load_from_file(Some(path.as_path())) {
            Ok(_) => println!("Configuration is valid"),
            Err(e) => println!("Configuration is invalid: {}", e),
        }
    }

    /// Show effective configuration
    fn show_config(&self) -> Result<()> {
        println!("# Configuration file: {}", self.config_path().display());
        println!();
        println!("{}", self.config.to_toml()?);
        Ok(())
    }

    /// Configuration file path: `--config`, then the environment, then the default
    pub fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(CompletionConfig::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompletionConfig;

    fn cli(argv: &[&str]) -> CliInterface {
        let args = CliArgs::try_parse_from(argv).unwrap();
        let mut config = CompletionConfig::default();
        CliInterface::apply_logging_args(&mut config, &args);
        CliInterface { args, config }
    }

    #[test]
    fn test_cli_args_register() {
        let args = CliArgs::try_parse_from(["argcomp", "register", "myprog"]).unwrap();
        match args.command {
            Commands::Register {
                program,
                shell,
                spec,
            } => {
                assert_eq!(program, "myprog");
                assert_eq!(shell, "bash");
                assert!(spec.is_none());
            }
            other => panic!("Expected register, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_args_rejects_unknown_shell() {
        assert!(CliArgs::try_parse_from(["argcomp", "register", "myprog", "-s", "ksh"]).is_err());
    }

    #[test]
    fn test_cli_args_explain_allows_hyphen_line() {
        let args =
            CliArgs::try_parse_from(["argcomp", "explain", "--line", "--prot", "--point", "3"])
                .unwrap();
        match args.command {
            Commands::Explain { line, point, .. } => {
                assert_eq!(line, "--prot");
                assert_eq!(point, Some(3));
            }
            other => panic!("Expected explain, got {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(["argcomp"]).is_err());
    }

    #[test]
    fn test_logging_args() {
        assert_eq!(cli(&["argcomp", "-v", "config"]).config().logging.level, LogLevel::Debug);
        assert_eq!(cli(&["argcomp", "--vv", "config"]).config().logging.level, LogLevel::Trace);
        assert_eq!(cli(&["argcomp", "-q", "config"]).config().logging.level, LogLevel::Error);
        assert_eq!(cli(&["argcomp", "config"]).config().logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_config_path_prefers_argument() {
        let cli = cli(&["argcomp", "--config", "/tmp/argcomp.toml", "config"]);
        assert_eq!(cli.config_path(), PathBuf::from("/tmp/argcomp.toml"));
    }

    #[test]
    fn test_argcomp_spec_completes_itself() {
        let spec = argcomp_spec();
        assert!(spec.find_subcommand("register").is_some());
        assert!(spec.find_subcommand("explain").is_some());

        let engine = CompletionEngine::new(CompletionConfig::default());
        let line = "argcomp reg";
        assert_eq!(engine.complete_line(&spec, line, line.len()).values(), vec!["register"]);

        let line = "argcomp register --shell z";
        assert_eq!(engine.complete_line(&spec, line, line.len()).values(), vec!["zsh"]);
    }

    #[test]
    fn test_register_hook_with_spec_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool.json");
        std::fs::write(&path, r#"{"name": "tool", "actions": [], "subcommands": []}"#).unwrap();

        let cli = cli(&["argcomp", "register", "tool"]);
        let hook = cli.register_hook("tool", "zsh", Some(&path)).unwrap();
        assert!(hook.contains("_ARGCOMP_SPEC_FILE="));
        assert!(hook.contains("compdef _argcomp_tool 'tool'"));
    }

    #[test]
    fn test_register_hook_missing_spec_file() {
        let cli = cli(&["argcomp", "register", "tool"]);
        assert!(
            cli.register_hook("tool", "bash", Some(Path::new("/nonexistent/spec.json")))
                .is_err()
        );
    }

    #[test]
    fn test_load_spec_rejects_invalid_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        std::fs::write(
            &path,
            r#"{"name": "tool", "actions": [{"names": ["--a"]}, {"names": ["--a"]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            load_spec(Some(&path)),
            Err(crate::error::ArgcompError::Spec(
                crate::error::SpecError::DuplicateFlag { .. }
            ))
        ));
        assert_eq!(load_spec(None).unwrap().name, "argcomp");
    }

    #[test]
    fn test_explain_line() {
        let cli = cli(&["argcomp", "--no-color", "explain", "--line", "x"]);
        let output = cli
            .explain_line(None, "argcomp config --sh", None, "bash")
            .unwrap();
        assert!(output.contains("--show"));
        assert!(output.contains("Payload"));
    }
}
