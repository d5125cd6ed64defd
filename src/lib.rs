//! argcomp library
//!
//! Dynamic tab completion for command-line programs. A program describes its
//! arguments as a [`spec::CommandSpec`] tree (by hand, from JSON, or from a
//! clap command) and calls [`interceptor::Interceptor::intercept`] first thing
//! in `main`. When the shell hook asks for completions, the line is tokenized,
//! walked against the tree, completed and sent back in the shell's format;
//! otherwise the program runs normally.
//!
//! # Modules
//!
//! - `cli`: Command-line interface of the `argcomp` binary
//! - `completion`: Tokenizer, tree walker, completers and engine
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `interceptor`: Completion request lifecycle
//! - `shell`: Request decoding and per-shell response encoding
//! - `spec`: Argument spec tree
//!
//! # Example
//!
//! ```no_run
//! use argcomp::{Action, Arity, CommandSpec, Interceptor};
//!
//! let spec = CommandSpec::new("myprog")
//!     .action(Action::flag(["--protocol"]).arity(Arity::One).choices(["http", "https", "ssh"]))
//!     .subcommand(CommandSpec::new("push"));
//!
//! Interceptor::new(&spec).intercept();
//! println!("running normally");
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod shell;
pub mod spec;

// Re-export commonly used types
pub use completion::{Completer, CompletionCandidate, CompletionEngine, CompletionOutcome};
pub use config::CompletionConfig;
pub use error::{ArgcompError, Result};
pub use interceptor::{Interceptor, Lifecycle};
pub use shell::{ShellContext, ShellKind};
pub use spec::{Action, Arity, CommandSpec, ValueHint, from_clap};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
