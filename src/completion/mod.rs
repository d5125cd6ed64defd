//! Completion system for argcomp
//!
//! Turns a raw command line and cursor position into an ordered list of
//! candidates for the word under the cursor.
//!
//! # Architecture
//!
//! - **Tokenizer**: Splits the line into shell words, tracking quotes at the cursor
//! - **Walker**: Replays the words against the spec tree and resolves a context
//! - **Context**: What the active word is (flag name, action value, positional)
//! - **Completers**: Sources of candidates for action values
//! - **Engine**: Orchestrates the flow, filters, de-duplicates and orders
//!
//! # Examples
//!
//! ```rust
//! use argcomp::completion::CompletionEngine;
//! use argcomp::config::CompletionConfig;
//! use argcomp::spec::{Action, Arity, CommandSpec};
//!
//! let spec = CommandSpec::new("myprog")
//!     .action(Action::flag(["--protocol"]).arity(Arity::One).choices(["http", "https", "ssh"]))
//!     .subcommand(CommandSpec::new("push"));
//!
//! let engine = CompletionEngine::new(CompletionConfig::default());
//! let line = "myprog --protocol h";
//! let outcome = engine.complete_line(&spec, line, line.len());
//! assert_eq!(outcome.values(), vec!["http", "https"]);
//! ```

mod candidate;
mod completers;
mod context;
mod engine;
mod tokenizer;
mod walker;

#[cfg(test)]
mod tests;

pub use candidate::{CandidateKind, CompletionCandidate};
pub use completers::{
    ChoicesCompleter, Completer, CompletionRequest, DirectoriesCompleter, EnvironCompleter,
    FilesCompleter, FnCompleter, completer_fn,
};
pub use context::CompletionContext;
pub use engine::{CompletionEngine, CompletionOutcome, Validator};
pub use tokenizer::{QuoteKind, ShellWordTokenizer, Token, clamp_cursor};
pub use walker::{ParseState, ParsedArgs, ParserTreeWalker, PendingValue};
