//! Argument spec tree
//!
//! A [`CommandSpec`] is the declarative description of a program's command
//! surface: its flags, positionals and sub-commands, plus the completion
//! sources attached to them. The target program builds it once at startup and
//! hands a shared reference to the completion engine, which only ever reads it.
//!
//! The tree is serializable so that programs that cannot link this crate can
//! describe themselves in JSON. Dynamic completers are code and are skipped by
//! serialization; static choices and value hints survive.
//!
//! # Example
//!
//! ```rust
//! use argcomp::spec::{Action, Arity, CommandSpec};
//!
//! let spec = CommandSpec::new("myprog")
//!     .action(Action::flag(["--protocol"]).arity(Arity::One).choices(["http", "https", "ssh"]))
//!     .subcommand(CommandSpec::new("push"));
//!
//! assert!(spec.find_flag("--protocol").is_some());
//! assert!(spec.find_subcommand("push").is_some());
//! ```

mod clap_builder;

pub use clap_builder::from_clap;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::completion::Completer;
use crate::error::{Result, SpecError};

/// How many values an action consumes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// A switch, takes no value
    #[default]
    Zero,
    /// Exactly one value
    One,
    /// Exactly `n` values
    Exactly(usize),
    /// Zero or one value
    Optional,
    /// Any number of values
    ZeroOrMore,
    /// At least one value
    OneOrMore,
}

impl Arity {
    /// Minimum number of values required
    pub fn min(&self) -> usize {
        match self {
            Arity::Zero | Arity::Optional | Arity::ZeroOrMore => 0,
            Arity::One | Arity::OneOrMore => 1,
            Arity::Exactly(n) => *n,
        }
    }

    /// Maximum number of values accepted, `None` when unbounded
    pub fn max(&self) -> Option<usize> {
        match self {
            Arity::Zero => Some(0),
            Arity::One | Arity::Optional => Some(1),
            Arity::Exactly(n) => Some(*n),
            Arity::ZeroOrMore | Arity::OneOrMore => None,
        }
    }

    /// Whether another value can be absorbed after `consumed` values
    pub fn accepts_more(&self, consumed: usize) -> bool {
        self.max().is_none_or(|max| consumed < max)
    }

    /// Whether the action takes any value at all
    pub fn takes_value(&self) -> bool {
        self.max() != Some(0)
    }

    /// Whether the arity is unbounded
    pub fn is_variadic(&self) -> bool {
        self.max().is_none()
    }
}

/// Built-in completion source selector, usable from serialized specs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueHint {
    /// Free-form value, filesystem paths are offered
    #[default]
    Any,
    /// File paths
    FilePath,
    /// Directory paths only
    DirPath,
    /// Environment variable names
    EnvVar,
    /// Free text, nothing is offered
    Nothing,
}

/// One declared flag or positional
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Invocation strings (`-p`, `--protocol`) or the positional's name
    pub names: Vec<String>,

    /// True for positionals
    #[serde(default)]
    pub positional: bool,

    /// Number of values consumed
    #[serde(default)]
    pub arity: Arity,

    /// Static choices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    /// Dynamic completion source, preferred over `choices`
    #[serde(skip)]
    pub completer: Option<Arc<dyn Completer>>,

    /// Built-in source used when neither completer nor choices are set
    #[serde(default)]
    pub value_hint: ValueHint,

    /// Stops all further flag matching once seen
    #[serde(default)]
    pub terminator: bool,

    /// May be given more than once
    #[serde(default)]
    pub repeatable: bool,

    /// Not offered as a flag-name candidate unless configured
    #[serde(default)]
    pub hidden: bool,

    /// Help text, display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Action {
    /// Declare a flag with one or more invocation strings
    pub fn flag<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_names(names.into_iter().map(Into::into).collect(), false)
    }

    /// Declare a positional taking one value
    pub fn positional(name: impl Into<String>) -> Self {
        Self::with_names(vec![name.into()], true).arity(Arity::One)
    }

    fn with_names(names: Vec<String>, positional: bool) -> Self {
        Self {
            names,
            positional,
            arity: Arity::Zero,
            choices: Vec::new(),
            completer: None,
            value_hint: ValueHint::Any,
            terminator: false,
            repeatable: false,
            hidden: false,
            help: None,
        }
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    pub fn completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Some(Arc::new(completer));
        self
    }

    pub fn value_hint(mut self, hint: ValueHint) -> Self {
        self.value_hint = hint;
        self
    }

    pub fn terminator(mut self, terminator: bool) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Key under which parsed values are recorded
    ///
    /// The first long name without its prefix, else the first name.
    pub fn dest(&self) -> String {
        if self.positional {
            return self.names.first().cloned().unwrap_or_default();
        }
        let name = self
            .names
            .iter()
            .find(|n| n.starts_with("--"))
            .or_else(|| self.names.first())
            .map(String::as_str)
            .unwrap_or_default();
        name.trim_start_matches(|c: char| !c.is_alphanumeric())
            .replace('-', "_")
    }

    /// Check whether this action answers to the given invocation string
    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// First name, used for display
    pub fn display_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("<unnamed>")
    }
}

/// One command scope: the root program or a sub-command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Command name as typed on the command line
    pub name: String,

    /// Alternative names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Characters that introduce a flag
    #[serde(default = "default_prefix_chars")]
    pub prefix_chars: String,

    /// Flags and positionals in declaration order
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Sub-commands in declaration order
    #[serde(default)]
    pub subcommands: Vec<CommandSpec>,
}

fn default_prefix_chars() -> String {
    "-".to_string()
}

impl CommandSpec {
    /// Create an empty command scope
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            help: None,
            prefix_chars: default_prefix_chars(),
            actions: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn prefix_chars(mut self, chars: impl Into<String>) -> Self {
        self.prefix_chars = chars.into();
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn subcommand(mut self, command: CommandSpec) -> Self {
        self.subcommands.push(command);
        self
    }

    /// Check whether the command answers to `name` (name or alias)
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Flags with their index into `actions`
    pub fn flags(&self) -> impl Iterator<Item = (usize, &Action)> {
        self.actions.iter().enumerate().filter(|(_, a)| !a.positional)
    }

    /// Indices of positionals in declaration order
    pub fn positional_indices(&self) -> Vec<usize> {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.positional)
            .map(|(i, _)| i)
            .collect()
    }

    /// Find a flag by exact invocation string
    pub fn find_flag(&self, name: &str) -> Option<(usize, &Action)> {
        self.flags().find(|(_, a)| a.matches(name))
    }

    /// Find a direct sub-command by name or alias
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandSpec> {
        self.subcommands.iter().find(|c| c.answers_to(name))
    }

    /// Whether `word` starts with one of this scope's prefix characters
    pub fn starts_with_prefix_char(&self, word: &str) -> bool {
        word.chars()
            .next()
            .is_some_and(|c| self.prefix_chars.contains(c))
    }

    /// Whether `word` should be treated as a flag rather than a value
    ///
    /// Negative numbers are values unless the scope declares a flag that
    /// itself looks like a negative number.
    pub fn is_flag_like(&self, word: &str) -> bool {
        if word.chars().count() < 2 || !self.starts_with_prefix_char(word) {
            return false;
        }
        if looks_like_negative_number(word) {
            return self
                .flags()
                .any(|(_, a)| a.names.iter().any(|n| looks_like_negative_number(n)));
        }
        true
    }

    /// Validate the whole tree
    ///
    /// # Returns
    /// * `Result<()>` - Ok if every scope is well-formed
    pub fn validate(&self) -> Result<()> {
        let mut seen_flags = HashSet::new();
        for action in &self.actions {
            if action.names.is_empty() {
                return Err(SpecError::MissingName(self.name.clone()).into());
            }
            for name in &action.names {
                if action.positional {
                    if self.starts_with_prefix_char(name) {
                        return Err(SpecError::InvalidPositionalName {
                            command: self.name.clone(),
                            name: name.clone(),
                        }
                        .into());
                    }
                    continue;
                }
                if !self.starts_with_prefix_char(name) {
                    return Err(SpecError::InvalidFlagName {
                        command: self.name.clone(),
                        name: name.clone(),
                    }
                    .into());
                }
                if !seen_flags.insert(name.as_str()) {
                    return Err(SpecError::DuplicateFlag {
                        command: self.name.clone(),
                        name: name.clone(),
                    }
                    .into());
                }
            }
        }

        let mut seen_commands = HashSet::new();
        for child in &self.subcommands {
            for name in std::iter::once(&child.name).chain(child.aliases.iter()) {
                if !seen_commands.insert(name.as_str()) {
                    return Err(SpecError::DuplicateSubcommand {
                        command: self.name.clone(),
                        name: name.clone(),
                    }
                    .into());
                }
            }
            child.validate()?;
        }
        Ok(())
    }

    /// Parse and validate a spec from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let spec: CommandSpec = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load and validate a spec from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpecError::FileNotFound(path.display().to_string()).into());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize the spec to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn looks_like_negative_number(word: &str) -> bool {
    word.strip_prefix('-')
        .is_some_and(|rest| !rest.is_empty() && rest.parse::<f64>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CommandSpec {
        CommandSpec::new("myprog")
            .action(Action::flag(["-v", "--verbose"]).repeatable(true))
            .action(
                Action::flag(["-p", "--protocol"])
                    .arity(Arity::One)
                    .choices(["http", "https", "ssh"]),
            )
            .action(Action::positional("target"))
            .subcommand(CommandSpec::new("push").alias("p"))
    }

    #[test]
    fn test_arity_bounds() {
        assert_eq!(Arity::One.min(), 1);
        assert_eq!(Arity::OneOrMore.max(), None);
        assert!(Arity::OneOrMore.accepts_more(10));
        assert!(!Arity::Exactly(2).accepts_more(2));
        assert!(Arity::Optional.accepts_more(0));
        assert!(!Arity::Zero.takes_value());
        assert!(Arity::ZeroOrMore.is_variadic());
    }

    #[test]
    fn test_find_flag_and_subcommand() {
        let spec = sample();
        let (index, action) = spec.find_flag("--protocol").unwrap();
        assert_eq!(index, 1);
        assert_eq!(action.choices.len(), 3);
        assert!(spec.find_flag("--missing").is_none());
        assert_eq!(spec.find_subcommand("p").unwrap().name, "push");
    }

    #[test]
    fn test_positional_indices() {
        assert_eq!(sample().positional_indices(), vec![2]);
    }

    #[test]
    fn test_dest_names() {
        let spec = sample();
        assert_eq!(spec.actions[0].dest(), "verbose");
        assert_eq!(spec.actions[2].dest(), "target");
        assert_eq!(Action::flag(["--dry-run"]).dest(), "dry_run");
        assert_eq!(Action::flag(["-x"]).dest(), "x");
    }

    #[test]
    fn test_flag_like_words() {
        let spec = sample();
        assert!(spec.is_flag_like("--verbose"));
        assert!(spec.is_flag_like("-x"));
        assert!(!spec.is_flag_like("-"));
        assert!(!spec.is_flag_like("-1"));
        assert!(!spec.is_flag_like("-2.5"));
        assert!(!spec.is_flag_like("value"));

        let numeric = CommandSpec::new("calc").action(Action::flag(["-1"]));
        assert!(numeric.is_flag_like("-1"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let spec = CommandSpec::new("prog")
            .action(Action::flag(["--a"]))
            .action(Action::flag(["--a"]));
        assert!(matches!(
            spec.validate(),
            Err(crate::error::ArgcompError::Spec(SpecError::DuplicateFlag { .. }))
        ));

        let spec = CommandSpec::new("prog")
            .subcommand(CommandSpec::new("build").alias("b"))
            .subcommand(CommandSpec::new("b"));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let spec = CommandSpec::new("prog").action(Action::flag(["verbose"]));
        assert!(spec.validate().is_err());

        let spec = CommandSpec::new("prog").action(Action::positional("--file"));
        assert!(spec.validate().is_err());

        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_custom_prefix_chars() {
        let spec = CommandSpec::new("win")
            .prefix_chars("/")
            .action(Action::flag(["/help"]));
        assert!(spec.validate().is_ok());
        assert!(spec.is_flag_like("/help"));
        assert!(!spec.is_flag_like("--help"));
    }

    #[test]
    fn test_json_roundtrip_keeps_static_data() {
        let json = sample().to_json().unwrap();
        let parsed = CommandSpec::from_json_str(&json).unwrap();
        assert_eq!(parsed.actions.len(), 3);
        assert_eq!(parsed.actions[1].choices, vec!["http", "https", "ssh"]);
        assert_eq!(parsed.subcommands[0].aliases, vec!["p"]);
    }

    #[test]
    fn test_json_defaults() {
        let spec = CommandSpec::from_json_str(
            r#"{
                "name": "tool",
                "actions": [
                    {"names": ["--out"], "arity": "one", "value_hint": "dir_path"},
                    {"names": ["files"], "positional": true, "arity": {"exactly": 2}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(spec.prefix_chars, "-");
        assert_eq!(spec.actions[0].value_hint, ValueHint::DirPath);
        assert_eq!(spec.actions[1].arity, Arity::Exactly(2));
        assert!(spec.actions[1].completer.is_none());
    }
}
