//! Completion sources
//!
//! A [`Completer`] produces candidates for one action's value. The engine
//! calls it synchronously with a [`CompletionRequest`] describing what has
//! been typed so far; failures are reported as [`CompleterError`] and never
//! abort the request.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::candidate::CompletionCandidate;
use super::walker::ParsedArgs;
use crate::error::CompleterError;
use crate::spec::{Action, CommandSpec};

/// Everything a completer may look at
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Unquoted text typed so far for this value
    pub prefix: &'a str,
    /// The action whose value is being completed
    pub action: &'a Action,
    /// The command scope the action belongs to
    pub command: &'a CommandSpec,
    /// Values parsed from earlier words, keyed by destination
    pub parsed: &'a ParsedArgs,
}

/// Source of candidates for an action's value
pub trait Completer: Send + Sync {
    /// Produce candidates for the request
    ///
    /// Candidates need not be filtered by prefix; the engine does that.
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<CompletionCandidate>, CompleterError>;

    /// Name used in warnings and logs
    fn name(&self) -> &str;
}

impl fmt::Debug for dyn Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completer({})", self.name())
    }
}

/// Fixed list of values
#[derive(Debug, Clone)]
pub struct ChoicesCompleter {
    choices: Vec<String>,
}

impl ChoicesCompleter {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl Completer for ChoicesCompleter {
    fn complete(
        &self,
        _request: &CompletionRequest<'_>,
    ) -> Result<Vec<CompletionCandidate>, CompleterError> {
        Ok(self
            .choices
            .iter()
            .map(|c| CompletionCandidate::value(c.as_str()))
            .collect())
    }

    fn name(&self) -> &str {
        "choices"
    }
}

/// Filesystem paths relative to a base directory
///
/// The prefix is split at its last `/`: the part before is the directory to
/// list, the part after filters entry names. Directories are always offered
/// with a trailing `/` so the user can keep descending; dotfiles are listed
/// only when the name prefix starts with a dot.
#[derive(Debug, Clone, Default)]
pub struct FilesCompleter {
    base: Option<PathBuf>,
    extensions: Vec<String>,
    directories_only: bool,
}

impl FilesCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only offer files with one of these extensions (without the dot)
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve relative prefixes against `base` instead of the working directory
    pub fn base_dir(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    fn list(&self, prefix: &str) -> Result<Vec<CompletionCandidate>, CompleterError> {
        let (dir_part, name_prefix) = match prefix.rfind('/') {
            Some(idx) => (&prefix[..=idx], &prefix[idx + 1..]),
            None => ("", prefix),
        };

        let dir = self.resolve(dir_part);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            // nothing to offer under a directory that does not exist yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CompleterError::failed(
                    self.name(),
                    format!("{}: {e}", dir.display()),
                ));
            }
        };

        let show_hidden = name_prefix.starts_with('.');
        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(name_prefix) || (name.starts_with('.') && !show_hidden) {
                continue;
            }

            let is_dir = entry.path().is_dir();
            if is_dir {
                candidates.push(
                    CompletionCandidate::directory(format!("{dir_part}{name}/"))
                        .display(format!("{name}/")),
                );
            } else if !self.directories_only && self.accepts_file(&name) {
                candidates.push(
                    CompletionCandidate::file(format!("{dir_part}{name}")).display(name),
                );
            }
        }

        candidates.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(candidates)
    }

    fn resolve(&self, dir_part: &str) -> PathBuf {
        let dir = if dir_part.is_empty() { "." } else { dir_part };
        match &self.base {
            Some(base) if Path::new(dir).is_relative() => base.join(dir),
            _ => PathBuf::from(dir),
        }
    }

    fn accepts_file(&self, name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

impl Completer for FilesCompleter {
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<CompletionCandidate>, CompleterError> {
        self.list(request.prefix)
    }

    fn name(&self) -> &str {
        if self.directories_only {
            "directories"
        } else {
            "files"
        }
    }
}

/// Directory paths only
#[derive(Debug, Clone, Default)]
pub struct DirectoriesCompleter {
    inner: FilesCompleter,
}

impl DirectoriesCompleter {
    pub fn new() -> Self {
        Self {
            inner: FilesCompleter {
                directories_only: true,
                ..FilesCompleter::default()
            },
        }
    }

    pub fn base_dir(mut self, base: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.base_dir(base);
        self
    }
}

impl Completer for DirectoriesCompleter {
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<CompletionCandidate>, CompleterError> {
        self.inner.list(request.prefix)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Names of the process environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironCompleter;

impl Completer for EnvironCompleter {
    fn complete(
        &self,
        _request: &CompletionRequest<'_>,
    ) -> Result<Vec<CompletionCandidate>, CompleterError> {
        let mut names: Vec<String> = std::env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .collect();
        names.sort();
        Ok(names.into_iter().map(CompletionCandidate::from).collect())
    }

    fn name(&self) -> &str {
        "environ"
    }
}

/// Completer backed by a closure
pub struct FnCompleter<F> {
    name: String,
    f: F,
}

impl<F> Completer for FnCompleter<F>
where
    F: Fn(&CompletionRequest<'_>) -> Result<Vec<CompletionCandidate>, CompleterError>
        + Send
        + Sync,
{
    fn complete(
        &self,
        request: &CompletionRequest<'_>,
    ) -> Result<Vec<CompletionCandidate>, CompleterError> {
        (self.f)(request)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as a named completer
///
/// # Examples
///
/// ```rust
/// use argcomp::completion::{CompletionCandidate, completer_fn};
/// use argcomp::spec::{Action, Arity};
///
/// let branches = completer_fn("branches", |_request| {
///     Ok(vec![CompletionCandidate::from("main"), CompletionCandidate::from("dev")])
/// });
/// let action = Action::flag(["--branch"]).arity(Arity::One).completer(branches);
/// assert!(action.completer.is_some());
/// ```
pub fn completer_fn<F>(name: impl Into<String>, f: F) -> FnCompleter<F>
where
    F: Fn(&CompletionRequest<'_>) -> Result<Vec<CompletionCandidate>, CompleterError>
        + Send
        + Sync,
{
    FnCompleter {
        name: name.into(),
        f,
    }
}
