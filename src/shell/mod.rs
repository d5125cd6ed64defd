//! Shell protocol adapters
//!
//! Each supported shell talks to a completing program differently: which
//! environment variables carry the request, where the response goes, how
//! candidates are separated, escaped and described. This module decodes the
//! request side into a [`ShellContext`] and dispatches the response side to
//! one [`ShellProtocol`] implementation per shell.
//!
//! # Request
//!
//! | variable | meaning |
//! |---|---|
//! | `_ARGCOMP` | non-empty and not `0`: completion requested |
//! | `_ARGCOMP_SHELL` | `bash` (default), `zsh`, `tcsh`, `fish`, `powershell` |
//! | `COMP_LINE`, `COMP_POINT` | raw line and cursor byte offset |
//! | `COMMAND_LINE` | tcsh: text up to the cursor |
//! | `_ARGCOMP_IFS` | candidate separator |
//! | `_ARGCOMP_DFS` | description separator |
//! | `_ARGCOMP_COMP_WORDBREAKS` | bash word-break characters |
//! | `_ARGCOMP_SUPPRESS_SPACE` | `1`: the shell adds spaces itself |
//! | `_ARGCOMP_USE_TEMPFILE`, `_ARGCOMP_STDOUT_FILENAME` | temp-file channel |
//! | `_ARGCOMP_OUTPUT_FD` | descriptor number, default 8 |
//! | `_ARGCOMP_DEBUG` | diagnostics to the original stderr |

mod bash;
mod fish;
mod powershell;
mod tcsh;
mod zsh;

pub use bash::Bash;
pub use fish::Fish;
pub use powershell::PowerShell;
pub use tcsh::Tcsh;
pub use zsh::Zsh;

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use crate::completion::{CompletionCandidate, CompletionOutcome, QuoteKind, clamp_cursor};
use crate::error::{ProtocolError, Result};

pub const ENV_REQUEST: &str = "_ARGCOMP";
pub const ENV_SHELL: &str = "_ARGCOMP_SHELL";
pub const ENV_LINE: &str = "COMP_LINE";
pub const ENV_POINT: &str = "COMP_POINT";
pub const ENV_TCSH_LINE: &str = "COMMAND_LINE";
pub const ENV_IFS: &str = "_ARGCOMP_IFS";
pub const ENV_DFS: &str = "_ARGCOMP_DFS";
pub const ENV_WORDBREAKS: &str = "_ARGCOMP_COMP_WORDBREAKS";
pub const ENV_SUPPRESS_SPACE: &str = "_ARGCOMP_SUPPRESS_SPACE";
pub const ENV_USE_TEMPFILE: &str = "_ARGCOMP_USE_TEMPFILE";
pub const ENV_STDOUT_FILENAME: &str = "_ARGCOMP_STDOUT_FILENAME";
pub const ENV_OUTPUT_FD: &str = "_ARGCOMP_OUTPUT_FD";
pub const ENV_DEBUG: &str = "_ARGCOMP_DEBUG";

/// Descriptor the shell hooks open for the response
pub const DEFAULT_OUTPUT_FD: i32 = 8;

/// Bash's default `COMP_WORDBREAKS`
pub const DEFAULT_WORDBREAKS: &str = " \t\n\"'><=;|&(:";

/// Source of environment variables
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Supported shells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// Interactive POSIX-like shell
    Bash,
    /// Restricted POSIX-like shell
    Zsh,
    /// C-shell-like
    Tcsh,
    /// Modern shell
    Fish,
    /// Modern shell
    PowerShell,
}

impl ShellKind {
    pub const ALL: [ShellKind; 5] = [
        ShellKind::Bash,
        ShellKind::Zsh,
        ShellKind::Tcsh,
        ShellKind::Fish,
        ShellKind::PowerShell,
    ];

    /// The wire protocol for this shell
    pub fn protocol(&self) -> &'static dyn ShellProtocol {
        match self {
            ShellKind::Bash => &Bash,
            ShellKind::Zsh => &Zsh,
            ShellKind::Tcsh => &Tcsh,
            ShellKind::Fish => &Fish,
            ShellKind::PowerShell => &PowerShell,
        }
    }

    /// Candidate separator used when `_ARGCOMP_IFS` is unset
    pub fn default_ifs(&self) -> &'static str {
        match self {
            ShellKind::Bash | ShellKind::Zsh => "\x0b",
            ShellKind::Tcsh | ShellKind::Fish | ShellKind::PowerShell => "\n",
        }
    }

    /// Description separator used when `_ARGCOMP_DFS` is unset
    pub fn default_dfs(&self) -> Option<&'static str> {
        match self {
            ShellKind::Zsh => Some(":"),
            ShellKind::Fish => Some("\t"),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::Tcsh => "tcsh",
            ShellKind::Fish => "fish",
            ShellKind::PowerShell => "powershell",
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShellKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bash" => Ok(ShellKind::Bash),
            "zsh" => Ok(ShellKind::Zsh),
            "tcsh" | "csh" => Ok(ShellKind::Tcsh),
            "fish" => Ok(ShellKind::Fish),
            "powershell" | "pwsh" => Ok(ShellKind::PowerShell),
            _ => Err(ProtocolError::UnknownShell(s.to_string())),
        }
    }
}

/// Where the response is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChannel {
    /// A descriptor opened by the shell hook
    Descriptor(i32),
    /// A file the shell reads back
    TempFile(PathBuf),
    /// The original standard output
    Stdout,
}

impl OutputChannel {
    /// Write the whole payload once, then flush and close the channel
    ///
    /// # Arguments
    /// * `bytes` - Encoded response
    /// * `stdout` - The original standard output, used by [`OutputChannel::Stdout`]
    pub fn write_payload(&self, bytes: &[u8], stdout: &mut dyn Write) -> Result<()> {
        match self {
            OutputChannel::Stdout => {
                stdout
                    .write_all(bytes)
                    .and_then(|_| stdout.flush())
                    .map_err(|e| ProtocolError::WriteFailed(e.to_string()))?;
            }
            OutputChannel::TempFile(path) => {
                let mut file = std::fs::File::create(path).map_err(|e| {
                    ProtocolError::ChannelUnavailable(format!("{}: {e}", path.display()))
                })?;
                file.write_all(bytes)
                    .and_then(|_| file.flush())
                    .map_err(|e| ProtocolError::WriteFailed(e.to_string()))?;
            }
            OutputChannel::Descriptor(fd) => write_descriptor(*fd, bytes)?,
        }
        Ok(())
    }
}

#[cfg(unix)]
fn write_descriptor(fd: i32, bytes: &[u8]) -> Result<()> {
    use std::fs::File;
    use std::os::unix::io::FromRawFd;

    // SAFETY: fcntl only queries the descriptor flags
    if unsafe { libc::fcntl(fd, libc::F_GETFD) } == -1 {
        return Err(ProtocolError::ChannelUnavailable(format!("descriptor {fd} is not open")).into());
    }
    // SAFETY: the descriptor is open and handed to us by the shell hook; the
    // File takes ownership and closes it when dropped
    let mut file = unsafe { File::from_raw_fd(fd) };
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| ProtocolError::WriteFailed(e.to_string()))?;
    Ok(())
}

#[cfg(not(unix))]
fn write_descriptor(fd: i32, _bytes: &[u8]) -> Result<()> {
    Err(ProtocolError::ChannelUnavailable(format!("descriptor {fd} on a non-unix platform")).into())
}

/// Read-only snapshot of one completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ShellContext {
    pub line: String,
    /// Cursor byte offset into `line`
    pub cursor: usize,
    pub kind: ShellKind,
    pub channel: OutputChannel,
    /// Candidate separator
    pub ifs: String,
    /// Description separator, `None` disables descriptions
    pub dfs: Option<String>,
    pub wordbreaks: String,
    /// The shell adds trailing spaces itself
    pub suppress_space: bool,
    pub debug: bool,
}

impl ShellContext {
    /// A request built by hand, answered on standard output with the
    /// shell's default separators
    pub fn local(kind: ShellKind, line: impl Into<String>, cursor: usize) -> Self {
        let line = line.into();
        let cursor = clamp_cursor(&line, cursor);
        Self {
            line,
            cursor,
            kind,
            channel: OutputChannel::Stdout,
            ifs: kind.default_ifs().to_string(),
            dfs: kind.default_dfs().map(str::to_string),
            wordbreaks: DEFAULT_WORDBREAKS.to_string(),
            suppress_space: false,
            debug: false,
        }
    }
}

/// Decode a completion request from the environment
///
/// Returns `None` when no request is present or any part of it is malformed;
/// the program then runs normally.
pub fn decode_request(env: &dyn Environment) -> Option<ShellContext> {
    let requested = env.var(ENV_REQUEST)?;
    if requested.is_empty() || requested == "0" {
        return None;
    }

    let kind = match env.var(ENV_SHELL).filter(|s| !s.is_empty()) {
        Some(name) => name.parse().ok()?,
        None => ShellKind::Bash,
    };

    let tcsh_line = match kind {
        ShellKind::Tcsh => env.var(ENV_TCSH_LINE),
        _ => None,
    };
    let (line, cursor) = match tcsh_line {
        Some(line) => {
            let cursor = line.len();
            (line, cursor)
        }
        None => {
            let line = env.var(ENV_LINE)?;
            let point: usize = env.var(ENV_POINT)?.trim().parse().ok()?;
            let cursor = clamp_cursor(&line, point);
            (line, cursor)
        }
    };

    let use_tempfile = env.var(ENV_USE_TEMPFILE).is_some_and(|v| is_truthy(&v));
    let channel = if use_tempfile || kind == ShellKind::PowerShell {
        OutputChannel::TempFile(PathBuf::from(
            env.var(ENV_STDOUT_FILENAME).filter(|s| !s.is_empty())?,
        ))
    } else if kind == ShellKind::Tcsh {
        OutputChannel::Stdout
    } else {
        let fd = match env.var(ENV_OUTPUT_FD) {
            Some(value) => value.trim().parse().ok()?,
            None => DEFAULT_OUTPUT_FD,
        };
        if fd < 0 {
            return None;
        }
        OutputChannel::Descriptor(fd)
    };

    Some(ShellContext {
        line,
        cursor,
        kind,
        channel,
        ifs: env
            .var(ENV_IFS)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| kind.default_ifs().to_string()),
        dfs: env
            .var(ENV_DFS)
            .filter(|s| !s.is_empty())
            .or_else(|| kind.default_dfs().map(str::to_string)),
        wordbreaks: env
            .var(ENV_WORDBREAKS)
            .unwrap_or_else(|| DEFAULT_WORDBREAKS.to_string()),
        suppress_space: env.var(ENV_SUPPRESS_SPACE).is_some_and(|v| v == "1"),
        debug: env.var(ENV_DEBUG).is_some_and(|v| is_truthy(&v)),
    })
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0"
}

/// One shell's response format
pub trait ShellProtocol: Send + Sync {
    fn kind(&self) -> ShellKind;

    /// Escape a value for the quoting state at the cursor
    fn escape(&self, value: &str, _quote: QuoteKind) -> String {
        value.to_string()
    }

    /// Render one candidate, description included where supported
    fn render(&self, _candidate: &CompletionCandidate, value: String, _ctx: &ShellContext) -> String {
        value
    }

    /// Whether the shell replaces only the text after the last word break
    fn strips_wordbreaks(&self) -> bool {
        false
    }

    /// Whether a finished candidate gets a trailing space from us
    fn appends_space(&self) -> bool {
        true
    }

    /// Whether a finished candidate closes an open quote
    fn closes_quotes(&self) -> bool {
        true
    }

    /// Appended after the joined candidates
    fn list_terminator(&self) -> &'static str {
        ""
    }

    /// Encode the outcome as the shell expects it
    fn encode(&self, outcome: &CompletionOutcome, ctx: &ShellContext) -> String {
        let strip = if self.strips_wordbreaks() && outcome.quote == QuoteKind::None {
            wordbreak_offset(&outcome.word_prefix, &ctx.wordbreaks)
        } else {
            0
        };

        let items: Vec<String> = outcome
            .candidates
            .iter()
            .map(|candidate| {
                let value = candidate.value.get(strip..).unwrap_or(&candidate.value);
                let mut value = self.escape(value, outcome.quote);
                if candidate.finished {
                    if let Some(close) = outcome.quote.closing_char() {
                        if self.closes_quotes() {
                            value.push(close);
                        }
                    }
                    if outcome.append_space && self.appends_space() && !ctx.suppress_space {
                        value.push(' ');
                    }
                }
                self.render(candidate, value, ctx)
            })
            .collect();

        let mut payload = items.join(&ctx.ifs);
        payload.push_str(self.list_terminator());
        payload
    }
}

/// Byte offset just past the last word-break character in `prefix`
///
/// Whitespace and quotes are never word breaks here: the tokenizer already
/// resolved them.
fn wordbreak_offset(prefix: &str, wordbreaks: &str) -> usize {
    prefix
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace() && *c != '"' && *c != '\'' && wordbreaks.contains(*c))
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}
