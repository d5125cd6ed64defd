//! Execution interceptor
//!
//! A completing program calls [`Interceptor::intercept`] first thing in
//! `main`. Outside of a completion request it returns immediately and the
//! program runs normally. Inside one, it answers the shell and terminates the
//! process without running anything else:
//!
//! 1. standard output and error are pointed at `/dev/null` (the originals are
//!    kept for the response and for warnings)
//! 2. the line is completed against the spec tree
//! 3. completer warnings go to the original standard error
//! 4. the response is written to the shell's channel
//! 5. the process exits with status 0, skipping destructors and exit hooks
//!
//! # Example
//!
//! ```no_run
//! use argcomp::interceptor::Interceptor;
//! use argcomp::spec::{Action, Arity, CommandSpec};
//!
//! let spec = CommandSpec::new("myprog")
//!     .action(Action::flag(["--protocol"]).arity(Arity::One).choices(["http", "https"]));
//!
//! Interceptor::new(&spec).intercept();
//! // normal program flow continues here when not completing
//! ```

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::completion::{CompletionEngine, CompletionOutcome, Validator};
use crate::config::CompletionConfig;
use crate::error::Result;
use crate::shell::{Environment, ProcessEnv, ShellContext, decode_request};
use crate::spec::CommandSpec;

/// Whether the process is answering a completion request
#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle {
    /// Normal execution
    Idle,
    /// Answering the given request
    Completing(ShellContext),
}

/// Entry point for completing programs
pub struct Interceptor<'a> {
    spec: &'a CommandSpec,
    config: CompletionConfig,
    validator: Option<Validator>,
}

impl<'a> Interceptor<'a> {
    /// Create an interceptor with the default configuration
    pub fn new(spec: &'a CommandSpec) -> Self {
        Self {
            spec,
            config: CompletionConfig::default(),
            validator: None,
        }
    }

    pub fn with_config(mut self, config: CompletionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace prefix matching with a custom `(candidate, prefix)` check
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Decide the lifecycle from the environment
    pub fn detect(&self, env: &dyn Environment) -> Lifecycle {
        match decode_request(env) {
            Some(ctx) => Lifecycle::Completing(ctx),
            None => Lifecycle::Idle,
        }
    }

    /// Run the completion pipeline for a decoded request
    pub fn complete_request(&self, ctx: &ShellContext) -> CompletionOutcome {
        CompletionEngine::new(self.config.clone())
            .with_shared_validator(self.validator.clone())
            .complete_line(self.spec, &ctx.line, ctx.cursor)
    }

    /// Encode the outcome for the request's shell and write it once
    ///
    /// # Arguments
    /// * `ctx` - The decoded request
    /// * `outcome` - Candidates to send
    /// * `stdout` - The original standard output
    pub fn respond(
        &self,
        ctx: &ShellContext,
        outcome: &CompletionOutcome,
        stdout: &mut dyn Write,
    ) -> Result<()> {
        let payload = ctx.kind.protocol().encode(outcome, ctx);
        tracing::debug!("Sending {} candidates to {}", outcome.candidates.len(), ctx.kind);
        ctx.channel.write_payload(payload.as_bytes(), stdout)
    }

    /// Answer a pending completion request and exit, or return
    ///
    /// Returns only when the environment carries no completion request.
    pub fn intercept(&self) {
        let ctx = match self.detect(&ProcessEnv) {
            Lifecycle::Idle => return,
            Lifecycle::Completing(ctx) => ctx,
        };

        match SavedStdio::suppress(ctx.debug) {
            Ok(saved) => {
                if ctx.debug {
                    if let Ok(writer) = saved.stderr.try_clone() {
                        init_debug_logging(Mutex::new(writer));
                    }
                }
                let SavedStdio {
                    mut stdout,
                    mut stderr,
                } = saved;
                self.finish(&ctx, &mut stdout, &mut stderr)
            }
            Err(e) => {
                if ctx.debug {
                    init_debug_logging(io::stderr);
                }
                tracing::warn!("Could not redirect standard streams: {}", e);
                self.finish(&ctx, &mut io::stdout(), &mut io::stderr())
            }
        }
    }

    fn finish(&self, ctx: &ShellContext, stdout: &mut dyn Write, stderr: &mut dyn Write) -> ! {
        tracing::debug!("Completing {:?} at {} for {}", ctx.line, ctx.cursor, ctx.kind);
        let outcome = self.complete_request(ctx);

        for warning in &outcome.warnings {
            let _ = write!(stderr, "\n{warning}");
        }
        let _ = stderr.flush();

        if let Err(e) = self.respond(ctx, &outcome, stdout) {
            tracing::error!("Failed to send completions: {}", e);
        }
        terminate()
    }
}

/// Install a subscriber writing to the original standard error
fn init_debug_logging<W>(writer: W)
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .without_time()
        .with_writer(writer)
        .try_init();
}

/// Exit immediately with status 0
#[cfg(unix)]
fn terminate() -> ! {
    // SAFETY: _exit never returns and touches no Rust state
    unsafe { libc::_exit(0) }
}

#[cfg(not(unix))]
fn terminate() -> ! {
    std::process::exit(0)
}

/// The original standard streams, saved before redirection
struct SavedStdio {
    stdout: std::fs::File,
    stderr: std::fs::File,
}

impl SavedStdio {
    /// Duplicate fds 1 and 2, then point them at `/dev/null`
    ///
    /// Standard error stays attached when `keep_stderr` is set.
    #[cfg(unix)]
    fn suppress(keep_stderr: bool) -> io::Result<Self> {
        use std::fs::{File, OpenOptions};
        use std::os::unix::io::{AsRawFd, FromRawFd};

        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        let saved_out = dup(libc::STDOUT_FILENO)?;
        // SAFETY: saved_out is a fresh descriptor we own
        let stdout = unsafe { File::from_raw_fd(saved_out) };
        let saved_err = dup(libc::STDERR_FILENO)?;
        // SAFETY: as above
        let stderr = unsafe { File::from_raw_fd(saved_err) };

        let devnull = OpenOptions::new().write(true).open("/dev/null")?;
        dup2(devnull.as_raw_fd(), libc::STDOUT_FILENO)?;
        if !keep_stderr {
            dup2(devnull.as_raw_fd(), libc::STDERR_FILENO)?;
        }

        Ok(Self { stdout, stderr })
    }

    #[cfg(not(unix))]
    fn suppress(_keep_stderr: bool) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream redirection needs a unix platform",
        ))
    }
}

#[cfg(unix)]
fn dup(fd: libc::c_int) -> io::Result<libc::c_int> {
    // SAFETY: dup only reads the descriptor table
    let copy = unsafe { libc::dup(fd) };
    if copy == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(copy)
    }
}

#[cfg(unix)]
fn dup2(from: libc::c_int, to: libc::c_int) -> io::Result<()> {
    // SAFETY: both descriptors are valid for the duration of the call
    if unsafe { libc::dup2(from, to) } == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
