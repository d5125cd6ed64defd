//! Error handling for argcomp.
//!
//! Errors are only ever surfaced by the non-completion entry points (loading
//! a spec or a config file, the `argcomp` binary). On the completion path
//! every failure degrades to an empty candidate list:
//! - completer failures become warnings on a side channel
//! - decode failures mean "not a completion request"
//! - encode failures are logged and swallowed before the process exits
//!
//! # Example
//!
//! ```rust
//! use argcomp::error::{ArgcompError, ConfigError, Result};
//!
//! fn check(depth: usize) -> Result<()> {
//!     if depth == 0 {
//!         return Err(ConfigError::InvalidValue {
//!             field: "depth".to_string(),
//!             value: depth.to_string(),
//!         }
//!         .into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(matches!(check(0), Err(ArgcompError::Config(_))));
//! ```

pub mod kinds;

pub use kinds::{
    ArgcompError, CompleterError, ConfigError, ProtocolError, Result, SpecError,
};
