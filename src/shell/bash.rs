//! Bash: vertical-tab separated candidates on descriptor 8
//!
//! Bash replaces only the text after the last `COMP_WORDBREAKS` character of
//! the current word, so that part is cut from every candidate. Values are
//! backslash-escaped for the quoting state at the cursor.

use super::{ShellKind, ShellProtocol};
use crate::completion::QuoteKind;

/// Characters escaped outside of quotes
const UNQUOTED_SPECIALS: &str = "\\();<>|&!`$* \t\n\"'";

/// Characters escaped inside double quotes
const DOUBLE_QUOTED_SPECIALS: &str = "\\`$\"!";

#[derive(Debug, Clone, Copy, Default)]
pub struct Bash;

impl ShellProtocol for Bash {
    fn kind(&self) -> ShellKind {
        ShellKind::Bash
    }

    fn escape(&self, value: &str, quote: QuoteKind) -> String {
        escape_posix(value, quote)
    }

    fn strips_wordbreaks(&self) -> bool {
        true
    }
}

/// Escape `value` so a POSIX shell reads it back unchanged
fn escape_posix(value: &str, quote: QuoteKind) -> String {
    let mut escaped = String::with_capacity(value.len());
    match quote {
        QuoteKind::None | QuoteKind::Double => {
            let specials = if quote == QuoteKind::None {
                UNQUOTED_SPECIALS
            } else {
                DOUBLE_QUOTED_SPECIALS
            };
            for ch in value.chars() {
                if specials.contains(ch) {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
        }
        // close, escaped quote, reopen
        QuoteKind::Single => {
            for ch in value.chars() {
                if ch == '\'' {
                    escaped.push_str("'\\''");
                } else {
                    escaped.push(ch);
                }
            }
        }
    }
    escaped
}
