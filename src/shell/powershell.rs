//! PowerShell: newline-terminated list written to a temp file
//!
//! The registered script block reads the file back and builds
//! `CompletionResult` objects, adding spaces itself. The completion text is
//! inserted verbatim, so values are escaped with PowerShell's backtick.

use super::{ShellKind, ShellProtocol};
use crate::completion::QuoteKind;

/// Characters backtick-escaped outside of quotes
const UNQUOTED_SPECIALS: &str = " \t`$'\"(){};,|&@#<>";

/// Characters backtick-escaped inside double quotes
const DOUBLE_QUOTED_SPECIALS: &str = "`$\"";

#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShell;

impl ShellProtocol for PowerShell {
    fn kind(&self) -> ShellKind {
        ShellKind::PowerShell
    }

    fn escape(&self, value: &str, quote: QuoteKind) -> String {
        let mut escaped = String::with_capacity(value.len());
        for ch in value.chars() {
            match quote {
                QuoteKind::Single if ch == '\'' => escaped.push('\''),
                QuoteKind::Single => {}
                QuoteKind::Double if DOUBLE_QUOTED_SPECIALS.contains(ch) => escaped.push('`'),
                QuoteKind::None if UNQUOTED_SPECIALS.contains(ch) => escaped.push('`'),
                QuoteKind::Double | QuoteKind::None => {}
            }
            escaped.push(ch);
        }
        escaped
    }

    fn appends_space(&self) -> bool {
        false
    }

    fn list_terminator(&self) -> &'static str {
        "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionCandidate, CompletionOutcome};
    use crate::shell::{OutputChannel, ShellContext};
    use std::path::PathBuf;

    #[test]
    fn test_tempfile_payload() {
        let ctx = ShellContext {
            line: String::new(),
            cursor: 0,
            kind: ShellKind::PowerShell,
            channel: OutputChannel::TempFile(PathBuf::from("out.txt")),
            ifs: "\n".to_string(),
            dfs: None,
            wordbreaks: String::new(),
            suppress_space: false,
            debug: false,
        };
        let mut only = CompletionCandidate::value("status");
        only.finished = true;
        let outcome = CompletionOutcome {
            candidates: vec![only],
            append_space: true,
            ..CompletionOutcome::default()
        };
        assert_eq!(PowerShell.encode(&outcome, &ctx), "status\n");
    }

    #[test]
    fn test_escape_contexts() {
        assert_eq!(PowerShell.escape("my file", QuoteKind::None), "my` file");
        assert_eq!(PowerShell.escape("a`b$c", QuoteKind::None), "a``b`$c");
        assert_eq!(PowerShell.escape("it's", QuoteKind::Single), "it''s");
        assert_eq!(PowerShell.escape("say \"$x\"", QuoteKind::Double), "say `\"`$x`\"");
        assert_eq!(PowerShell.escape("plain-word.txt", QuoteKind::None), "plain-word.txt");
    }
}
