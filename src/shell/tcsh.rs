//! Tcsh: newline-terminated list on standard output, no escaping

use super::{ShellKind, ShellProtocol};

#[derive(Debug, Clone, Copy, Default)]
pub struct Tcsh;

impl ShellProtocol for Tcsh {
    fn kind(&self) -> ShellKind {
        ShellKind::Tcsh
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

    #[test]
    fn test_newline_list() {
        let ctx = ShellContext {
            line: String::new(),
            cursor: 0,
            kind: ShellKind::Tcsh,
            channel: OutputChannel::Stdout,
            ifs: "\n".to_string(),
            dfs: None,
            wordbreaks: String::new(),
            suppress_space: false,
            debug: false,
        };
        let outcome = CompletionOutcome {
            candidates: vec!["a b".into(), "c".into()],
            append_space: true,
            ..CompletionOutcome::default()
        };
        assert_eq!(Tcsh.encode(&outcome, &ctx), "a b\nc\n");
    }
}
