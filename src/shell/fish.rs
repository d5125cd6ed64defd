//! Fish: one `value<TAB>help` line per candidate
//!
//! Fish adds the trailing space itself.

use super::{ShellContext, ShellKind, ShellProtocol};
use crate::completion::CompletionCandidate;

#[derive(Debug, Clone, Copy, Default)]
pub struct Fish;

impl ShellProtocol for Fish {
    fn kind(&self) -> ShellKind {
        ShellKind::Fish
    }

    fn render(&self, candidate: &CompletionCandidate, value: String, ctx: &ShellContext) -> String {
        let dfs = ctx.dfs.as_deref().unwrap_or("\t");
        match candidate.description.as_deref() {
            Some(help) if !help.is_empty() => {
                format!("{value}{dfs}{}", help.replace('\n', " "))
            }
            _ => value,
        }
    }

    fn appends_space(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionOutcome;
    use crate::shell::OutputChannel;

    #[test]
    fn test_descriptions_and_no_space() {
        let ctx = ShellContext {
            line: String::new(),
            cursor: 0,
            kind: ShellKind::Fish,
            channel: OutputChannel::Descriptor(8),
            ifs: "\n".to_string(),
            dfs: Some("\t".to_string()),
            wordbreaks: String::new(),
            suppress_space: false,
            debug: false,
        };
        let mut only = CompletionCandidate::value("--verbose").description("More output");
        only.finished = true;
        let outcome = CompletionOutcome {
            candidates: vec![only],
            append_space: true,
            ..CompletionOutcome::default()
        };
        assert_eq!(Fish.encode(&outcome, &ctx), "--verbose\tMore output");
    }
}
