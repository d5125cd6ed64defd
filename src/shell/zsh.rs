//! Zsh: raw values with optional `value<DFS>help` descriptions
//!
//! The zsh hook feeds candidates to `_describe`, which splits on `:`, so a
//! literal colon in a value is escaped whenever descriptions are enabled.
//! `compadd` quotes metacharacters, closes open quotes and adds the trailing
//! space on its own, so values go out unescaped and unterminated.

use super::{ShellContext, ShellKind, ShellProtocol};
use crate::completion::CompletionCandidate;

#[derive(Debug, Clone, Copy, Default)]
pub struct Zsh;

impl ShellProtocol for Zsh {
    fn kind(&self) -> ShellKind {
        ShellKind::Zsh
    }

    fn render(&self, candidate: &CompletionCandidate, value: String, ctx: &ShellContext) -> String {
        let Some(dfs) = ctx.dfs.as_deref() else {
            return value;
        };
        let value = value.replace(':', "\\:");
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

    fn closes_quotes(&self) -> bool {
        false
    }
}
