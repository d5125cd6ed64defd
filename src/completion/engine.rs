//! Completion engine - orchestrates the completion flow
//!
//! Given a resolved [`ParseState`], the engine fetches candidates from the
//! right source, filters them against the typed prefix, removes duplicates,
//! orders them and marks a sole final candidate as finished.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::candidate::CompletionCandidate;
use super::completers::{
    ChoicesCompleter, Completer, CompletionRequest, DirectoriesCompleter, EnvironCompleter,
    FilesCompleter,
};
use super::context::CompletionContext;
use super::tokenizer::{QuoteKind, ShellWordTokenizer};
use super::walker::{ParseState, ParserTreeWalker};
use crate::config::{CandidateOrder, CompletionConfig, OptionCompletion, SubcommandPolicy};
use crate::error::CompleterError;
use crate::spec::{Action, CommandSpec, ValueHint};

/// Custom match check, `(candidate, prefix) -> keep`
pub type Validator = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Everything produced for one request
#[derive(Debug, Clone, Default)]
pub struct CompletionOutcome {
    /// Filtered, de-duplicated, ordered candidates
    pub candidates: Vec<CompletionCandidate>,
    /// Completer failures, shown to the user apart from the candidates
    pub warnings: Vec<String>,
    /// Unquoted active word up to the cursor, assignment included
    pub word_prefix: String,
    /// Quote open at the cursor
    pub quote: QuoteKind,
    /// Whether a finished candidate gets a trailing space
    pub append_space: bool,
}

impl CompletionOutcome {
    /// Candidate values in order
    pub fn values(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.value.as_str()).collect()
    }
}

/// Main completion engine
#[derive(Clone, Default)]
pub struct CompletionEngine {
    config: CompletionConfig,
    validator: Option<Validator>,
}

impl CompletionEngine {
    /// Create a new completion engine
    ///
    /// # Arguments
    /// * `config` - Completion behavior settings
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            config,
            validator: None,
        }
    }

    /// Replace prefix matching with a custom check for every candidate
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub(crate) fn with_shared_validator(mut self, validator: Option<Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Tokenize, walk and complete a raw line
    ///
    /// # Arguments
    /// * `spec` - Root of the spec tree
    /// * `line` - Raw command line
    /// * `cursor` - Cursor byte offset
    pub fn complete_line(&self, spec: &CommandSpec, line: &str, cursor: usize) -> CompletionOutcome {
        let tokens = ShellWordTokenizer::tokenize(line, cursor);
        let state = ParserTreeWalker::new(spec).walk(&tokens);
        self.complete(&state)
    }

    /// Produce candidates for a walked state
    pub fn complete(&self, state: &ParseState<'_>) -> CompletionOutcome {
        let mut warnings = Vec::new();

        let mut candidates = match state.context {
            CompletionContext::None => Vec::new(),
            CompletionContext::FlagName => self.flag_candidates(state, None),
            CompletionContext::ActionValue(action) => {
                self.value_candidates(action, state, &mut warnings)
            }
            CompletionContext::Positional {
                positional,
                subcommands,
            } => self.positional_candidates(state, positional, subcommands, &mut warnings),
        };

        candidates.retain(|c| self.accepts(&c.value, &state.prefix));
        dedupe(&mut candidates);
        if self.config.order == CandidateOrder::Ranked {
            rank(&mut candidates, &state.prefix);
        }

        let assignment = state.assignment.as_deref().unwrap_or_default();
        if !assignment.is_empty() {
            for candidate in &mut candidates {
                candidate.value.insert_str(0, assignment);
            }
        }

        if let [only] = candidates.as_mut_slice() {
            only.finished = !only.continues();
        }

        tracing::debug!(
            "{} candidates for {:?} ({})",
            candidates.len(),
            state.prefix,
            state.context.label()
        );

        CompletionOutcome {
            candidates,
            warnings,
            word_prefix: format!("{assignment}{}", state.prefix),
            quote: state.quote,
            append_space: self.config.append_space,
        }
    }

    fn accepts(&self, candidate: &str, prefix: &str) -> bool {
        match &self.validator {
            Some(validator) => validator(candidate, prefix),
            None => candidate.starts_with(prefix),
        }
    }

    /// Flag names of the current scope
    ///
    /// `only` restricts the names further (used when flags are added to a
    /// positional context).
    fn flag_candidates(
        &self,
        state: &ParseState<'_>,
        only: Option<OptionCompletion>,
    ) -> Vec<CompletionCandidate> {
        let mut candidates = Vec::new();
        for (index, action) in state.scope.flags() {
            if state.is_satisfied(index) && !action.repeatable {
                continue;
            }
            if action.hidden && !self.config.print_hidden {
                continue;
            }
            for name in &action.names {
                if !self.config.allows_flag(name) || only.is_some_and(|o| !o.admits(name)) {
                    continue;
                }
                let mut candidate = CompletionCandidate::value(name.as_str());
                candidate.description = action.help.clone();
                candidates.push(candidate);
            }
        }
        candidates
    }

    fn positional_candidates(
        &self,
        state: &ParseState<'_>,
        positional: Option<&Action>,
        subcommands: bool,
        warnings: &mut Vec<String>,
    ) -> Vec<CompletionCandidate> {
        let mut candidates: Vec<CompletionCandidate> = Vec::new();
        if subcommands {
            for child in &state.scope.subcommands {
                for name in std::iter::once(&child.name).chain(child.aliases.iter()) {
                    let mut candidate = CompletionCandidate::value(name.as_str());
                    candidate.description = child.help.clone();
                    candidates.push(candidate);
                }
            }
        }

        let subcommand_matched = candidates
            .iter()
            .any(|c| self.accepts(&c.value, &state.prefix));
        let skip_values = subcommand_matched
            && self.config.subcommand_policy == SubcommandPolicy::PreferSubcommands;
        if let Some(action) = positional {
            if !skip_values {
                candidates.extend(self.value_candidates(action, state, warnings));
            }
        }

        let options = self.config.always_complete_options;
        if options != OptionCompletion::Never && !state.after_terminator {
            candidates.extend(self.flag_candidates(state, Some(options)));
        }
        candidates
    }

    /// Values for one action: completer, else choices, else value hint
    fn value_candidates(
        &self,
        action: &Action,
        state: &ParseState<'_>,
        warnings: &mut Vec<String>,
    ) -> Vec<CompletionCandidate> {
        let request = CompletionRequest {
            prefix: &state.prefix,
            action,
            command: state.scope,
            parsed: &state.parsed,
        };

        if let Some(completer) = &action.completer {
            return run_completer(completer.as_ref(), &request, warnings);
        }
        if !action.choices.is_empty() {
            let choices = ChoicesCompleter::new(action.choices.iter().cloned());
            return run_completer(&choices, &request, warnings);
        }
        match action.value_hint {
            ValueHint::Any | ValueHint::FilePath => {
                run_completer(&FilesCompleter::new(), &request, warnings)
            }
            ValueHint::DirPath => run_completer(&DirectoriesCompleter::new(), &request, warnings),
            ValueHint::EnvVar => run_completer(&EnvironCompleter, &request, warnings),
            ValueHint::Nothing => Vec::new(),
        }
    }
}

/// Invoke a completer, turning errors and panics into warnings
fn run_completer(
    completer: &dyn Completer,
    request: &CompletionRequest<'_>,
    warnings: &mut Vec<String>,
) -> Vec<CompletionCandidate> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| completer.complete(request)));
    let err = match result {
        Ok(Ok(candidates)) => return candidates,
        Ok(Err(err)) => err,
        Err(payload) => CompleterError::Panicked {
            completer: completer.name().to_string(),
            message: panic_message(payload.as_ref()),
        },
    };
    tracing::warn!("{}", err);
    warnings.push(err.to_string());
    Vec::new()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Drop repeated values, keeping the first occurrence
fn dedupe(candidates: &mut Vec<CompletionCandidate>) {
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.value.clone()));
}

/// Exact match first, then shorter values, then alphabetical
fn rank(candidates: &mut [CompletionCandidate], prefix: &str) {
    candidates.sort_by(|a, b| {
        if !prefix.is_empty() {
            let a_exact = a.value == prefix;
            let b_exact = b.value == prefix;
            if a_exact != b_exact {
                return b_exact.cmp(&a_exact);
            }
        }
        a.value
            .len()
            .cmp(&b.value.len())
            .then_with(|| a.value.cmp(&b.value))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(values: &[&str]) -> Vec<CompletionCandidate> {
        values.iter().map(|v| CompletionCandidate::from(*v)).collect()
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let mut list = candidates(&["b", "a", "b", "c", "a"]);
        dedupe(&mut list);
        let values: Vec<_> = list.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_rank_exact_then_length_then_alpha() {
        let mut list = candidates(&["tag_spare_shadow", "tag_spare", "tag", "tag_b", "tag_a"]);
        rank(&mut list, "tag");
        let values: Vec<_> = list.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["tag", "tag_a", "tag_b", "tag_spare", "tag_spare_shadow"]
        );
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
