//! Parser tree walker
//!
//! Replays the words before the cursor against the spec tree, the way the
//! target program's argument parser would, and decides what the active word
//! is. The walker is error-tolerant: unknown flags are skipped, surplus
//! values are ignored, and it never fails.
//!
//! # Rules
//!
//! - word 0 is the program name
//! - a flag binds its action; value-taking actions become pending
//! - a pending action absorbs words until its minimum, then keeps absorbing
//!   non-flag words while its arity allows
//! - a sub-command name descends and resets per-scope state
//! - anything else fills positionals in declaration order

use std::collections::{BTreeMap, HashSet};

use super::context::CompletionContext;
use super::tokenizer::{QuoteKind, Token};
use crate::spec::{Action, CommandSpec};

/// Values parsed so far, keyed by action destination
pub type ParsedArgs = BTreeMap<String, Vec<String>>;

/// An action waiting for values
#[derive(Debug, Clone, Copy)]
pub struct PendingValue<'a> {
    pub action: &'a Action,
    /// Values consumed so far
    pub consumed: usize,
}

impl PendingValue<'_> {
    fn needs_value(&self) -> bool {
        self.consumed < self.action.arity.min()
    }
}

/// Result of walking the words before the cursor
#[derive(Debug, Clone)]
pub struct ParseState<'a> {
    /// Root of the tree
    pub root: &'a CommandSpec,
    /// Scope the cursor is in
    pub scope: &'a CommandSpec,
    /// Names of the commands descended through, root first
    pub command_path: Vec<String>,
    /// Indices into `scope.actions` of flags already given
    pub satisfied: HashSet<usize>,
    /// Action expecting a value
    pub pending: Option<PendingValue<'a>>,
    /// Index into the scope's positionals of the next slot to fill
    pub positional_cursor: usize,
    /// Values already given to the positional at `positional_cursor`
    pub positional_count: usize,
    pub parsed: ParsedArgs,
    /// Unquoted text of the active word up to the cursor
    pub prefix: String,
    /// `--flag=` part of an inline value being completed
    pub assignment: Option<String>,
    /// Quote open at the cursor
    pub quote: QuoteKind,
    /// Flag matching stopped by `--` or a terminator action
    pub after_terminator: bool,
    pub context: CompletionContext<'a>,
}

impl<'a> ParseState<'a> {
    fn new(root: &'a CommandSpec) -> Self {
        Self {
            root,
            scope: root,
            command_path: vec![root.name.clone()],
            satisfied: HashSet::new(),
            pending: None,
            positional_cursor: 0,
            positional_count: 0,
            parsed: ParsedArgs::new(),
            prefix: String::new(),
            assignment: None,
            quote: QuoteKind::None,
            after_terminator: false,
            context: CompletionContext::None,
        }
    }

    /// Whether the flag at `index` in the current scope was already given
    pub fn is_satisfied(&self, index: usize) -> bool {
        self.satisfied.contains(&index)
    }

    /// The positional that the next plain word would fill
    pub fn next_positional(&self) -> Option<&'a Action> {
        let scope = self.scope;
        let positionals = scope.positional_indices();
        let mut cursor = self.positional_cursor;
        let mut count = self.positional_count;
        while let Some(&index) = positionals.get(cursor) {
            let action = &scope.actions[index];
            if action.arity.accepts_more(count) {
                return Some(action);
            }
            cursor += 1;
            count = 0;
        }
        None
    }

    /* ------------------------------ consuming ------------------------------ */

    fn consume(&mut self, token: &Token) {
        let text = token.text.as_str();

        if let Some(mut pending) = self.pending.take() {
            let flag_like = !self.after_terminator && self.scope.is_flag_like(text);
            if pending.needs_value()
                || (!flag_like && pending.action.arity.accepts_more(pending.consumed))
            {
                self.record(pending.action, text);
                pending.consumed += 1;
                if pending.action.arity.accepts_more(pending.consumed) {
                    self.pending = Some(pending);
                }
                return;
            }
        }

        if !self.after_terminator {
            if text == "--" && self.scope.find_flag("--").is_none() {
                tracing::debug!("'--' stops flag matching");
                self.after_terminator = true;
                return;
            }
            if self.scope.is_flag_like(text) {
                self.close_variadic_positional();
                self.consume_flag(text);
                return;
            }
            if let Some(child) = self.scope.find_subcommand(text) {
                self.descend(child);
                return;
            }
        }

        self.fill_positional(text);
    }

    fn consume_flag(&mut self, text: &str) {
        let scope = self.scope;

        if let Some((index, action)) = scope.find_flag(text) {
            self.bind(index, action, None);
            return;
        }

        if let Some((name, value)) = text.split_once('=') {
            if let Some((index, action)) = scope.find_flag(name) {
                if action.arity.takes_value() {
                    self.bind(index, action, Some(value));
                    return;
                }
            }
        }

        if self.consume_short_cluster(text) {
            return;
        }

        tracing::debug!("Skipping unknown flag {:?} in {}", text, scope.name);
    }

    /// `-ovalue` and `-abc` style words
    fn consume_short_cluster(&mut self, text: &str) -> bool {
        let scope = self.scope;
        let mut chars = text.char_indices();
        let Some((_, prefix)) = chars.next() else {
            return false;
        };
        if text[prefix.len_utf8()..].starts_with(prefix) {
            return false;
        }

        let mut bound_any = false;
        for (offset, ch) in chars {
            let name = format!("{prefix}{ch}");
            let Some((index, action)) = scope.find_flag(&name) else {
                return bound_any;
            };
            let rest = &text[offset + ch.len_utf8()..];
            if action.arity.takes_value() {
                let inline = (!rest.is_empty()).then_some(rest);
                self.bind(index, action, inline);
                return true;
            }
            self.bind(index, action, None);
            bound_any = true;
        }
        bound_any
    }

    fn bind(&mut self, index: usize, action: &'a Action, inline: Option<&str>) {
        self.satisfied.insert(index);
        self.parsed.entry(action.dest()).or_default();
        if action.terminator {
            tracing::debug!("{} stops flag matching", action.display_name());
            self.after_terminator = true;
        }
        if !action.arity.takes_value() {
            return;
        }

        let mut pending = PendingValue {
            action,
            consumed: 0,
        };
        if let Some(value) = inline {
            self.record(action, value);
            pending.consumed = 1;
        }
        // an inline value only leaves the action open when more are required
        if pending.needs_value() || (inline.is_none() && action.arity.accepts_more(0)) {
            self.pending = Some(pending);
        }
    }

    fn descend(&mut self, child: &'a CommandSpec) {
        tracing::debug!("Descending into sub-command {}", child.name);
        self.scope = child;
        self.command_path.push(child.name.clone());
        self.satisfied.clear();
        self.pending = None;
        self.positional_cursor = 0;
        self.positional_count = 0;
    }

    fn fill_positional(&mut self, text: &str) {
        let scope = self.scope;
        let positionals = scope.positional_indices();
        while let Some(&index) = positionals.get(self.positional_cursor) {
            let action = &scope.actions[index];
            if action.arity.accepts_more(self.positional_count) {
                self.record(action, text);
                self.positional_count += 1;
                if !action.arity.accepts_more(self.positional_count) {
                    self.advance_positional();
                }
                return;
            }
            self.advance_positional();
        }
        tracing::debug!("No positional left for {:?} in {}", text, scope.name);
    }

    /// A flag closes a partially filled positional whose minimum is met
    fn close_variadic_positional(&mut self) {
        if self.positional_count == 0 {
            return;
        }
        let positionals = self.scope.positional_indices();
        if let Some(&index) = positionals.get(self.positional_cursor) {
            if self.positional_count >= self.scope.actions[index].arity.min() {
                self.advance_positional();
            }
        }
    }

    fn advance_positional(&mut self) {
        self.positional_cursor += 1;
        self.positional_count = 0;
    }

    fn record(&mut self, action: &Action, value: &str) {
        self.parsed
            .entry(action.dest())
            .or_default()
            .push(value.to_string());
    }

    /* ------------------------------ resolving ------------------------------ */

    fn resolve(&mut self, active: &Token) {
        self.prefix = active.prefix.clone();
        self.quote = active.quote;
        let scope = self.scope;

        let pending_needs_value = self.pending.is_some_and(|p| p.needs_value());
        if !self.after_terminator
            && !pending_needs_value
            && scope.starts_with_prefix_char(&self.prefix)
        {
            let prefix = self.prefix.clone();
            if let Some((name, value)) = prefix.split_once('=') {
                if let Some((_, action)) = scope.find_flag(name) {
                    if action.arity.takes_value() {
                        self.assignment = Some(format!("{name}="));
                        self.prefix = value.to_string();
                        self.context = CompletionContext::ActionValue(action);
                        return;
                    }
                }
            }
            // "-1" is still a value when a positional or pending action wants one
            if self.pending.is_none() || scope.is_flag_like(&self.prefix) || self.prefix.len() == 1
            {
                self.context = CompletionContext::FlagName;
                return;
            }
        }

        if let Some(pending) = self.pending {
            self.context = CompletionContext::ActionValue(pending.action);
            return;
        }

        self.context = CompletionContext::Positional {
            positional: self.next_positional(),
            subcommands: !self.after_terminator && !scope.subcommands.is_empty(),
        };
    }
}

/// Walks tokens against a spec tree
pub struct ParserTreeWalker<'a> {
    spec: &'a CommandSpec,
}

impl<'a> ParserTreeWalker<'a> {
    pub fn new(spec: &'a CommandSpec) -> Self {
        Self { spec }
    }

    /// Walk the words before the active one and resolve its context
    ///
    /// # Arguments
    /// * `tokens` - Output of the tokenizer, with one active token
    ///
    /// # Returns
    /// * `ParseState` - Scope, parsed values and completion context
    pub fn walk(&self, tokens: &[Token]) -> ParseState<'a> {
        let mut state = ParseState::new(self.spec);

        let Some(active_index) = tokens.iter().position(|t| t.active) else {
            return state;
        };
        let active = &tokens[active_index];
        if active_index == 0 {
            state.prefix = active.prefix.clone();
            state.quote = active.quote;
            return state;
        }

        for token in &tokens[1..active_index] {
            state.consume(token);
        }
        state.resolve(active);

        tracing::debug!(
            "Resolved {:?} in {} as {}",
            state.prefix,
            state.command_path.join(" "),
            state.context.label()
        );
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::tokenizer::ShellWordTokenizer;
    use crate::spec::Arity;

    fn spec() -> CommandSpec {
        CommandSpec::new("myprog")
            .action(Action::flag(["-v", "--verbose"]).repeatable(true))
            .action(Action::flag(["-q", "--quiet"]))
            .action(
                Action::flag(["-p", "--protocol"])
                    .arity(Arity::One)
                    .choices(["http", "https", "ssh"]),
            )
            .action(Action::flag(["--tags"]).arity(Arity::OneOrMore))
            .action(Action::flag(["-o", "--output"]).arity(Arity::One))
            .action(Action::flag(["--exec"]).arity(Arity::ZeroOrMore).terminator(true))
            .subcommand(
                CommandSpec::new("push")
                    .action(Action::flag(["--force"]))
                    .action(Action::positional("remote"))
                    .action(Action::positional("refs").arity(Arity::OneOrMore)),
            )
            .subcommand(CommandSpec::new("pull"))
    }

    fn walk<'a>(spec: &'a CommandSpec, line: &str) -> ParseState<'a> {
        let tokens = ShellWordTokenizer::tokenize(line, line.len());
        ParserTreeWalker::new(spec).walk(&tokens)
    }

    fn value_of<'a>(state: &ParseState<'a>) -> &'a Action {
        match state.context {
            CompletionContext::ActionValue(action) => action,
            other => panic!("Expected ActionValue, got {other:?}"),
        }
    }

    #[test]
    fn test_program_name_has_no_context() {
        let spec = spec();
        assert!(walk(&spec, "myp").context.is_none());
    }

    #[test]
    fn test_flag_name_context() {
        let spec = spec();
        let state = walk(&spec, "myprog --prot");
        assert_eq!(state.context, CompletionContext::FlagName);
        assert_eq!(state.prefix, "--prot");
    }

    #[test]
    fn test_pending_value_context() {
        let spec = spec();
        let state = walk(&spec, "myprog --protocol h");
        assert!(value_of(&state).matches("--protocol"));
        assert_eq!(state.prefix, "h");
        assert!(state.is_satisfied(2));
    }

    #[test]
    fn test_required_value_wins_over_dash() {
        let spec = spec();
        let state = walk(&spec, "myprog --output -");
        assert!(value_of(&state).matches("--output"));
    }

    #[test]
    fn test_inline_assignment() {
        let spec = spec();
        let state = walk(&spec, "myprog --protocol=ht");
        assert!(value_of(&state).matches("--protocol"));
        assert_eq!(state.assignment.as_deref(), Some("--protocol="));
        assert_eq!(state.prefix, "ht");
    }

    #[test]
    fn test_inline_and_attached_values_are_bound() {
        let spec = spec();
        let state = walk(&spec, "myprog --protocol=ssh -ofile.txt -vq ");
        assert_eq!(state.parsed["protocol"], vec!["ssh"]);
        assert_eq!(state.parsed["output"], vec!["file.txt"]);
        assert!(state.parsed.contains_key("verbose"));
        assert!(state.parsed.contains_key("quiet"));
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_subcommand_descends_and_resets() {
        let spec = spec();
        let state = walk(&spec, "myprog -v push ");
        assert_eq!(state.scope.name, "push");
        assert_eq!(state.command_path, vec!["myprog", "push"]);
        assert!(state.satisfied.is_empty());
        match state.context {
            CompletionContext::Positional {
                positional: Some(action),
                subcommands,
            } => {
                assert_eq!(action.dest(), "remote");
                assert!(!subcommands);
            }
            other => panic!("Expected Positional, got {other:?}"),
        }
    }

    #[test]
    fn test_root_positional_context_offers_subcommands() {
        let spec = spec();
        let state = walk(&spec, "myprog pu");
        assert_eq!(
            state.context,
            CompletionContext::Positional {
                positional: None,
                subcommands: true
            }
        );
    }

    #[test]
    fn test_variadic_flag_absorbs_until_flag() {
        let spec = spec();
        let state = walk(&spec, "myprog --tags a b ");
        assert!(value_of(&state).matches("--tags"));
        assert_eq!(state.parsed["tags"], vec!["a", "b"]);

        let state = walk(&spec, "myprog --tags a --");
        assert_eq!(state.context, CompletionContext::FlagName);
    }

    #[test]
    fn test_positionals_fill_in_order() {
        let spec = spec();
        let state = walk(&spec, "myprog push origin main dev ");
        assert_eq!(state.parsed["remote"], vec!["origin"]);
        assert_eq!(state.parsed["refs"], vec!["main", "dev"]);
        assert_eq!(state.next_positional().map(|a| a.dest()), Some("refs".into()));
    }

    #[test]
    fn test_flag_closes_variadic_positional() {
        let spec = spec();
        let state = walk(&spec, "myprog push origin main --force ");
        assert!(state.next_positional().is_none());
    }

    #[test]
    fn test_double_dash_stops_flags() {
        let spec = spec();
        let state = walk(&spec, "myprog push -- --fo");
        assert!(state.after_terminator);
        assert!(matches!(state.context, CompletionContext::Positional { .. }));
    }

    #[test]
    fn test_terminator_action() {
        let spec = spec();
        let state = walk(&spec, "myprog --exec ls -");
        assert!(state.after_terminator);
        assert!(value_of(&state).matches("--exec"));
    }

    #[test]
    fn test_unknown_flags_skipped() {
        let spec = spec();
        let state = walk(&spec, "myprog --bogus -Z pu");
        assert!(matches!(
            state.context,
            CompletionContext::Positional {
                subcommands: true,
                ..
            }
        ));
    }

    #[test]
    fn test_negative_number_is_value() {
        let spec = CommandSpec::new("calc")
            .action(Action::flag(["--offset"]).arity(Arity::OneOrMore))
            .action(Action::positional("n"));
        let state = walk(&spec, "calc --offset -1 -2");
        assert_eq!(state.parsed["offset"], vec!["-1"]);
        assert!(value_of(&state).matches("--offset"));
    }
}
