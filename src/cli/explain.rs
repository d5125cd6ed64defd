//! `argcomp explain` - run the completion pipeline without a shell
//!
//! Shows each stage for one line: the words the tokenizer produced, the
//! context the walker resolved, the candidates the engine returned and the
//! exact payload the shell would receive.

use nu_ansi_term::{Color as AnsiColor, Style as AnsiStyle};
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Color, Modify, Style, object::Columns, object::Rows, width::Width},
};

use crate::completion::{
    CandidateKind, CompletionEngine, CompletionOutcome, ParserTreeWalker, QuoteKind,
    ShellWordTokenizer, Token,
};
use crate::shell::ShellContext;
use crate::spec::CommandSpec;

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 48;

/// Everything the pipeline produced for one line
#[derive(Debug, Clone)]
pub struct Explanation {
    pub tokens: Vec<Token>,
    /// Names of the commands the cursor is nested in, root first
    pub command_path: Vec<String>,
    pub context: String,
    pub outcome: CompletionOutcome,
    /// Encoded response for the request's shell
    pub payload: String,
}

/// Run every stage for a hand-built request
///
/// # Arguments
/// * `spec` - Root of the spec tree
/// * `engine` - Configured completion engine
/// * `ctx` - Line, cursor and shell to explain
pub fn explain(spec: &CommandSpec, engine: &CompletionEngine, ctx: &ShellContext) -> Explanation {
    let tokens = ShellWordTokenizer::tokenize(&ctx.line, ctx.cursor);
    let state = ParserTreeWalker::new(spec).walk(&tokens);
    let outcome = engine.complete(&state);
    let payload = ctx.kind.protocol().encode(&outcome, ctx);

    Explanation {
        command_path: state.command_path.clone(),
        context: state.context.label(),
        tokens,
        outcome,
        payload,
    }
}

/// Renders an [`Explanation`] as sections of tables
pub struct ExplainFormatter {
    max_column_width: usize,
    use_colors: bool,
}

impl ExplainFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            use_colors,
        }
    }

    /// Format all sections
    pub fn format(&self, explanation: &Explanation) -> String {
        let mut out = String::new();

        out.push_str(&self.heading("Tokens"));
        out.push_str(&self.tokens_table(&explanation.tokens));
        out.push_str("\n\n");

        out.push_str(&self.heading("Context"));
        out.push_str(&format!("scope:   {}\n", explanation.command_path.join(" ")));
        out.push_str(&format!("context: {}\n", explanation.context));
        out.push_str(&format!(
            "prefix:  {:?}\n\n",
            explanation.outcome.word_prefix
        ));

        out.push_str(&self.heading("Candidates"));
        if explanation.outcome.candidates.is_empty() {
            out.push_str("(no candidates)");
        } else {
            out.push_str(&self.candidates_table(&explanation.outcome));
        }
        out.push_str("\n\n");

        if !explanation.outcome.warnings.is_empty() {
            out.push_str(&self.heading("Warnings"));
            for warning in &explanation.outcome.warnings {
                let line = if self.use_colors {
                    AnsiColor::Yellow.paint(warning.as_str()).to_string()
                } else {
                    warning.clone()
                };
                out.push_str(&line);
                out.push('\n');
            }
            out.push('\n');
        }

        out.push_str(&self.heading("Payload"));
        out.push_str(&explanation.payload.escape_debug().to_string());
        out.push('\n');
        out
    }

    fn heading(&self, title: &str) -> String {
        if self.use_colors {
            format!("{}\n", AnsiStyle::new().bold().fg(AnsiColor::Cyan).paint(title))
        } else {
            format!("{title}\n")
        }
    }

    fn tokens_table(&self, tokens: &[Token]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["#", "text", "span", "active", "quote", "prefix"].map(String::from));
        for (index, token) in tokens.iter().enumerate() {
            builder.push_record([
                index.to_string(),
                format!("{:?}", token.text),
                format!("{}..{}", token.span.start, token.span.end),
                if token.active { "yes" } else { "" }.to_string(),
                quote_label(token.quote).to_string(),
                if token.active {
                    format!("{:?}", token.prefix)
                } else {
                    String::new()
                },
            ]);
        }
        self.finish(builder.build(), 6)
    }

    fn candidates_table(&self, outcome: &CompletionOutcome) -> String {
        let mut builder = Builder::default();
        builder.push_record(["value", "kind", "finished", "description"].map(String::from));
        for candidate in &outcome.candidates {
            builder.push_record([
                candidate.value.clone(),
                kind_label(candidate.kind).to_string(),
                if candidate.finished { "yes" } else { "" }.to_string(),
                candidate.description.clone().unwrap_or_default(),
            ]);
        }
        self.finish(builder.build(), 4)
    }

    fn finish(&self, mut table: Table, columns: usize) -> String {
        table.with(Style::rounded());
        for i in 0..columns {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));
        if self.use_colors {
            table.modify(Rows::first(), Color::FG_CYAN | Color::BOLD);
        }
        table.to_string()
    }
}

impl Default for ExplainFormatter {
    fn default() -> Self {
        Self::new(false)
    }
}

fn quote_label(quote: QuoteKind) -> &'static str {
    match quote {
        QuoteKind::None => "",
        QuoteKind::Single => "'",
        QuoteKind::Double => "\"",
    }
}

fn kind_label(kind: CandidateKind) -> &'static str {
    match kind {
        CandidateKind::Value => "value",
        CandidateKind::File => "file",
        CandidateKind::Directory => "dir",
    }
}
