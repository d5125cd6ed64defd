//! Shell word tokenizer for completion
//!
//! Splits a raw, possibly unfinished command line into words the way a POSIX
//! shell would, and records the quoting state at the cursor so the response
//! can be escaped and closed correctly.
//!
//! # Design Principles
//!
//! - **Never fail** - any input produces a token list
//! - **Unterminated quotes stay open** - the word is kept with its quote
//! - **Byte spans** - spans index into the raw line
//! - **Exactly one active token** - a synthetic empty token is inserted when
//!   the cursor sits on whitespace

use std::ops::Range;

/// Quote open at a given position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteKind {
    #[default]
    None,
    Single,
    Double,
}

impl QuoteKind {
    /// The closing character, if a quote is open
    pub fn closing_char(&self) -> Option<char> {
        match self {
            QuoteKind::None => None,
            QuoteKind::Single => Some('\''),
            QuoteKind::Double => Some('"'),
        }
    }
}

/// One shell word
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Unquoted, unescaped text
    pub text: String,
    /// Byte range in the raw line
    pub span: Range<usize>,
    /// Whether the cursor is inside or at the end of this word
    pub active: bool,
    /// Quote open at the cursor (active token) or at end of line
    pub quote: QuoteKind,
    /// Unquoted text up to the cursor, empty for inactive tokens
    pub prefix: String,
}

impl Token {
    fn synthetic(cursor: usize) -> Self {
        Self {
            text: String::new(),
            span: cursor..cursor,
            active: true,
            quote: QuoteKind::None,
            prefix: String::new(),
        }
    }
}

/// Word under construction
struct WordBuilder {
    start: usize,
    text: String,
    snapshot: Option<(String, QuoteKind)>,
}

impl WordBuilder {
    fn new(start: usize) -> Self {
        Self {
            start,
            text: String::new(),
            snapshot: None,
        }
    }

    fn finish(self, end: usize, open_quote: QuoteKind) -> Token {
        match self.snapshot {
            Some((prefix, quote)) => Token {
                text: self.text,
                span: self.start..end,
                active: true,
                quote,
                prefix,
            },
            None => Token {
                text: self.text,
                span: self.start..end,
                active: false,
                quote: open_quote,
                prefix: String::new(),
            },
        }
    }
}

/// Error-tolerant shell word splitter
pub struct ShellWordTokenizer {
    input: Vec<(usize, char)>,
    len: usize,
    cursor: usize,
    pos: usize,
    quote: QuoteKind,
    word: Option<WordBuilder>,
    tokens: Vec<Token>,
}

impl ShellWordTokenizer {
    fn new(line: &str, cursor: usize) -> Self {
        Self {
            input: line.char_indices().collect(),
            len: line.len(),
            cursor: clamp_cursor(line, cursor),
            pos: 0,
            quote: QuoteKind::None,
            word: None,
            tokens: Vec::new(),
        }
    }

    /// Tokenize `line` with the cursor at byte offset `cursor`
    ///
    /// # Arguments
    /// * `line` - Raw command line
    /// * `cursor` - Cursor byte offset, clamped and floored to a char boundary
    ///
    /// # Returns
    /// * `Vec<Token>` - Words in order, exactly one of them active
    pub fn tokenize(line: &str, cursor: usize) -> Vec<Token> {
        let mut lexer = Self::new(line, cursor);
        lexer.run();

        let cursor = lexer.cursor;
        let mut tokens = lexer.tokens;
        if !tokens.iter().any(|t| t.active) {
            let at = tokens
                .iter()
                .position(|t| t.span.start >= cursor)
                .unwrap_or(tokens.len());
            tokens.insert(at, Token::synthetic(cursor));
        }

        tracing::trace!(
            "Tokenized {:?} at {}: {} words",
            line,
            cursor,
            tokens.len()
        );
        tokens
    }

    fn run(&mut self) {
        while let Some((offset, ch)) = self.current() {
            match self.quote {
                QuoteKind::None => self.scan_unquoted(offset, ch),
                QuoteKind::Single => self.scan_single(offset, ch),
                QuoteKind::Double => self.scan_double(offset, ch),
            }
        }

        if self.word.is_some() {
            self.mark_cursor(self.len);
        }
        if let Some(word) = self.word.take() {
            self.tokens.push(word.finish(self.len, self.quote));
        }
    }

    fn scan_unquoted(&mut self, offset: usize, ch: char) {
        if ch.is_whitespace() {
            self.mark_cursor(offset);
            if let Some(word) = self.word.take() {
                self.tokens.push(word.finish(offset, QuoteKind::None));
            }
            self.advance();
            return;
        }

        if ch == '\\' {
            match self.peek() {
                // line continuation
                Some((_, '\n')) => {
                    self.mark_cursor(offset);
                    self.advance();
                    self.advance();
                }
                Some((next_offset, next)) => {
                    self.begin_word(offset);
                    self.mark_cursor(next_offset);
                    self.push(next);
                    self.advance();
                    self.advance();
                }
                None => {
                    self.begin_word(offset);
                    self.push('\\');
                    self.advance();
                }
            }
            return;
        }

        self.begin_word(offset);
        match ch {
            '\'' => self.quote = QuoteKind::Single,
            '"' => self.quote = QuoteKind::Double,
            _ => self.push(ch),
        }
        self.advance();
    }

    fn scan_single(&mut self, offset: usize, ch: char) {
        self.mark_cursor(offset);
        if ch == '\'' {
            self.quote = QuoteKind::None;
        } else {
            self.push(ch);
        }
        self.advance();
    }

    fn scan_double(&mut self, offset: usize, ch: char) {
        self.mark_cursor(offset);
        match ch {
            '"' => {
                self.quote = QuoteKind::None;
                self.advance();
            }
            '\\' => match self.peek() {
                Some((_, '\n')) => {
                    self.advance();
                    self.advance();
                }
                Some((next_offset, next @ ('"' | '\\' | '$' | '`'))) => {
                    self.mark_cursor(next_offset);
                    self.push(next);
                    self.advance();
                    self.advance();
                }
                _ => {
                    self.push('\\');
                    self.advance();
                }
            },
            _ => {
                self.push(ch);
                self.advance();
            }
        }
    }

    /// Start a word at `offset` unless one is in progress
    fn begin_word(&mut self, offset: usize) {
        if self.word.is_none() {
            self.word = Some(WordBuilder::new(offset));
        }
        self.mark_cursor(offset);
    }

    /// Snapshot the word's prefix if the cursor sits at `offset`
    fn mark_cursor(&mut self, offset: usize) {
        if offset != self.cursor {
            return;
        }
        let quote = self.quote;
        if let Some(word) = self.word.as_mut() {
            if word.snapshot.is_none() {
                word.snapshot = Some((word.text.clone(), quote));
            }
        }
    }

    fn push(&mut self, ch: char) {
        if let Some(word) = self.word.as_mut() {
            word.text.push(ch);
        }
    }

    fn current(&self) -> Option<(usize, char)> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self) -> Option<(usize, char)> {
        self.input.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }
}

/// Clamp `cursor` to the line and floor it to a character boundary
pub fn clamp_cursor(line: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(line.len());
    while !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}
