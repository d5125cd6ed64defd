//! Completion candidates

/// What a candidate refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateKind {
    /// Flag name, choice or other plain value
    #[default]
    Value,
    /// Filesystem file
    File,
    /// Filesystem directory, never considered finished
    Directory,
}

/// One completion suggestion
#[derive(Debug, Clone)]
pub struct CompletionCandidate {
    /// Text inserted on the command line
    pub value: String,
    /// Text shown in a menu, if different from `value`
    pub display: Option<String>,
    /// Help text for shells that show descriptions
    pub description: Option<String>,
    pub kind: CandidateKind,
    /// Set on a sole final candidate; the shell adapter closes it
    pub finished: bool,
}

impl CompletionCandidate {
    /// Create a plain value candidate
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            display: None,
            description: None,
            kind: CandidateKind::Value,
            finished: false,
        }
    }

    /// Create a file candidate
    pub fn file(path: impl Into<String>) -> Self {
        Self::value(path).kind(CandidateKind::File)
    }

    /// Create a directory candidate
    pub fn directory(path: impl Into<String>) -> Self {
        Self::value(path).kind(CandidateKind::Directory)
    }

    pub fn kind(mut self, kind: CandidateKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Whether more input is expected after this value (`--opt=`, `dir/`, `host:`)
    pub fn continues(&self) -> bool {
        self.kind == CandidateKind::Directory || self.value.ends_with(['=', '/', ':'])
    }
}

// Candidates are the same suggestion when their inserted text matches
impl PartialEq for CompletionCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for CompletionCandidate {}

impl From<&str> for CompletionCandidate {
    fn from(value: &str) -> Self {
        Self::value(value)
    }
}

impl From<String> for CompletionCandidate {
    fn from(value: String) -> Self {
        Self::value(value)
    }
}
