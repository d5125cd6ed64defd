//! Completion context definitions
//!
//! The context is the walker's verdict on what the active word is: a flag
//! name, the value of a specific action, a positional slot (possibly together
//! with sub-command names), or nothing at all.

use std::ptr;

use crate::spec::Action;

/// What kind of completion the active word needs
#[derive(Debug, Clone, Copy)]
pub enum CompletionContext<'a> {
    /// Complete flag names of the current scope
    FlagName,

    /// Complete a value of the given action
    ActionValue(&'a Action),

    /// Complete the next positional and/or sub-command names
    Positional {
        /// Next unfilled positional, if any
        positional: Option<&'a Action>,
        /// Whether sub-command names of the scope apply
        subcommands: bool,
    },

    /// No completion available
    None,
}

impl<'a> CompletionContext<'a> {
    /// Check if this is a None context
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The action whose values are completed, if any
    pub fn value_action(&self) -> Option<&'a Action> {
        match self {
            Self::ActionValue(action) => Some(action),
            Self::Positional { positional, .. } => *positional,
            _ => None,
        }
    }

    /// Short label for logs and the `explain` table
    pub fn label(&self) -> String {
        match self {
            Self::FlagName => "flag name".to_string(),
            Self::ActionValue(action) => format!("value of {}", action.display_name()),
            Self::Positional {
                positional,
                subcommands,
            } => {
                let mut parts = Vec::new();
                if *subcommands {
                    parts.push("sub-command".to_string());
                }
                if let Some(action) = positional {
                    parts.push(format!("positional {}", action.display_name()));
                }
                if parts.is_empty() {
                    "positional (exhausted)".to_string()
                } else {
                    parts.join(" | ")
                }
            }
            Self::None => "none".to_string(),
        }
    }
}

// Actions are compared by identity: two contexts are equal when they point
// at the same node of the same tree.
impl PartialEq for CompletionContext<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::FlagName, Self::FlagName) | (Self::None, Self::None) => true,
            (Self::ActionValue(a), Self::ActionValue(b)) => ptr::eq(*a, *b),
            (
                Self::Positional {
                    positional: a,
                    subcommands: sa,
                },
                Self::Positional {
                    positional: b,
                    subcommands: sb,
                },
            ) => {
                sa == sb
                    && match (a, b) {
                        (Some(a), Some(b)) => ptr::eq(*a, *b),
                        (None, None) => true,
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_equality() {
        let a = Action::flag(["--out"]);
        let b = Action::flag(["--out"]);
        assert_eq!(
            CompletionContext::ActionValue(&a),
            CompletionContext::ActionValue(&a)
        );
        assert_ne!(
            CompletionContext::ActionValue(&a),
            CompletionContext::ActionValue(&b)
        );
        assert_ne!(CompletionContext::FlagName, CompletionContext::None);
    }

    #[test]
    fn test_value_action_and_label() {
        let target = Action::positional("target");
        let ctx = CompletionContext::Positional {
            positional: Some(&target),
            subcommands: true,
        };
        assert!(ctx.value_action().is_some());
        assert_eq!(ctx.label(), "sub-command | positional target");
        assert!(CompletionContext::None.is_none());
        assert!(CompletionContext::FlagName.value_action().is_none());
    }
}
