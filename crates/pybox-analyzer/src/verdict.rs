//! Outcome of screening a single snippet

use serde::Serialize;

/// What the analyzer concluded about one snippet.
///
/// Produced once per request and consumed once by the request handler;
/// never persisted.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the snippet may be handed to the executor
    pub approved: bool,
    /// First denylisted module encountered, if any
    pub violating_module: Option<String>,
    /// Parser message when the snippet did not parse at all
    pub diagnostic: Option<String>,
}

impl Verdict {
    pub fn approved() -> Self {
        Self {
            approved: true,
            violating_module: None,
            diagnostic: None,
        }
    }

    pub fn violation(module: impl Into<String>) -> Self {
        Self {
            approved: false,
            violating_module: Some(module.into()),
            diagnostic: None,
        }
    }

    pub fn parse_failure(diagnostic: impl Into<String>) -> Self {
        Self {
            approved: false,
            violating_module: None,
            diagnostic: Some(diagnostic.into()),
        }
    }

    /// Human-readable reason for a rejection.
    ///
    /// Only meaningful when `approved` is false; the server embeds this in
    /// the `stderr` field of its uniform response shape.
    pub fn reason(&self) -> String {
        if let Some(module) = &self.violating_module {
            format!("forbidden import detected: '{}'", module)
        } else if let Some(diagnostic) = &self.diagnostic {
            format!("syntax error in code: {}", diagnostic)
        } else {
            "code rejected".to_string()
        }
    }
}
