//! Query interpretation
//!
//! Pulls structured hints out of a raw query so the primary index can be
//! asked a sharper question. Pure and infallible: a hint that is not present
//! is simply `None`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// `at <frame> (<file>:<line>:<col>)`
    static ref STACK_FRAME: Regex =
        Regex::new(r"at\s+(.+?)\s+\((.+?):(\d+):(\d+)\)").expect("stack frame pattern");

    /// Leading `<Identifier>Error:` token, e.g. `TypeError:`
    static ref ERROR_TYPE: Regex = Regex::new(r"^(\w+Error):").expect("error type pattern");
}

/// A raw query plus whatever structure could be recognised in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretedQuery {
    /// First stack frame found in the query, verbatim
    pub stack_trace_fragment: Option<String>,

    /// Typed error name the query starts with, without the colon
    pub error_type_name: Option<String>,

    /// The query as received
    pub raw: String,
}

impl InterpretedQuery {
    /// Text to send to the full-text index: the error type name when one
    /// was recognised, otherwise the raw query.
    pub fn search_text(&self) -> &str {
        self.error_type_name.as_deref().unwrap_or(&self.raw)
    }
}

/// Interpret a raw query string
pub fn interpret(raw: &str) -> InterpretedQuery {
    let stack_trace_fragment = STACK_FRAME.find(raw).map(|m| m.as_str().to_string());
    let error_type_name = ERROR_TYPE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    InterpretedQuery {
        stack_trace_fragment,
        error_type_name,
        raw: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_prefix() {
        let query = interpret("TypeError:");
        assert_eq!(query.error_type_name.as_deref(), Some("TypeError"));
        assert_eq!(query.search_text(), "TypeError");
        assert_eq!(query.raw, "TypeError:");
    }

    #[test]
    fn test_error_type_must_lead() {
        let query = interpret("Uncaught TypeError: x is not a function");
        assert!(query.error_type_name.is_none());
        assert_eq!(query.search_text(), "Uncaught TypeError: x is not a function");
    }

    #[test]
    fn test_bare_error_prefix_is_not_a_type_name() {
        assert!(interpret("Error: something broke").error_type_name.is_none());
    }

    #[test]
    fn test_stack_frame_extraction() {
        let raw = "TypeError: Cannot read properties of undefined\n    at render (src/App.js:12:7)\n    at main (index.js:3:1)";
        let query = interpret(raw);

        assert_eq!(
            query.stack_trace_fragment.as_deref(),
            Some("at render (src/App.js:12:7)")
        );
        assert_eq!(query.error_type_name.as_deref(), Some("TypeError"));
    }

    #[test]
    fn test_no_hints() {
        let query = interpret("NullPointerException");
        assert!(query.stack_trace_fragment.is_none());
        assert!(query.error_type_name.is_none());
        assert_eq!(query.search_text(), "NullPointerException");
    }

    #[test]
    fn test_empty_query() {
        let query = interpret("");
        assert_eq!(query, InterpretedQuery {
            stack_trace_fragment: None,
            error_type_name: None,
            raw: String::new(),
        });
    }
}
