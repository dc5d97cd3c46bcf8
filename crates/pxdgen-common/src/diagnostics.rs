use crate::position::SourceLocation;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    /// The external parser failed on an input file.
    pub const PARSE_ERROR: u32 = 1001;
    /// A node stream could not be turned into a declaration graph.
    pub const MALFORMED_NODE_STREAM: u32 = 1002;
    pub const UNRESOLVED_TYPE: u32 = 2001;
    pub const UNSUPPORTED_CONSTRUCT: u32 = 2002;
    pub const AUTO_DEFINED_TYPE: u32 = 2003;
    pub const NAME_COLLISION: u32 = 3001;
    pub const OUTPUT_WRITE_FAILED: u32 = 3002;
    pub const INVALID_CONFIGURATION: u32 = 9001;
    pub const PARSER_UNAVAILABLE: u32 = 9002;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes};

    pub const PARSE_ERROR: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::PARSE_ERROR,
        category: DiagnosticCategory::Error,
        message: "Failed to parse '{0}': {1}",
    };
    pub const MALFORMED_NODE_STREAM: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::MALFORMED_NODE_STREAM,
        category: DiagnosticCategory::Error,
        message: "Node stream for '{0}' is malformed: {1}",
    };
    pub const UNRESOLVED_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNRESOLVED_TYPE,
        category: DiagnosticCategory::Warning,
        message: "Type '{0}' used by '{1}' could not be resolved; emitting an opaque placeholder.",
    };
    pub const UNSUPPORTED_CONSTRUCT: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_CONSTRUCT,
        category: DiagnosticCategory::Warning,
        message: "'{0}' uses an unsupported construct ({1}); it was commented out.",
    };
    pub const ANONYMOUS_MEMBER: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_CONSTRUCT,
        category: DiagnosticCategory::Warning,
        message: "Anonymous member '{0}' of '{1}' is emitted as a separate declaration.",
    };
    pub const AUTO_DEFINED_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::AUTO_DEFINED_TYPE,
        category: DiagnosticCategory::Message,
        message: "Type '{0}' used by '{1}' was auto-defined as '{2}'.",
    };
    pub const NAME_COLLISION: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::NAME_COLLISION,
        category: DiagnosticCategory::Error,
        message: "{0}",
    };
    pub const OUTPUT_WRITE_FAILED: DiagnosticMessage = DiagnosticMessage {
        code: diagnostic_codes::OUTPUT_WRITE_FAILED,
        category: DiagnosticCategory::Error,
        message: "Could not write '{0}': {1}",
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message_text: String,
}

/// A file-scoped problem. Diagnostics are collected per input file and never
/// abort the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    /// 1-based line, 0 when the problem is not tied to a position.
    pub line: u32,
    pub column: u32,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            file: file.into(),
            line: 0,
            column: 0,
            message_text: message.into(),
            related_information: Vec::new(),
        }
    }

    /// Build a diagnostic from a message template, filling `{0}`, `{1}`, ...
    pub fn from_message(
        location: &SourceLocation,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            category: message.category,
            code: message.code,
            file: location.file.clone(),
            line: location.line,
            column: location.column,
            message_text: format_message(message.message, args),
            related_information: Vec::new(),
        }
    }

    pub fn with_related(
        mut self,
        location: &SourceLocation,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            category: DiagnosticCategory::Message,
            code: 0,
            file: location.file.clone(),
            line: location.line,
            column: location.column,
            message_text: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "tests/diagnostics.rs"]
mod tests;
