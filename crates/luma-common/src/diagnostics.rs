//! Diagnostics produced by the binder and checker.
//!
//! Every diagnostic carries a stable numeric code and a message built from a
//! template in [`diagnostic_messages`]. Templates use `{0}`, `{1}`, ...
//! placeholders filled by [`format_message`].

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Stable diagnostic codes.
pub mod diagnostic_codes {
    pub const TYPE_NOT_ASSIGNABLE: u32 = 2001;
    pub const PROPERTY_MISSING: u32 = 2002;
    pub const EXCESS_PROPERTY: u32 = 2003;
    pub const CIRCULAR_REFERENCE: u32 = 2004;
    pub const COMPARISON_TOO_DEEP: u32 = 2005;
    pub const UNKNOWN_NAME: u32 = 2006;
    pub const NOT_CALLABLE: u32 = 2007;
    pub const UNKNOWN_PROPERTY: u32 = 2008;
    pub const ARGUMENT_COUNT_MISMATCH: u32 = 2009;
    pub const POSSIBLY_NULLISH: u32 = 2010;
    pub const DUPLICATE_DECLARATION: u32 = 2011;
}

/// Message templates, indexed by code.
pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes as codes};

    pub const TYPE_NOT_ASSIGNABLE: DiagnosticMessage = DiagnosticMessage {
        code: codes::TYPE_NOT_ASSIGNABLE,
        category: DiagnosticCategory::Error,
        message: "Type '{0}' is not assignable to type '{1}'.",
    };
    pub const PROPERTY_MISSING: DiagnosticMessage = DiagnosticMessage {
        code: codes::PROPERTY_MISSING,
        category: DiagnosticCategory::Error,
        message: "Property '{0}' is missing in type '{1}' but required in type '{2}'.",
    };
    pub const EXCESS_PROPERTY: DiagnosticMessage = DiagnosticMessage {
        code: codes::EXCESS_PROPERTY,
        category: DiagnosticCategory::Error,
        message: "Object literal may only specify known properties, and '{0}' does not exist in type '{1}'.",
    };
    pub const CIRCULAR_REFERENCE: DiagnosticMessage = DiagnosticMessage {
        code: codes::CIRCULAR_REFERENCE,
        category: DiagnosticCategory::Error,
        message: "'{0}' is referenced directly or indirectly in its own type annotation.",
    };
    pub const COMPARISON_TOO_DEEP: DiagnosticMessage = DiagnosticMessage {
        code: codes::COMPARISON_TOO_DEEP,
        category: DiagnosticCategory::Error,
        message: "Comparison of types '{0}' and '{1}' is excessively deep and possibly infinite.",
    };
    pub const UNKNOWN_NAME: DiagnosticMessage = DiagnosticMessage {
        code: codes::UNKNOWN_NAME,
        category: DiagnosticCategory::Error,
        message: "Cannot find name '{0}'.",
    };
    pub const NOT_CALLABLE: DiagnosticMessage = DiagnosticMessage {
        code: codes::NOT_CALLABLE,
        category: DiagnosticCategory::Error,
        message: "Type '{0}' is not callable.",
    };
    pub const UNKNOWN_PROPERTY: DiagnosticMessage = DiagnosticMessage {
        code: codes::UNKNOWN_PROPERTY,
        category: DiagnosticCategory::Error,
        message: "Property '{0}' does not exist on type '{1}'.",
    };
    pub const ARGUMENT_COUNT_MISMATCH: DiagnosticMessage = DiagnosticMessage {
        code: codes::ARGUMENT_COUNT_MISMATCH,
        category: DiagnosticCategory::Error,
        message: "Expected {0} arguments, but got {1}.",
    };
    pub const POSSIBLY_NULLISH: DiagnosticMessage = DiagnosticMessage {
        code: codes::POSSIBLY_NULLISH,
        category: DiagnosticCategory::Error,
        message: "'{0}' is possibly 'null' or 'undefined'.",
    };

    pub const DUPLICATE_DECLARATION: DiagnosticMessage = DiagnosticMessage {
        code: codes::DUPLICATE_DECLARATION,
        category: DiagnosticCategory::Error,
        message: "Cannot redeclare name '{0}'.",
    };

    pub const ALL: &[DiagnosticMessage] = &[
        TYPE_NOT_ASSIGNABLE,
        PROPERTY_MISSING,
        EXCESS_PROPERTY,
        CIRCULAR_REFERENCE,
        COMPARISON_TOO_DEEP,
        UNKNOWN_NAME,
        NOT_CALLABLE,
        UNKNOWN_PROPERTY,
        ARGUMENT_COUNT_MISMATCH,
        POSSIBLY_NULLISH,
        DUPLICATE_DECLARATION,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRelatedInformation {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    pub fn error(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
        code: u32,
    ) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            message_text: message.into(),
            code,
            file: file.into(),
            start,
            length,
            related_information: Vec::new(),
        }
    }

    /// Build an error from a message template and arguments.
    pub fn from_message(
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            category: message.category,
            message_text: format_message(message.message, args),
            code: message.code,
            file: file.into(),
            start,
            length,
            related_information: Vec::new(),
        }
    }

    pub fn with_related(
        mut self,
        file: impl Into<String>,
        start: u32,
        length: u32,
        message: impl Into<String>,
    ) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            category: DiagnosticCategory::Message,
            code: 0,
            file: file.into(),
            start,
            length,
            message_text: message.into(),
        });
        self
    }
}

pub fn get_message_template(code: u32) -> Option<&'static str> {
    diagnostic_messages::ALL
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}
