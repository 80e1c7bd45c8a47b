//! Structured error types shared across the UQP crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`UqpError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case identifier, stable across releases.
    pub code: String,
    /// What went wrong, for people.
    pub message: String,
    /// Contextual key value pairs (unit symbols, parameter names, input text).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    /// Suggested fix, when one is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records `key=value` alongside the message.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a suggested fix.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for unit handling and uncertainty propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum UqpError {
    /// Incompatible units in a conversion, addition, subtraction or construction.
    #[error("dimensionality error: {0}")]
    Dimensionality(ErrorInfo),
    /// Malformed compact notation, number or unit expression.
    #[error("parse error: {0}")]
    Parse(ErrorInfo),
    /// Unit symbol missing from the symbol table.
    #[error("unknown unit: {0}")]
    UnknownUnit(ErrorInfo),
    /// Numeric domain failures such as negative square roots.
    #[error("numeric error: {0}")]
    Numeric(ErrorInfo),
    /// Argument binding failures for wrapped functions.
    #[error("argument error: {0}")]
    Arguments(ErrorInfo),
    /// Invalid convention configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in pairs {
                write!(f, ", {key}={value}")?;
            }
            f.write_str(")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

impl UqpError {
    /// Payload of whichever family this is.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            UqpError::Dimensionality(info)
            | UqpError::Parse(info)
            | UqpError::UnknownUnit(info)
            | UqpError::Numeric(info)
            | UqpError::Arguments(info)
            | UqpError::Config(info) => info,
        }
    }

    /// Returns the stable error code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Name of the error family, matching the serialized `family` tag.
    pub fn family(&self) -> &'static str {
        match self {
            UqpError::Dimensionality(_) => "Dimensionality",
            UqpError::Parse(_) => "Parse",
            UqpError::UnknownUnit(_) => "UnknownUnit",
            UqpError::Numeric(_) => "Numeric",
            UqpError::Arguments(_) => "Arguments",
            UqpError::Config(_) => "Config",
        }
    }
}
