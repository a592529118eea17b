//! Error types for the billing API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from every other failure. Codec failures
//! always carry the offending field and its raw content, and server-side
//! validation failures keep the structured `<errors>` payload instead of
//! collapsing it to a string. Any other non-2xx response lands in `Http`
//! with the raw status code and body for debugging.

use std::fmt;

use thiserror::Error;

/// Errors returned by `BillingClient` parse methods and `Service` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not complete the exchange (network, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned 404: the plan or the add-on does not exist.
    #[error("resource not found{}", describe(.description))]
    NotFound { description: Option<String> },

    /// A request or response body could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The server rejected the record with a structured validation payload.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The server returned a status no operation expects.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

fn describe(description: &Option<String>) -> String {
    match description {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

/// What went wrong while encoding or decoding a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecErrorKind {
    InvalidInteger,
    InvalidBoolean,
    InvalidTimestamp,
    /// A unit amount carried both a bare value and currency sub-elements.
    ConflictingAmountForms,
    NegativeAmount,
    /// A scalar element carried child elements instead of text.
    UnexpectedStructure,
    /// The document is not well-formed XML.
    MalformedDocument(String),
    /// The root element is not the one the resource expects.
    UnexpectedElement { expected: String },
}

impl fmt::Display for CodecErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecErrorKind::InvalidInteger => write!(f, "invalid integer"),
            CodecErrorKind::InvalidBoolean => write!(f, "invalid boolean"),
            CodecErrorKind::InvalidTimestamp => write!(f, "invalid timestamp"),
            CodecErrorKind::ConflictingAmountForms => {
                write!(f, "both single and multi-currency amounts present")
            }
            CodecErrorKind::NegativeAmount => write!(f, "negative amount not allowed"),
            CodecErrorKind::UnexpectedStructure => write!(f, "expected text, found child elements"),
            CodecErrorKind::MalformedDocument(reason) => write!(f, "malformed document: {reason}"),
            CodecErrorKind::UnexpectedElement { expected } => {
                write!(f, "expected <{expected}> element")
            }
        }
    }
}

/// A field failed to encode or decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}`: {kind} (raw: {raw:?})")]
pub struct CodecError {
    pub field: String,
    pub raw: String,
    pub kind: CodecErrorKind,
}

impl CodecError {
    pub fn new(field: impl Into<String>, raw: impl Into<String>, kind: CodecErrorKind) -> Self {
        Self {
            field: field.into(),
            raw: raw.into(),
            kind,
        }
    }

    pub(crate) fn malformed(raw: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::new(
            "document",
            raw,
            CodecErrorKind::MalformedDocument(reason.to_string()),
        )
    }
}

/// The transport failed to deliver a request or receive its response.
#[derive(Debug, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// One entry of a server validation payload, e.g.
/// `<error field="add_on.add_on_code" symbol="blank">can't be blank</error>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Option<String>,
    pub symbol: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field} {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// All validation errors the server reported for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, error) in self.errors.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
