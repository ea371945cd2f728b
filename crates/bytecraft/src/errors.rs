//! Error types for schema compilation and record reading.

use std::fmt;

use thiserror::Error;

/// Errors produced when compiling a [crate::schema::SchemaDecl] into a [crate::schema::Schema].
///
/// These are detected once, at registration time, never per parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Schema name is empty.
    #[error("schema name is empty")]
    EmptySchemaName,
    /// Field or argument name is empty.
    #[error("invalid field name `{0}`")]
    InvalidFieldName(String),
    /// A field or argument name is declared twice, or a schema is registered twice.
    #[error("duplicate name `{0}`")]
    DuplicateName(String),
    /// A directive references a name that is not bound before the field is read.
    #[error("field `{field}` depends on `{name}`, which is not bound before it")]
    DependencyViolation { field: String, name: String },
    /// A nested record field passes the wrong number of extra arguments.
    #[error("field `{field}` passes {given} arguments to `{schema}`, which declares {expected}")]
    ArgumentCount {
        field: String,
        schema: String,
        expected: usize,
        given: usize,
    },
    /// Tag primitive with zero length.
    #[error("field `{0}` declares a zero-length tag")]
    InvalidTagLength(String),
    /// A schema description names a schema that has not been registered.
    #[error("unknown schema `{0}`")]
    UnknownSchema(String),
}

/// Errors produced while reading values from a [crate::stream::Stream].
#[derive(Debug, Error)]
pub enum ReadError {
    /// A read needs more bytes than remain in the stream.
    #[error("unexpected end of stream: {needed} bytes needed at offset {offset}")]
    UnexpectedEndOfStream { offset: u64, needed: u64 },
    /// A computed offset falls outside the readable bytes.
    #[error("offset {target} is out of range for a stream of {len} bytes")]
    OffsetOutOfRange { target: i128, len: u64 },
    /// The stream can only be read forward.
    #[error("stream does not support seeking")]
    SeekUnsupported,
    /// A length expression evaluated to something that is not a non-negative integer.
    #[error("length evaluated to {0}, expected a non-negative integer")]
    InvalidLength(String),
    /// Wrong number of extra arguments supplied to a schema.
    #[error("expected {expected} extra arguments, got {given}")]
    ArgumentCount { expected: usize, given: usize },
    /// A value does not have the kind an argument or expression expects.
    #[error("`{name}`: expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Name looked up in the environment is not bound.
    #[error("`{0}` is not bound")]
    Unbound(String),
    /// Integer overflow while evaluating an expression or an offset.
    #[error("arithmetic overflow")]
    Overflow,
    /// Failure reported by a custom read procedure.
    #[error("{0}")]
    Custom(String),
    /// Error from the underlying reader, passed through unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One level of parse context: which field of which schema was being read, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub schema: String,
    pub field: String,
    /// Stream position when the field read started.
    pub offset: u64,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} at offset {}", self.schema, self.field, self.offset)
    }
}

/// A [ReadError] together with the trail of fields that were being read when it happened.
///
/// The trail is ordered outermost first: a failure inside a nested record reads as
/// `Outer.field at offset 4 > Inner.value at offset 10: <cause>`.
#[derive(Debug)]
pub struct ParseError {
    context: Vec<Frame>,
    kind: ReadError,
}

impl ParseError {
    /// The underlying cause.
    pub fn kind(&self) -> &ReadError {
        &self.kind
    }

    /// Context frames, outermost first.
    pub fn context(&self) -> &[Frame] {
        &self.context
    }

    pub fn into_kind(self) -> ReadError {
        self.kind
    }

    /// Prepends an outer frame to the trail.
    pub(crate) fn within(mut self, frame: Frame) -> Self {
        self.context.insert(0, frame);
        self
    }
}

impl From<ReadError> for ParseError {
    fn from(kind: ReadError) -> Self {
        ParseError {
            context: Vec::new(),
            kind,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        ReadError::Io(err).into()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.context.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{frame}")?;
        }

        if !self.context.is_empty() {
            f.write_str(": ")?;
        }

        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
