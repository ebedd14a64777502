//! Error types shared by the wire layer and the codec engine.

/// Error reported by codecs and wire primitives.
///
/// The type is `Clone` so that a codec built for an unsupported combination
/// can hold one instance and report it on every use.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Input ended in the middle of a value.
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("variable-length integer overflows {bits} bits")]
    VarintOverflow { bits: u32 },

    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBool(u8),

    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(String),

    #[error("negative length {0}")]
    NegativeLength(i64),

    /// A decoded length exceeded one of the configured safety limits.
    #[error("{what} size {size} exceeds the limit of {limit}")]
    SizeLimit {
        what: &'static str,
        size: u64,
        limit: u64,
    },

    /// The schema kind and the native type cannot be mapped onto each other.
    #[error("{native} is unsupported for schema type {schema}")]
    Unsupported { native: String, schema: String },

    #[error("enum ordinal {ordinal} is out of range for {symbols} symbols")]
    EnumOrdinalOutOfRange { ordinal: i64, symbols: usize },

    #[error("unknown enum symbol '{0}'")]
    UnknownEnumSymbol(String),

    #[error("fixed size mismatch: expected {expected} bytes, got {actual}")]
    FixedLength { expected: usize, actual: usize },

    #[error("union branch index {index} is out of range for {branches} branches")]
    UnionBranchOutOfRange { index: i64, branches: usize },

    #[error("no union branch accepts {0}")]
    NoUnionBranch(String),

    #[error("cannot encode null reference")]
    NullReference,

    #[error("value {value} is out of range for {target}")]
    IntegerRange { value: i64, target: &'static str },

    /// A double cannot be written to a float schema without losing precision.
    #[error("value {0} does not fit a float exactly")]
    FloatPrecision(f64),

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("record {record} is missing required field '{field}'")]
    MissingField { record: String, field: String },

    #[error("field '{0}' has no default value")]
    NoDefault(String),

    #[error("unresolved schema reference '{0}'")]
    UnresolvedReference(String),

    /// The default value of a field could not be materialized.
    #[error("decode default for field '{field}': {source}")]
    DecodeDefault {
        field: String,
        #[source]
        source: Box<CodecError>,
    },

    /// A custom marshal implementation rejected the value.
    #[error("marshal: {0}")]
    Marshal(String),

    /// The destination or source did not expose the shape its descriptor promised.
    #[error("native value mismatch: {0}")]
    Native(String),

    /// An error wrapped with the description of the type being processed.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Wrap the error with the description of the offending type or field.
    pub fn within(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every [`CodecError::Context`] layer removed.
    pub fn root(&self) -> &CodecError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Error returned by the typed accessors of [`Value`](crate::Value).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("type mismatch: expected {expected}, found {actual}")]
pub struct ValueTypeError {
    pub expected: String,
    pub actual: &'static str,
}

impl ValueTypeError {
    pub fn new(expected: impl Into<String>, actual: &'static str) -> Self {
        Self {
            expected: expected.into(),
            actual,
        }
    }
}
