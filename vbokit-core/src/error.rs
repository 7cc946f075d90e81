/// Error types for math construction, vertex layouts and model decoding
use thiserror::Error;

/// Format errors raised while decoding a binary model.
///
/// All of them abort loading of that model; no partial model is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The leading 3-byte tag is not `Pmd`
    #[error("bad magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        expected: &'static [u8],
        found: Vec<u8>,
    },

    /// The version float is not the supported one
    #[error("unsupported version {found} (supported: {supported})")]
    UnsupportedVersion { found: f32, supported: f32 },

    /// Fewer bytes remain than a section declares
    #[error("truncated {section}: needed {needed} bytes, {available} available")]
    TruncatedData {
        section: &'static str,
        needed: usize,
        available: usize,
    },
}

/// Errors returned by vbokit-core operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Wrong number of components handed to a math constructor
    #[error("invalid argument for {target}: expected {expected} components, got {got}")]
    InvalidArgument {
        target: &'static str,
        expected: usize,
        got: usize,
    },

    /// Vertex data or layout declaration does not fit the builder
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    /// A text value does not fit its fixed-width field
    #[error("{field} is {len} bytes, field holds {max}")]
    FieldOverflow {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A text value has characters the field's encoding cannot represent
    #[error("{field} has characters the text encoding cannot represent")]
    Unencodable { field: &'static str },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    pub fn layout(message: impl Into<String>) -> Self {
        Error::LayoutMismatch(message.into())
    }

    pub(crate) fn arity(target: &'static str, expected: usize, got: usize) -> Self {
        Error::InvalidArgument {
            target,
            expected,
            got,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
