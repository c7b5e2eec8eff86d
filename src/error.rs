use crate::header::Category;

/// Custom Result type for binvcf operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the binvcf library, encompassing all possible error cases
/// that can occur while encoding, decoding, or streaming variant records.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors raised by the typed-value codec
    CodecError(#[from] CodecError),
    /// Errors related to building or reading the key dictionary
    HeaderError(#[from] HeaderError),
    /// Errors raised while decoding or building a variant record
    RecordError(#[from] RecordError),
    /// Errors raised by the session state machine
    SessionError(#[from] SessionError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// UTF-8 encoding/decoding errors
    Utf8Error(#[from] std::str::Utf8Error),
}
impl Error {
    /// Returns true if the error describes a broken record
    ///
    /// A reader has already consumed such a record, so the next call continues
    /// with the record after it.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::RecordError(
                RecordError::MalformedRecord { .. }
                    | RecordError::UnknownKey { .. }
                    | RecordError::Truncated { .. }
                    | RecordError::CardinalityMismatch { .. }
                    | RecordError::TypeMismatch { .. }
                    | RecordError::SampleCountMismatch { .. }
                    | RecordError::TrailingBytes { .. }
            )
        )
    }

    /// Returns true if the error was raised because the session is closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::SessionError(SessionError::SessionClosed))
    }
}

/// Errors raised by the typed-value codec
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before the value was complete
    ///
    /// # Fields
    /// * `needed` - The number of bytes the value requires from `offset`
    /// * `offset` - The position at which the value starts
    /// * `available` - The total length of the buffer
    #[error(
        "Truncated input: needed {needed} bytes at offset {offset} but buffer holds {available}"
    )]
    TruncatedInput {
        needed: usize,
        offset: usize,
        available: usize,
    },

    /// The type tag is outside the supported set for the requested operation
    ///
    /// # Arguments
    /// * `u8` - The offending type tag
    #[error("Unsupported type tag: {0}")]
    UnsupportedType(u8),

    /// Vectors longer than 255 elements cannot be described by the escape byte
    ///
    /// # Arguments
    /// * `usize` - The requested element count
    #[error("Element count {0} exceeds the maximum of 255")]
    CountTooLarge(usize),

    /// An element count is negative or does not fit the requested value shape
    ///
    /// # Arguments
    /// * `i32` - The decoded count
    #[error("Invalid element count: {0}")]
    InvalidCount(i32),
}

/// Errors specific to building, reading, and querying the key dictionary
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// The magic number in the header does not match the expected value
    ///
    /// # Arguments
    /// * `u32` - The invalid magic number that was found
    #[error("Invalid magic number: {0:#x}")]
    InvalidMagicNumber(u32),

    /// The format version in the header is not supported
    ///
    /// # Arguments
    /// * `u8` - The unsupported version number that was found
    #[error("Invalid format version: {0}")]
    InvalidFormatVersion(u8),

    /// A key id was looked up that the dictionary never assigned
    ///
    /// # Arguments
    /// * `usize` - The unknown key id
    #[error("Unknown key id: {0}")]
    UnknownKey(usize),

    /// A key name was looked up that the dictionary does not define
    ///
    /// # Fields
    /// * `category` - The category that was searched
    /// * `key` - The key name
    #[error("Key {key} is not defined as {category}")]
    MissingKey { category: Category, key: String },

    /// A key was declared twice within the same category
    #[error("Duplicate {category} declaration for key {key}")]
    DuplicateKey { category: Category, key: String },

    /// A sample name appears twice on the column header line
    ///
    /// # Arguments
    /// * `String` - The duplicated sample name
    #[error("Duplicate sample name: {0}")]
    DuplicateSample(String),

    /// A key, contig, or sample index in the binary header is out of range or repeated
    ///
    /// # Fields
    /// * `kind` - One of "key", "contig", or "sample"
    /// * `index` - The offending index
    #[error("Invalid {kind} index in binary header: {index}")]
    InvalidIndex { kind: &'static str, index: i32 },

    /// A contig length does not fit the int32 field of the binary header
    ///
    /// # Fields
    /// * `key` - The contig name
    /// * `length` - The declared length
    #[error("Contig {key} has length {length}, the maximum is 2147483647")]
    InvalidContigLength { key: String, length: String },

    /// A packed key-info word could not be unpacked
    ///
    /// # Arguments
    /// * `u32` - The packed word
    #[error("Invalid packed key info: {0:#010x}")]
    InvalidInfoWord(u32),

    /// A dictionary count or text length in the binary header is negative
    ///
    /// # Arguments
    /// * `i32` - The offending value
    #[error("Invalid header length field: {0}")]
    InvalidLength(i32),

    /// The raw header text does not fit the 32-bit length field
    ///
    /// # Arguments
    /// * `usize` - The text length
    #[error("Header text of {0} bytes is too large")]
    TextTooLarge(usize),

    /// A key name in the binary header failed to decode
    #[error("Invalid key name in binary header: {0}")]
    InvalidKeyName(#[from] CodecError),
}

/// Errors raised while decoding or building a variant record
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    /// A codec failure occurred while decoding a record section
    ///
    /// # Fields
    /// * `offset` - The position from the start of the record where decoding failed
    /// * `source` - The underlying codec error
    #[error("Malformed record at byte {offset}: {source}")]
    MalformedRecord {
        offset: usize,
        #[source]
        source: CodecError,
    },

    /// A record references a key id the dictionary does not define in that category
    #[error("Record references unknown {category} key {key} at byte {offset}")]
    UnknownKey {
        category: Category,
        key: i64,
        offset: usize,
    },

    /// A byte slice is shorter than the record its length prefix describes
    ///
    /// # Fields
    /// * `expected` - The number of bytes the record requires
    /// * `found` - The number of bytes that were available
    #[error("Record truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// The sections of a record end before its declared length
    ///
    /// # Fields
    /// * `offset` - The position from the start of the record where the sections end
    /// * `found` - The number of unread bytes
    #[error("Record has {found} trailing bytes after byte {offset}")]
    TrailingBytes { offset: usize, found: usize },

    /// The encoded sections do not fit the 32-bit length field
    ///
    /// # Arguments
    /// * `usize` - The section length
    #[error("Record of {0} bytes is too large")]
    TooLarge(usize),

    /// A field carries a different number of values than its key declares
    #[error("Key {key} expects {expected} values, found {found}")]
    CardinalityMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    /// A field's values do not match the type its key declares
    #[error("Key {key} is declared as {expected} but holds {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A FORMAT field does not carry one entry per sample
    #[error("Key {key} has values for {found} samples, header declares {expected}")]
    SampleCountMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    /// A record was built without one of its mandatory fields
    ///
    /// # Arguments
    /// * `&'static str` - The name of the missing field
    #[error("Record is missing mandatory field: {0}")]
    IncompleteRecord(&'static str),

    /// A genotype string could not be parsed
    ///
    /// # Arguments
    /// * `String` - The offending genotype
    #[error("Invalid genotype: {0}")]
    InvalidGenotype(String),
}

/// Errors raised by the session state machine
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The session was closed and cannot be used anymore
    #[error("Session is closed")]
    SessionClosed,

    /// A record operation was issued before the header was loaded
    #[error("Header has not been loaded")]
    HeaderNotLoaded,

    /// The header was written twice
    #[error("Header has already been loaded")]
    HeaderAlreadyLoaded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_classification() {
        let err: Error = RecordError::Truncated {
            expected: 20,
            found: 3,
        }
        .into();
        assert!(err.is_malformed());

        let err: Error = RecordError::IncompleteRecord("pos").into();
        assert!(!err.is_malformed());

        let err: Error = SessionError::SessionClosed.into();
        assert!(err.is_closed());
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::TruncatedInput {
            needed: 4,
            offset: 2,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Truncated input: needed 4 bytes at offset 2 but buffer holds 3"
        );
    }
}
