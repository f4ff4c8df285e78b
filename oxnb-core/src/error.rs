//! Error types for OxNB operations.
//!
//! This module provides a single error type covering every fault the XNB
//! container, the LZX decoder and the content readers can surface. Parser
//! and decoder faults always abort the current pack/unpack with a
//! descriptive message; nothing is silently skipped or zero-filled.

use std::io;
use thiserror::Error;

/// The main error type for OxNB operations.
#[derive(Debug, Error)]
pub enum XnbError {
    /// I/O error from a sidecar callback or file operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with the `XNB` magic bytes.
    #[error("Invalid magic number: expected \"XNB\", found {found:02x?}")]
    BadMagic {
        /// Actual bytes found at the start of the file.
        found: Vec<u8>,
    },

    /// Input ended before the requested data could be read, or the header
    /// file size disagrees with the actual input length.
    #[error("Truncated input: need {needed} bytes, have {available}")]
    Truncated {
        /// Number of bytes that were needed.
        needed: usize,
        /// Number of bytes actually available.
        available: usize,
    },

    /// A 7-bit variable-length integer would encode a negative value.
    #[error("Cannot encode negative value {value} as a 7-bit varint")]
    NegativeVarint {
        /// The offending value.
        value: i32,
    },

    /// A 7-bit variable-length integer ran past its maximum width.
    #[error("Malformed 7-bit varint (more than 5 continuation bytes)")]
    MalformedVarint,

    /// A length-prefixed string was not valid UTF-8.
    #[error("Invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The reader table names a content type this build does not know.
    #[error("Unknown content reader: {name}")]
    UnknownReader {
        /// The assembly-qualified reader type name from the file.
        name: String,
    },

    /// The file declares shared resources, which are not supported.
    #[error("Shared resources are not supported (count = {count})")]
    UnsupportedSharedResources {
        /// The shared-resource count read from the file.
        count: i32,
    },

    /// A content payload referenced a reader index outside the table.
    #[error("Reader index {index} out of range (table has {readers} readers)")]
    InvalidReaderIndex {
        /// The 1-based index read from the stream (0 is the reserved null).
        index: i32,
        /// Number of readers in the table.
        readers: usize,
    },

    /// A document's content does not match the reader named in its table.
    #[error("Content type mismatch: reader table names {expected}, payload is {found}")]
    ReaderTypeMismatch {
        /// Reader named at index 0 of the table.
        expected: String,
        /// Kind of the payload actually present.
        found: String,
    },

    /// A sound effect carried a format block of an unexpected size.
    #[error("Unsupported audio format block size {format_size} (expected 18)")]
    UnsupportedAudioFormat {
        /// The declared WAVEFORMATEX size.
        format_size: u32,
    },

    /// A texture used a surface format this build cannot decode.
    #[error("Unsupported texture surface format {format}")]
    UnsupportedTextureFormat {
        /// The surface-format discriminant from the file.
        format: i32,
    },

    /// The LZX window size exponent was outside the valid 15..=21 range.
    #[error("LZX window size 2^{bits} out of range (15..=21)")]
    WindowSizeOutOfRange {
        /// The requested window bits.
        bits: u32,
    },

    /// The LZX stream requested Intel E8 call-offset preprocessing.
    #[error("LZX Intel E8 preprocessing is not supported")]
    IntelE8NotSupported,

    /// An LZX block header carried an invalid block type.
    #[error("Invalid LZX block type {block_type}")]
    InvalidBlockType {
        /// The 3-bit block-type value.
        block_type: u32,
    },

    /// Canonical Huffman table construction overran the code space.
    #[error("Huffman decode table overrun (corrupt code lengths)")]
    TableOverrun,

    /// An LZX output run would cross the end of the sliding window.
    #[error("LZX window run overflow: position {position} + run {run} > window {window}")]
    WindowRunOverflow {
        /// Current window write position.
        position: usize,
        /// Requested run length.
        run: usize,
        /// Window size in bytes.
        window: usize,
    },

    /// An LZX uncompressed block read past its declared block budget.
    #[error("LZX uncompressed block overruns its {block_size}-byte budget")]
    BlockOverrun {
        /// The block budget handed down by the container framing.
        block_size: usize,
    },

    /// An LZX frame declared an impossible frame or block size.
    #[error("Invalid LZX frame: frame size {frame_size}, block size {block_size}")]
    InvalidCompressedSize {
        /// Declared frame (decompressed) size.
        frame_size: usize,
        /// Declared block (compressed) size.
        block_size: usize,
    },

    /// The LZX stream ended with output still owed to the caller.
    #[error("LZX stream ended with {remaining} bytes still to decode")]
    EofWithDataRemaining {
        /// Bytes of the current frame left unproduced.
        remaining: usize,
    },

    /// An item layer pixel used a color absent from the built palette.
    #[error("Pixel color {color:?} not present in the item palette")]
    PaletteMiss {
        /// The RGBA color that could not be encoded.
        color: [u8; 4],
    },

    /// An item layer referenced a palette entry past the palette's end.
    #[error("Palette index {index} out of range (palette has {palette} colors)")]
    PaletteIndexOutOfRange {
        /// The palette index read from the stream.
        index: u8,
        /// Number of colors in the palette.
        palette: usize,
    },

    /// The LZ4 block codec rejected a compressed payload.
    #[error("LZ4 error: {message}")]
    Lz4 {
        /// Description from the block codec.
        message: String,
    },

    /// The JSON document was structurally invalid.
    #[error("Malformed document: {message}")]
    MalformedDocument {
        /// Description of the problem.
        message: String,
    },

    /// A PNG or WAV sidecar could not be decoded or re-encoded.
    #[error("Sidecar error: {message}")]
    Sidecar {
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for OxNB operations.
pub type Result<T> = std::result::Result<T, XnbError>;

impl XnbError {
    /// Create a bad-magic error.
    pub fn bad_magic(found: impl Into<Vec<u8>>) -> Self {
        Self::BadMagic {
            found: found.into(),
        }
    }

    /// Create a truncated-input error.
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::Truncated { needed, available }
    }

    /// Create an unknown-reader error.
    pub fn unknown_reader(name: impl Into<String>) -> Self {
        Self::UnknownReader { name: name.into() }
    }

    /// Create a reader-type-mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ReaderTypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a malformed-document error.
    pub fn document(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Create a sidecar error.
    pub fn sidecar(message: impl Into<String>) -> Self {
        Self::Sidecar {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = XnbError::bad_magic(vec![0x50, 0x4B, 0x03]);
        assert!(err.to_string().contains("Invalid magic"));

        let err = XnbError::truncated(14, 3);
        assert!(err.to_string().contains("need 14 bytes"));

        let err = XnbError::unknown_reader("BLANK");
        assert!(err.to_string().contains("BLANK"));

        let err = XnbError::InvalidBlockType { block_type: 0 };
        assert!(err.to_string().contains("block type 0"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: XnbError = io_err.into();
        assert!(matches!(err, XnbError::Io(_)));
    }
}
