//! # OxNB Core
//!
//! Core components for the OxNB XNB toolkit.
//!
//! This crate provides the fundamental building blocks shared by the XNB
//! container, the LZX codec and the content readers:
//!
//! - [`binary`]: `BinaryReader`/`BinaryWriter` for little-endian I/O over
//!   in-memory buffers, including the 7-bit varint and length-prefixed
//!   strings used throughout the format
//! - [`typename`]: .NET assembly-qualified type-name parsing and comparison
//! - [`error`]: the shared `XnbError` type
//!
//! ## Architecture
//!
//! OxNB is designed as a layered protocol stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: Tooling                                             │
//! │     oxnb CLI (unpack / pack / info)                     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     XNB header, reader table, content readers, document │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     LZX decoder (Huffman + LZSS), LZ4 delegation        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Binary I/O (this crate)                             │
//! │     BinaryReader/BinaryWriter, varint, type names       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxnb_core::binary::BinaryReader;
//! use oxnb_core::typename::TypeName;
//!
//! let mut reader = BinaryReader::new(&[0x05, b'H', b'e', b'l', b'l', b'o']);
//! assert_eq!(reader.read_string().unwrap(), "Hello");
//!
//! let a = TypeName::parse("SFD.Content.ItemsContentTypeReader, SFD");
//! let b = TypeName::parse("SFD.Content.ItemsContentTypeReader");
//! assert_eq!(a, b);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod binary;
pub mod error;
pub mod typename;

// Re-exports for convenience
pub use binary::{BinaryReader, BinaryWriter};
pub use error::{Result, XnbError};
pub use typename::TypeName;
