//! # OxNB LZX
//!
//! Pure Rust LZX decompression for XNB payloads.
//!
//! LZX combines a sliding-dictionary LZSS stage with canonical Huffman
//! codes, three block types (Verbatim, Aligned, Uncompressed) and a
//! three-slot repeated-offset queue. XNB files wrap the raw LZX bitstream
//! in a chunked framing of up to 32 KB frames, each prefixed with its
//! compressed block size (and, when flagged with `0xFF`, an explicit frame
//! size).
//!
//! This crate decodes only; XNB packing writes uncompressed or delegates to
//! LZ4, so no LZX encoder exists here.
//!
//! ## Example
//!
//! ```no_run
//! use oxnb_lzx::{decompress, LzxBitReader};
//!
//! // `payload` holds the compressed region of an XNB file.
//! let payload: &[u8] = &[];
//! let mut reader = LzxBitReader::new(payload);
//! let decoded = decompress(&mut reader, payload.len()).unwrap();
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod decoder;
pub mod huffman;
pub mod tables;

pub use bitstream::LzxBitReader;
pub use decoder::LzxDecoder;
pub use huffman::HuffmanTable;
pub use tables::XNB_WINDOW_BITS;

use oxnb_core::error::{Result, XnbError};

/// Largest frame or block size the framing may declare.
const MAX_CHUNK: usize = 0x10000;

/// Default frame size when no explicit size flag is present.
const DEFAULT_FRAME: usize = 0x8000;

/// Decompress `compressed_todo` bytes of chunked LZX data.
///
/// Each chunk is either `0xFF, frame_size, block_size` (both sizes 16-bit,
/// high byte first) or just `block_size` with an implied frame size of
/// 32 KB. The reader is left positioned at the end of the final block.
pub fn decompress(reader: &mut LzxBitReader<'_>, compressed_todo: usize) -> Result<Vec<u8>> {
    let mut decoder = LzxDecoder::new(XNB_WINDOW_BITS)?;
    let mut output = Vec::new();
    let mut pos = 0usize;

    while pos < compressed_todo {
        let flag = reader.read_u8()?;
        let (frame_size, block_size) = if flag == 0xFF {
            let frame = reader.read_u16_swapped()? as usize;
            let block = reader.read_u16_swapped()? as usize;
            pos += 5;
            (frame, block)
        } else {
            reader.seek(reader.position() - 1);
            let block = reader.read_u16_swapped()? as usize;
            pos += 2;
            (DEFAULT_FRAME, block)
        };

        if block_size == 0 || frame_size == 0 {
            break;
        }
        if block_size > MAX_CHUNK || frame_size > MAX_CHUNK {
            return Err(XnbError::InvalidCompressedSize {
                frame_size,
                block_size,
            });
        }

        let block_start = reader.position();
        output.extend_from_slice(&decoder.decompress(reader, frame_size, block_size)?);
        pos += block_size;
        reader.seek(block_start + block_size);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_block_size_terminates() {
        let data = [0x00, 0x00];
        let mut reader = LzxBitReader::new(&data);
        let out = decompress(&mut reader, 2).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_truncated_framing_fails() {
        let data = [0xFF, 0x00];
        let mut reader = LzxBitReader::new(&data);
        assert!(decompress(&mut reader, 5).is_err());
    }
}
