//! Top-level XNB pack and unpack.
//!
//! Unpacking parses the prologue, undoes LZX or LZ4 compression by splicing
//! the decoded payload back behind the prologue, reads the reader table and
//! dispatches the root payload. Packing mirrors it: desktop targets write
//! uncompressed, mobile targets (`a`/`i`) compress with one LZ4 block, and
//! the size fields are back-patched once the payload length is known.

use crate::document::Document;
use crate::header::{Compression, XnbHeader};
use crate::registry::{ReaderEntry, ReaderKind, ReaderRegistry};
use oxnb_core::binary::{BinaryReader, BinaryWriter};
use oxnb_core::error::{Result, XnbError};
use oxnb_lzx::LzxBitReader;
use tracing::warn;

/// Prologue length without the decompressed-size field.
const PROLOGUE: usize = 10;
/// Prologue length with the decompressed-size field (compressed files).
const PROLOGUE_COMPRESSED: usize = 14;

/// Offset of the total-file-size field.
const FILE_SIZE_OFFSET: usize = 6;

/// XNB container codec.
pub struct Container;

impl Container {
    /// Unpack an XNB file into a document.
    pub fn unpack(bytes: &[u8]) -> Result<Document> {
        let mut reader = BinaryReader::new(bytes);
        let header = XnbHeader::parse(&mut reader)?;

        let file_size = reader.read_u32()? as usize;
        if file_size != bytes.len() {
            return Err(XnbError::truncated(file_size, bytes.len()));
        }

        // Decompressed payloads are spliced back in behind the prologue, so
        // the body always starts right where the prologue ended.
        let working: Vec<u8>;
        let (buffer, body_start): (&[u8], usize) = match header.compression {
            Compression::None => (bytes, PROLOGUE),
            Compression::Lzx => {
                let decompressed_size = reader.read_u32()? as usize;
                let mut lzx_reader = LzxBitReader::new(&bytes[PROLOGUE_COMPRESSED..]);
                let payload =
                    oxnb_lzx::decompress(&mut lzx_reader, file_size - PROLOGUE_COMPRESSED)?;
                if payload.len() != decompressed_size {
                    warn!(
                        "LZX payload is {} bytes, header declared {decompressed_size}",
                        payload.len()
                    );
                }
                working = splice(&bytes[..PROLOGUE_COMPRESSED], payload);
                (&working, PROLOGUE_COMPRESSED)
            }
            Compression::Lz4 => {
                let decompressed_size = reader.read_u32()? as usize;
                let payload = lz4_flex::block::decompress(
                    &bytes[PROLOGUE_COMPRESSED..],
                    decompressed_size,
                )
                .map_err(|e| XnbError::Lz4 {
                    message: e.to_string(),
                })?;
                working = splice(&bytes[..PROLOGUE_COMPRESSED], payload);
                (&working, PROLOGUE_COMPRESSED)
            }
        };

        let mut reader = BinaryReader::new(buffer);
        reader.seek(body_start);

        let registry = ReaderRegistry::read_table(&mut reader)?;

        let shared_resources = reader.read_7bit()?;
        if shared_resources != 0 {
            return Err(XnbError::UnsupportedSharedResources {
                count: shared_resources,
            });
        }

        let root_index = reader.read_7bit()?;
        let entry = registry.get(root_index)?;
        let content = entry.kind.read_from(&mut reader, &registry)?;

        Ok(Document {
            header,
            readers: registry.entries().to_vec(),
            content,
        })
    }

    /// Pack a document into an XNB file.
    ///
    /// The document's reader table drives the output; its first entry must
    /// name the payload's reader. Compression is chosen by target platform,
    /// not by the header's recorded compression (there is no LZX encoder).
    pub fn pack(document: &Document) -> Result<Vec<u8>> {
        let readers = if document.readers.is_empty() {
            let kind = ReaderKind::for_content(&document.content);
            vec![ReaderEntry {
                kind,
                type_name: kind.canonical_name().to_string(),
                version: 0,
            }]
        } else {
            document.readers.clone()
        };

        let registry = ReaderRegistry::new(readers);
        let root = &registry.entries()[0];
        if root.kind != ReaderKind::for_content(&document.content) {
            return Err(XnbError::type_mismatch(
                root.type_name.clone(),
                document.content.kind_name(),
            ));
        }

        let mut body = BinaryWriter::new();
        registry.write_table(&mut body)?;
        body.write_7bit(0)?; // shared resources
        body.write_7bit(1)?; // root payload uses the first reader
        root.kind.write_to(&mut body, &document.content, &registry)?;
        let body = body.into_bytes();

        let compression = if document.header.target_platform.uses_lz4() {
            Compression::Lz4
        } else {
            Compression::None
        };

        let mut writer = BinaryWriter::with_capacity(PROLOGUE_COMPRESSED + body.len());
        XnbHeader {
            compression,
            ..document.header
        }
        .emit(&mut writer);
        writer.write_u32(0); // total file size, patched below

        match compression {
            Compression::None => writer.write_bytes(&body),
            Compression::Lz4 => {
                writer.write_u32(body.len() as u32);
                writer.write_bytes(&lz4_flex::block::compress(&body));
            }
            Compression::Lzx => unreachable!("pack never emits LZX"),
        }

        writer.patch_u32(FILE_SIZE_OFFSET, writer.position() as u32);
        writer.trim();
        Ok(writer.into_bytes())
    }
}

/// Stitch a prologue and a decoded payload into one working buffer.
fn splice(prologue: &[u8], payload: Vec<u8>) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(prologue.len() + payload.len());
    buffer.extend_from_slice(prologue);
    buffer.extend(payload);
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Content, SurfaceFormat, Texture2D};
    use crate::header::TargetPlatform;

    fn texture_document(target: TargetPlatform) -> Document {
        Document {
            header: XnbHeader {
                target_platform: target,
                xnb_version: 5,
                hidef: false,
                compression: Compression::None,
            },
            readers: Vec::new(),
            content: Content::Texture2D(Texture2D {
                surface_format: SurfaceFormat::Rgba8,
                width: 1,
                height: 1,
                pixels: vec![10, 20, 30, 255],
            }),
        }
    }

    #[test]
    fn test_minimal_texture_pack_unpack() {
        let document = texture_document(TargetPlatform::Windows);
        let bytes = Container::pack(&document).unwrap();

        // 10-byte prologue; no decompressed-size slot when uncompressed.
        assert_eq!(&bytes[..4], b"XNBw");
        assert_eq!(bytes[4], 5);
        assert_eq!(bytes[5], 0x00);
        let name = ReaderKind::Texture2D.canonical_name();
        let name_prefix = if name.len() < 128 { 1 } else { 2 };
        let expected_len = 10 + 1 + name_prefix + name.len() + 4 + 1 + 1 + 24;
        assert_eq!(bytes.len(), expected_len);
        assert_eq!(
            u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize,
            bytes.len()
        );

        let unpacked = Container::unpack(&bytes).unwrap();
        match unpacked.content {
            Content::Texture2D(ref texture) => {
                assert_eq!(texture.surface_format, SurfaceFormat::Rgba8);
                assert_eq!((texture.width, texture.height), (1, 1));
                assert_eq!(texture.pixels, vec![10, 20, 30, 255]);
            }
            ref other => panic!("unexpected content {}", other.kind_name()),
        }
        // Repack reproduces the same bytes.
        assert_eq!(Container::pack(&unpacked).unwrap(), bytes);
    }

    #[test]
    fn test_unknown_reader_rejected_before_payload() {
        let mut w = BinaryWriter::new();
        w.write_bytes(b"XNBw");
        w.write_u8(0x05);
        w.write_u8(0x00);
        w.write_u32(0); // patched below
        w.write_7bit(1).unwrap();
        w.write_string("BLANK").unwrap();
        w.write_i32(0);
        let total = w.position() as u32;
        w.patch_u32(FILE_SIZE_OFFSET, total + 2);
        w.write_7bit(0).unwrap();
        w.write_7bit(1).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 23);

        match Container::unpack(&bytes) {
            Err(XnbError::UnknownReader { name }) => assert_eq!(name, "BLANK"),
            other => panic!("expected UnknownReader, got {other:?}"),
        }
    }

    #[test]
    fn test_file_size_mismatch_rejected() {
        let document = texture_document(TargetPlatform::Windows);
        let mut bytes = Container::pack(&document).unwrap();
        bytes.push(0);
        assert!(matches!(
            Container::unpack(&bytes),
            Err(XnbError::Truncated { .. })
        ));
    }

    #[test]
    fn test_reader_index_out_of_range() {
        let document = texture_document(TargetPlatform::Windows);
        let mut bytes = Container::pack(&document).unwrap();
        // The root reader index is the byte right before the payload. Use
        // the largest single-byte varint; the table has one entry.
        let index_pos = bytes.len() - 24 - 1;
        bytes[index_pos] = 0x7F;
        assert!(matches!(
            Container::unpack(&bytes),
            Err(XnbError::InvalidReaderIndex {
                index: 127,
                readers: 1
            })
        ));
    }

    #[test]
    fn test_mobile_target_uses_lz4() {
        let document = texture_document(TargetPlatform::Android);
        let bytes = Container::pack(&document).unwrap();
        assert_eq!(bytes[5], 0x40);
        assert_eq!(
            u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize,
            bytes.len()
        );

        let unpacked = Container::unpack(&bytes).unwrap();
        assert_eq!(unpacked.header.compression, Compression::Lz4);
        match unpacked.content {
            Content::Texture2D(ref texture) => {
                assert_eq!(texture.pixels, vec![10, 20, 30, 255]);
            }
            ref other => panic!("unexpected content {}", other.kind_name()),
        }
    }

    #[test]
    fn test_shared_resources_rejected() {
        let document = texture_document(TargetPlatform::Windows);
        let mut bytes = Container::pack(&document).unwrap();
        // Shared-resource count sits right before the root reader index.
        let shared_pos = bytes.len() - 24 - 2;
        bytes[shared_pos] = 3;
        assert!(matches!(
            Container::unpack(&bytes),
            Err(XnbError::UnsupportedSharedResources { count: 3 })
        ));
    }
}
