//! `Texture2D` wire codec and PNG sidecar export.
//!
//! On disk a texture is stored with premultiplied alpha and, for the DXT
//! formats, block compression. Reading undoes both; writing reapplies them.
//! Mip levels past the first are read and dropped.

use crate::content::{SurfaceFormat, Texture2D};
use crate::document::{SidecarEmit, SidecarLoad};
use crate::{dxt, media};
use oxnb_core::binary::{BinaryReader, BinaryWriter};
use oxnb_core::error::{Result, XnbError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Decode a texture payload.
pub fn read(reader: &mut BinaryReader<'_>) -> Result<Texture2D> {
    let surface_format = SurfaceFormat::from_i32(reader.read_i32()?)?;
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;

    let mip_count = reader.read_u32()?;
    if mip_count == 0 {
        return Err(XnbError::document("texture has no mip levels"));
    }
    if mip_count > 1 {
        warn!("texture has {mip_count} mip levels, keeping level 0 only");
    }

    let data_size = reader.read_u32()? as usize;
    let data = reader.read_bytes(data_size)?;
    let mut pixels = match surface_format {
        SurfaceFormat::Rgba8 => data.to_vec(),
        SurfaceFormat::Ect1 => {
            return Err(XnbError::UnsupportedTextureFormat {
                format: surface_format.as_i32(),
            })
        }
        compressed => dxt::decompress(compressed, data, width, height)?,
    };
    if pixels.len() != (width * height * 4) as usize {
        return Err(XnbError::document(format!(
            "texture data is {} bytes, expected {} for {width}x{height}",
            pixels.len(),
            width * height * 4
        )));
    }

    // Drop the remaining mip chain.
    for _ in 1..mip_count {
        let size = reader.read_u32()? as usize;
        reader.read_bytes(size)?;
    }

    unpremultiply(&mut pixels);

    Ok(Texture2D {
        surface_format,
        width,
        height,
        pixels,
    })
}

/// Encode a texture payload. Always writes a single mip level.
pub fn write(writer: &mut BinaryWriter, texture: &Texture2D) -> Result<()> {
    writer.write_i32(texture.surface_format.as_i32());
    writer.write_u32(texture.width);
    writer.write_u32(texture.height);
    writer.write_u32(1);

    let mut pixels = texture.pixels.clone();
    premultiply(&mut pixels);
    let data = match texture.surface_format {
        SurfaceFormat::Rgba8 => pixels,
        SurfaceFormat::Ect1 => {
            return Err(XnbError::UnsupportedTextureFormat {
                format: texture.surface_format.as_i32(),
            })
        }
        compressed => dxt::compress(compressed, &pixels, texture.width, texture.height)?,
    };
    writer.write_u32(data.len() as u32);
    writer.write_bytes(&data);
    Ok(())
}

/// Document form of a texture: pixels live in a PNG sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextureDoc {
    pub format: i32,
    pub width: u32,
    pub height: u32,
    pub image: String,
}

/// Emit the PNG sidecar and return the document form.
pub fn export(texture: &Texture2D, emit: SidecarEmit<'_>) -> Result<TextureDoc> {
    let png = media::png_encode(&texture.pixels, texture.width, texture.height)?;
    let image = emit(&png, ".png")?;
    Ok(TextureDoc {
        format: texture.surface_format.as_i32(),
        width: texture.width,
        height: texture.height,
        image,
    })
}

/// Load the PNG sidecar back. The image's own dimensions win, so an edited
/// sidecar may resize the texture.
pub fn import(doc: &TextureDoc, load: SidecarLoad<'_>) -> Result<Texture2D> {
    let bytes = load(&doc.image)?;
    let (pixels, width, height) = media::png_decode(&bytes)?;
    Ok(Texture2D {
        surface_format: SurfaceFormat::from_i32(doc.format)?,
        width,
        height,
        pixels,
    })
}

/// Undo premultiplied alpha: `c' = min(255, ceil(c * 255 / a))`.
fn unpremultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 {
            continue;
        }
        for c in &mut px[..3] {
            let scaled = (*c as u32 * 255).div_ceil(a);
            *c = scaled.min(255) as u8;
        }
    }
}

/// Apply premultiplied alpha: `c' = floor(c * a / 255)`.
fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u32;
        for c in &mut px[..3] {
            *c = (*c as u32 * a / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_texture_roundtrip() {
        let texture = Texture2D {
            surface_format: SurfaceFormat::Rgba8,
            width: 1,
            height: 1,
            pixels: vec![10, 20, 30, 255],
        };
        let mut w = BinaryWriter::new();
        write(&mut w, &texture).unwrap();
        let bytes = w.into_bytes();
        // format + width + height + mips + data_size + 4 pixel bytes
        assert_eq!(bytes.len(), 24);

        let mut r = BinaryReader::new(&bytes);
        let decoded = read(&mut r).unwrap();
        assert_eq!(decoded, texture);
    }

    #[test]
    fn test_alpha_unpremultiply_on_read() {
        let mut w = BinaryWriter::new();
        w.write_i32(0);
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32(4);
        w.write_bytes(&[64, 0, 0, 128]);
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        let decoded = read(&mut r).unwrap();
        assert_eq!(decoded.pixels, vec![128, 0, 0, 128]);

        // Repacking restores the on-disk premultiplied value.
        let mut w = BinaryWriter::new();
        write(&mut w, &decoded).unwrap();
        assert_eq!(&w.as_bytes()[20..], &[64, 0, 0, 128]);
    }

    #[test]
    fn test_premultiply_roundtrip_at_alpha_extremes() {
        for color in [[0u8, 0, 0], [255, 255, 255], [17, 99, 201]] {
            for alpha in [0u8, 255] {
                let mut px = vec![color[0], color[1], color[2], alpha];
                let original = px.clone();
                unpremultiply(&mut px);
                premultiply(&mut px);
                assert_eq!(px, original, "color {color:?} alpha {alpha}");
            }
        }
        // Opaque pixels are fixed points of the un-premultiply.
        let mut px = vec![42, 160, 7, 255];
        unpremultiply(&mut px);
        assert_eq!(px, vec![42, 160, 7, 255]);
    }

    #[test]
    fn test_extra_mips_dropped() {
        let mut w = BinaryWriter::new();
        w.write_i32(0);
        w.write_u32(2);
        w.write_u32(1);
        w.write_u32(2); // two mip levels
        w.write_u32(8);
        w.write_bytes(&[1, 2, 3, 255, 4, 5, 6, 255]);
        w.write_u32(4);
        w.write_bytes(&[9, 9, 9, 255]);
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        let decoded = read(&mut r).unwrap();
        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.pixels.len(), 8);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_ect1_rejected() {
        let mut w = BinaryWriter::new();
        w.write_i32(2);
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32(1);
        w.write_u32(4);
        w.write_bytes(&[0, 0, 0, 0]);
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        assert!(matches!(
            read(&mut r),
            Err(XnbError::UnsupportedTextureFormat { format: 2 })
        ));
    }
}
