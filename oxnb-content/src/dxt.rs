//! DXT (S3TC) block compression, delegated to `texpresso`.

use crate::content::SurfaceFormat;
use oxnb_core::error::{Result, XnbError};
use texpresso::{Format, Params};

fn bc_format(format: SurfaceFormat) -> Result<Format> {
    match format {
        SurfaceFormat::Dxt1 => Ok(Format::Bc1),
        SurfaceFormat::Dxt3 => Ok(Format::Bc2),
        SurfaceFormat::Dxt5 => Ok(Format::Bc3),
        other => Err(XnbError::UnsupportedTextureFormat {
            format: other.as_i32(),
        }),
    }
}

/// Decompress DXT block data into RGBA8 pixels.
pub fn decompress(
    format: SurfaceFormat,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let bc = bc_format(format)?;
    let (width, height) = (width as usize, height as usize);
    let expected = bc.compressed_size(width, height);
    if data.len() < expected {
        return Err(XnbError::truncated(expected, data.len()));
    }
    let mut pixels = vec![0u8; width * height * 4];
    bc.decompress(data, width, height, &mut pixels);
    Ok(pixels)
}

/// Compress RGBA8 pixels into DXT block data.
pub fn compress(format: SurfaceFormat, rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let bc = bc_format(format)?;
    let (width, height) = (width as usize, height as usize);
    if rgba.len() != width * height * 4 {
        return Err(XnbError::sidecar(format!(
            "pixel buffer of {} bytes does not match {width}x{height}",
            rgba.len()
        )));
    }
    let mut out = vec![0u8; bc.compressed_size(width, height)];
    bc.compress(rgba, width, height, Params::default(), &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dxt1_roundtrip_on_flat_color() {
        // A single flat-color 4x4 block survives BC1 exactly.
        let pixels: Vec<u8> = std::iter::repeat([0u8, 255, 0, 255])
            .take(16)
            .flatten()
            .collect();
        let compressed = compress(SurfaceFormat::Dxt1, &pixels, 4, 4).unwrap();
        assert_eq!(compressed.len(), 8);
        let decompressed = decompress(SurfaceFormat::Dxt1, &compressed, 4, 4).unwrap();
        assert_eq!(decompressed, pixels);
    }

    #[test]
    fn test_rgba_is_not_a_block_format() {
        assert!(matches!(
            compress(SurfaceFormat::Rgba8, &[0; 64], 4, 4),
            Err(XnbError::UnsupportedTextureFormat { format: 0 })
        ));
    }
}
