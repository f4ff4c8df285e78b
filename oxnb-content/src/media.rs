//! PNG and RIFF/WAVE sidecar encoding.
//!
//! PNG work is delegated to the `image` crate; the WAV layout is fixed
//! enough (RIFF header, 16-byte PCM `fmt ` chunk, `data` chunk) to write
//! and scan directly.

use oxnb_core::error::{Result, XnbError};
use std::io::Cursor;

/// Encode straight-alpha RGBA8 pixels as a PNG.
pub fn png_encode(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
        XnbError::sidecar(format!(
            "pixel buffer of {} bytes does not match {width}x{height}",
            pixels.len()
        ))
    })?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| XnbError::sidecar(format!("PNG encode: {e}")))?;
    Ok(out)
}

/// Decode a PNG into RGBA8 pixels plus dimensions.
pub fn png_decode(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map_err(|e| XnbError::sidecar(format!("PNG decode: {e}")))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok((img.into_raw(), width, height))
}

/// Synthesize a RIFF/WAVE file from a WAVEFORMATEX block and sample data.
///
/// The `fmt ` chunk carries the first 16 bytes of the format block; the
/// trailing `cbSize` field is dropped, as PCM sidecars carry no extension.
pub fn wav_build(format: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if format.len() < 16 {
        return Err(XnbError::sidecar(format!(
            "audio format block is {} bytes, need at least 16",
            format.len()
        )));
    }
    let mut out = Vec::with_capacity(44 + data.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&format[..16]);
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    Ok(out)
}

/// Scan a RIFF/WAVE file for its format block and sample data.
///
/// Unknown chunks are skipped; only `fmt ` and `data` are required. The
/// returned format block is padded back to the 18-byte WAVEFORMATEX shape
/// with a zero `cbSize`.
pub fn wav_parse(bytes: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    if bytes.len() < 12 || &bytes[..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(XnbError::sidecar("not a RIFF/WAVE file"));
    }

    let mut format: Option<Vec<u8>> = None;
    let mut data: Option<Vec<u8>> = None;
    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        let body_start = pos + 8;
        let body_end = body_start + size;
        if body_end > bytes.len() {
            return Err(XnbError::sidecar("RIFF chunk overruns the file"));
        }
        match id {
            b"fmt " => {
                if size < 16 {
                    return Err(XnbError::sidecar("fmt chunk shorter than 16 bytes"));
                }
                let mut block = bytes[body_start..body_start + 16].to_vec();
                block.extend_from_slice(&[0, 0]);
                format = Some(block);
            }
            b"data" => {
                data = Some(bytes[body_start..body_end].to_vec());
            }
            _ => {}
        }
        // Chunks are word-aligned.
        pos = body_end + (size & 1);
    }

    match (format, data) {
        (Some(format), Some(data)) => Ok((format, data)),
        (None, _) => Err(XnbError::sidecar("WAV file has no fmt chunk")),
        (_, None) => Err(XnbError::sidecar("WAV file has no data chunk")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_format() -> Vec<u8> {
        // PCM, mono, 22050 Hz, 16-bit.
        let mut f = Vec::new();
        f.extend_from_slice(&1u16.to_le_bytes());
        f.extend_from_slice(&1u16.to_le_bytes());
        f.extend_from_slice(&22050u32.to_le_bytes());
        f.extend_from_slice(&44100u32.to_le_bytes());
        f.extend_from_slice(&2u16.to_le_bytes());
        f.extend_from_slice(&16u16.to_le_bytes());
        f.extend_from_slice(&0u16.to_le_bytes());
        f
    }

    #[test]
    fn test_png_roundtrip() {
        let pixels = vec![10, 20, 30, 255, 40, 50, 60, 128];
        let png = png_encode(&pixels, 2, 1).unwrap();
        let (decoded, w, h) = png_decode(&png).unwrap();
        assert_eq!((w, h), (2, 1));
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_png_size_mismatch() {
        assert!(png_encode(&[0, 0, 0, 255], 2, 2).is_err());
    }

    #[test]
    fn test_wav_roundtrip() {
        let format = pcm_format();
        let data = vec![0u8, 1, 2, 3, 4, 5];
        let wav = wav_build(&format, &data).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(wav.len(), 44 + data.len());

        let (parsed_format, parsed_data) = wav_parse(&wav).unwrap();
        assert_eq!(parsed_format, format);
        assert_eq!(parsed_data, data);
    }

    #[test]
    fn test_wav_extra_chunks_skipped() {
        let format = pcm_format();
        let data = vec![9u8, 8, 7, 6];
        let mut wav = wav_build(&format, &data).unwrap();
        // Append a LIST chunk after data; the scan must ignore it.
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&4u32.to_le_bytes());
        wav.extend_from_slice(b"INFO");

        let (_, parsed_data) = wav_parse(&wav).unwrap();
        assert_eq!(parsed_data, data);
    }

    #[test]
    fn test_wav_rejects_non_riff() {
        assert!(wav_parse(b"OggS....").is_err());
    }
}
