//! `SoundEffect` wire codec and WAV sidecar export.

use crate::content::SoundEffect;
use crate::document::{SidecarEmit, SidecarLoad};
use crate::media;
use oxnb_core::binary::{BinaryReader, BinaryWriter};
use oxnb_core::error::{Result, XnbError};
use serde::{Deserialize, Serialize};

/// Size of the WAVEFORMATEX block carried by every sound effect.
const FORMAT_SIZE: u32 = 18;

/// Decode a sound-effect payload.
pub fn read(reader: &mut BinaryReader<'_>) -> Result<SoundEffect> {
    let format_size = reader.read_u32()?;
    if format_size != FORMAT_SIZE {
        return Err(XnbError::UnsupportedAudioFormat { format_size });
    }
    let format = reader.read_bytes(FORMAT_SIZE as usize)?.to_vec();

    let data_size = reader.read_u32()? as usize;
    let data = reader.read_bytes(data_size)?.to_vec();

    let loop_start = reader.read_i32()?;
    let loop_length = reader.read_i32()?;
    let duration = reader.read_i32()?;

    Ok(SoundEffect {
        format,
        data,
        loop_start,
        loop_length,
        duration,
    })
}

/// Encode a sound-effect payload.
pub fn write(writer: &mut BinaryWriter, sound: &SoundEffect) -> Result<()> {
    if sound.format.len() != FORMAT_SIZE as usize {
        return Err(XnbError::UnsupportedAudioFormat {
            format_size: sound.format.len() as u32,
        });
    }
    writer.write_u32(FORMAT_SIZE);
    writer.write_bytes(&sound.format);
    writer.write_u32(sound.data.len() as u32);
    writer.write_bytes(&sound.data);
    writer.write_i32(sound.loop_start);
    writer.write_i32(sound.loop_length);
    writer.write_i32(sound.duration);
    Ok(())
}

/// Document form of a sound effect: format and samples live in the WAV
/// sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundDoc {
    pub audio: String,
    pub loop_start: i32,
    pub loop_length: i32,
    pub duration: i32,
}

/// Emit the WAV sidecar and return the document form.
pub fn export(sound: &SoundEffect, emit: SidecarEmit<'_>) -> Result<SoundDoc> {
    let wav = media::wav_build(&sound.format, &sound.data)?;
    let audio = emit(&wav, ".wav")?;
    Ok(SoundDoc {
        audio,
        loop_start: sound.loop_start,
        loop_length: sound.loop_length,
        duration: sound.duration,
    })
}

/// Load the WAV sidecar back.
pub fn import(doc: &SoundDoc, load: SidecarLoad<'_>) -> Result<SoundEffect> {
    let bytes = load(&doc.audio)?;
    let (format, data) = media::wav_parse(&bytes)?;
    Ok(SoundEffect {
        format,
        data,
        loop_start: doc.loop_start,
        loop_length: doc.loop_length,
        duration: doc.duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sound() -> SoundEffect {
        let mut format = Vec::new();
        format.extend_from_slice(&1u16.to_le_bytes()); // PCM
        format.extend_from_slice(&2u16.to_le_bytes()); // stereo
        format.extend_from_slice(&44100u32.to_le_bytes());
        format.extend_from_slice(&176400u32.to_le_bytes());
        format.extend_from_slice(&4u16.to_le_bytes());
        format.extend_from_slice(&16u16.to_le_bytes());
        format.extend_from_slice(&0u16.to_le_bytes()); // cbSize
        SoundEffect {
            format,
            data: vec![0, 1, 2, 3, 4, 5, 6, 7],
            loop_start: 0,
            loop_length: 2,
            duration: 100,
        }
    }

    #[test]
    fn test_sound_roundtrip() {
        let sound = sample_sound();
        let mut w = BinaryWriter::new();
        write(&mut w, &sound).unwrap();
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        assert_eq!(read(&mut r).unwrap(), sound);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_wrong_format_size_rejected() {
        let mut w = BinaryWriter::new();
        w.write_u32(16);
        let bytes = w.into_bytes();
        let mut r = BinaryReader::new(&bytes);
        assert!(matches!(
            read(&mut r),
            Err(XnbError::UnsupportedAudioFormat { format_size: 16 })
        ));
    }

    #[test]
    fn test_export_import_via_wav() {
        let sound = sample_sound();
        let mut store: Option<Vec<u8>> = None;
        let doc = export(&sound, &mut |bytes, suffix| {
            assert_eq!(suffix, ".wav");
            store = Some(bytes.to_vec());
            Ok("beep.wav".to_string())
        })
        .unwrap();
        assert_eq!(doc.audio, "beep.wav");

        let wav = store.unwrap();
        let restored = import(&doc, &mut |name| {
            assert_eq!(name, "beep.wav");
            Ok(wav.clone())
        })
        .unwrap();
        assert_eq!(restored, sound);
    }
}
