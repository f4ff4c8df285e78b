//! XNB file header: magic, target platform, format version, flags.

use oxnb_core::binary::{BinaryReader, BinaryWriter};
use oxnb_core::error::{Result, XnbError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Magic bytes at the start of every XNB file.
pub const MAGIC: &[u8; 3] = b"XNB";

/// Flag bit marking a HiDef (as opposed to Reach) profile asset.
const FLAG_HIDEF: u8 = 0x01;
/// Flag bit marking an LZ4-compressed payload (mobile targets).
const FLAG_LZ4: u8 = 0x40;
/// Flag bit marking an LZX-compressed payload (desktop targets).
const FLAG_LZX: u8 = 0x80;

/// Target platform of an XNB file, stored as one lowercase ASCII char.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlatform {
    /// `'w'` - Windows (desktop).
    Windows,
    /// `'m'` - Windows Phone.
    WindowsPhone,
    /// `'x'` - Xbox 360.
    Xbox360,
    /// `'a'` - Android.
    Android,
    /// `'i'` - iOS.
    Ios,
    /// Any other platform char, preserved for round-tripping.
    Other(char),
}

impl TargetPlatform {
    /// Decode a platform char. Unknown chars warn and are preserved.
    pub fn from_char(c: char) -> Self {
        match c {
            'w' => Self::Windows,
            'm' => Self::WindowsPhone,
            'x' => Self::Xbox360,
            'a' => Self::Android,
            'i' => Self::Ios,
            other => {
                warn!("unknown XNB target platform '{other}', continuing");
                Self::Other(other)
            }
        }
    }

    /// The on-disk platform char.
    pub fn as_char(self) -> char {
        match self {
            Self::Windows => 'w',
            Self::WindowsPhone => 'm',
            Self::Xbox360 => 'x',
            Self::Android => 'a',
            Self::Ios => 'i',
            Self::Other(c) => c,
        }
    }

    /// Whether packed output for this platform uses the LZ4 block codec.
    pub fn uses_lz4(self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }
}

/// Compression scheme of an XNB payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Payload stored uncompressed.
    #[default]
    None,
    /// Payload compressed with chunked LZX.
    Lzx,
    /// Payload compressed with a single LZ4 block.
    Lz4,
}

/// Parsed XNB header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XnbHeader {
    /// Target platform char.
    pub target_platform: TargetPlatform,
    /// XNB format version (3, 4 or 5).
    pub xnb_version: u8,
    /// HiDef profile flag.
    pub hidef: bool,
    /// Payload compression scheme.
    pub compression: Compression,
}

impl XnbHeader {
    /// Parse the six fixed header bytes (magic through flags).
    ///
    /// Unknown platform chars and versions warn and continue; a wrong magic
    /// aborts.
    pub fn parse(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let magic = reader.read_bytes(3)?;
        if magic != MAGIC {
            return Err(XnbError::bad_magic(magic));
        }

        let target_platform = TargetPlatform::from_char(reader.read_char()?);
        let xnb_version = reader.read_u8()?;
        if !matches!(xnb_version, 3..=5) {
            warn!("unknown XNB format version {xnb_version}, continuing");
        }

        let flags = reader.read_u8()?;
        let hidef = flags & FLAG_HIDEF != 0;
        let compression = if flags & FLAG_LZX != 0 {
            Compression::Lzx
        } else if flags & FLAG_LZ4 != 0 {
            Compression::Lz4
        } else {
            Compression::None
        };

        Ok(Self {
            target_platform,
            xnb_version,
            hidef,
            compression,
        })
    }

    /// Emit the six fixed header bytes.
    pub fn emit(&self, writer: &mut BinaryWriter) {
        writer.write_bytes(MAGIC);
        writer.write_char(self.target_platform.as_char());
        writer.write_u8(self.xnb_version);
        let mask = match self.compression {
            Compression::None => 0,
            Compression::Lzx => FLAG_LZX,
            Compression::Lz4 => FLAG_LZ4,
        };
        writer.write_u8(u8::from(self.hidef) | mask);
    }
}
