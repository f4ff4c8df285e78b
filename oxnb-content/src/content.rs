//! In-memory content payloads.
//!
//! These are the decoded forms of the supported XNB asset types. Texture
//! pixels are straight-alpha RGBA8 (the premultiply applied on disk is
//! undone on read); item layers are flat RGBA8 buffers of the item's
//! dimensions.

use oxnb_core::error::{Result, XnbError};
use serde::{Deserialize, Serialize};

/// XNA surface formats this build understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFormat {
    /// Uncompressed RGBA8.
    Rgba8,
    /// ETC1; recognized but not decodable.
    Ect1,
    /// DXT1 (BC1) block compression.
    Dxt1,
    /// DXT3 (BC2) block compression.
    Dxt3,
    /// DXT5 (BC3) block compression.
    Dxt5,
}

impl SurfaceFormat {
    /// Decode the on-disk discriminant.
    pub fn from_i32(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Rgba8),
            2 => Ok(Self::Ect1),
            4 => Ok(Self::Dxt1),
            5 => Ok(Self::Dxt3),
            6 => Ok(Self::Dxt5),
            other => Err(XnbError::UnsupportedTextureFormat { format: other }),
        }
    }

    /// The on-disk discriminant.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Rgba8 => 0,
            Self::Ect1 => 2,
            Self::Dxt1 => 4,
            Self::Dxt3 => 5,
            Self::Dxt5 => 6,
        }
    }
}

/// A decoded 2D texture. Only mip level 0 is retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture2D {
    /// On-disk surface format (re-applied when packing).
    pub surface_format: SurfaceFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
}

/// A decoded sound effect: the raw WAVEFORMATEX block plus sample data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundEffect {
    /// The 18-byte WAVEFORMATEX block as stored on disk.
    pub format: Vec<u8>,
    /// Raw sample data.
    pub data: Vec<u8>,
    /// Loop start, in samples.
    pub loop_start: i32,
    /// Loop length, in samples.
    pub loop_length: i32,
    /// Duration in milliseconds.
    pub duration: i32,
}

/// A decoded SFD item: metadata plus layered palette-compressed art.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfdItem {
    pub file_name: String,
    pub game_name: String,
    pub equipment_layer: i32,
    pub id: String,
    pub jacket_under_belt: bool,
    pub can_equip: bool,
    pub can_script: bool,
    pub color_palette: String,
    /// Layer width in pixels.
    pub width: i32,
    /// Layer height in pixels.
    pub height: i32,
    /// Sprite parts, outermost list first.
    pub parts: Vec<ItemPart>,
}

/// One part of an item: a type tag plus its optional image layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPart {
    /// Part type tag.
    pub part_type: i32,
    /// Image layers; `None` marks an absent layer. Present layers are
    /// RGBA8 buffers of the item's `width * height`.
    pub layers: Vec<Option<Vec<u8>>>,
}

/// A decoded SFD animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<AnimationFrame>,
}

impl Animation {
    /// Whether this is a recoil animation (named so by convention).
    pub fn is_recoil(&self) -> bool {
        self.name.contains("RECOIL")
    }
}

/// One frame of an animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub event: String,
    pub time: i32,
    pub collisions: Vec<FrameCollision>,
    pub parts: Vec<FramePart>,
}

/// A collision rectangle attached to a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCollision {
    pub id: i32,
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

/// One body part's placement within a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePart {
    /// Global part id; `local_id` and `type_id` derive from it.
    pub id: i32,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub flip: i32,
    pub scale_x: f32,
    pub scale_y: f32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postfix: String,
}

impl FramePart {
    /// Part id within its type group.
    pub fn local_id(&self) -> i32 {
        self.id % 50
    }

    /// Part type: the global id divided by the group size of 50, with
    /// negative ids always biased down into the next group.
    pub fn type_id(&self) -> i32 {
        if self.id >= 0 {
            self.id / 50
        } else {
            -(-self.id / 50 + 1)
        }
    }
}

/// A decoded XNB payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Texture2D(Texture2D),
    SoundEffect(SoundEffect),
    Item(SfdItem),
    Animations(Vec<Animation>),
}

impl Content {
    /// Short name of the payload kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Texture2D(_) => "Texture2D",
            Self::SoundEffect(_) => "SoundEffect",
            Self::Item(_) => "Item",
            Self::Animations(_) => "Animations",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_format_discriminants() {
        for value in [0, 2, 4, 5, 6] {
            assert_eq!(SurfaceFormat::from_i32(value).unwrap().as_i32(), value);
        }
        assert!(matches!(
            SurfaceFormat::from_i32(1),
            Err(XnbError::UnsupportedTextureFormat { format: 1 })
        ));
    }

    #[test]
    fn test_frame_part_derived_ids() {
        let part = |id| FramePart {
            id,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            flip: 0,
            scale_x: 1.0,
            scale_y: 1.0,
            postfix: String::new(),
        };
        assert_eq!(part(0).type_id(), 0);
        assert_eq!(part(0).local_id(), 0);
        assert_eq!(part(103).type_id(), 2);
        assert_eq!(part(103).local_id(), 3);
        assert_eq!(part(49).type_id(), 0);
        assert_eq!(part(50).type_id(), 1);
        // Negative ids always land in the next group down.
        assert_eq!(part(-1).type_id(), -1);
        assert_eq!(part(-1).local_id(), -1);
        assert_eq!(part(-50).type_id(), -2);
        assert_eq!(part(-51).type_id(), -2);
    }

    #[test]
    fn test_recoil_flag() {
        let anim = |name: &str| Animation {
            name: name.to_string(),
            frames: Vec::new(),
        };
        assert!(anim("UpperRECOIL1").is_recoil());
        assert!(!anim("WalkCycle").is_recoil());
    }
}
