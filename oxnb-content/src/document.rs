//! Sidecar-aware document serialization.
//!
//! A [`Document`] is the decoded form of one XNB file: header, reader
//! table, typed payload. Its JSON form keeps binary media out of the text:
//! pixels and samples are routed through the `emit_sidecar` callback and
//! only the returned filenames land in the document. The two callbacks are
//! the core's only I/O seam; nothing here touches the filesystem.

use crate::content::{Animation, Content};
use crate::header::XnbHeader;
use crate::readers::{item, sound, texture};
use crate::registry::{ReaderEntry, ReaderKind};
use oxnb_core::error::{Result, XnbError};
use serde::{Deserialize, Serialize};

/// Writes one sidecar file: `(bytes, name_suffix) -> filename`.
///
/// The suffix carries the extension and, for item layers, the part tag and
/// sequence (e.g. `"_4_0.png"`); the callback decides the base name and
/// returns the full filename recorded in the document.
pub type SidecarEmit<'a> = &'a mut dyn FnMut(&[u8], &str) -> Result<String>;

/// Reads one sidecar file back: `filename -> bytes`.
pub type SidecarLoad<'a> = &'a mut dyn FnMut(&str) -> Result<Vec<u8>>;

/// A decoded XNB file.
#[derive(Debug, Clone)]
pub struct Document {
    /// Parsed header fields.
    pub header: XnbHeader,
    /// Reader table in file order; the first entry decodes the payload.
    pub readers: Vec<ReaderEntry>,
    /// The typed payload.
    pub content: Content,
}

/// Serialized shape of the reader table rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReaderRepr {
    #[serde(rename = "type")]
    type_name: String,
    version: i32,
}

/// Serialized shape of the payload; media fields hold sidecar filenames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ContentRepr {
    Texture2d(texture::TextureDoc),
    SoundEffect(sound::SoundDoc),
    Item(item::ItemDoc),
    Animations { animations: Vec<Animation> },
}

/// Serialized shape of a whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentRepr {
    header: XnbHeader,
    readers: Vec<ReaderRepr>,
    content: ContentRepr,
}

impl Document {
    /// Serialize to pretty JSON, emitting media sidecars along the way.
    pub fn to_json(&self, emit: SidecarEmit<'_>) -> Result<String> {
        let content = match &self.content {
            Content::Texture2D(texture) => ContentRepr::Texture2d(texture::export(texture, emit)?),
            Content::SoundEffect(sound) => ContentRepr::SoundEffect(sound::export(sound, emit)?),
            Content::Item(item) => ContentRepr::Item(item::export(item, emit)?),
            Content::Animations(animations) => ContentRepr::Animations {
                animations: animations.clone(),
            },
        };
        let repr = DocumentRepr {
            header: self.header,
            readers: self
                .readers
                .iter()
                .map(|entry| ReaderRepr {
                    type_name: entry.type_name.clone(),
                    version: entry.version,
                })
                .collect(),
            content,
        };
        serde_json::to_string_pretty(&repr).map_err(|e| XnbError::document(e.to_string()))
    }

    /// Deserialize from JSON, loading media sidecars along the way.
    pub fn from_json(text: &str, load: SidecarLoad<'_>) -> Result<Self> {
        let repr: DocumentRepr =
            serde_json::from_str(text).map_err(|e| XnbError::document(e.to_string()))?;

        let content = match &repr.content {
            ContentRepr::Texture2d(doc) => Content::Texture2D(texture::import(doc, load)?),
            ContentRepr::SoundEffect(doc) => Content::SoundEffect(sound::import(doc, load)?),
            ContentRepr::Item(doc) => Content::Item(item::import(doc, load)?),
            ContentRepr::Animations { animations } => Content::Animations(animations.clone()),
        };

        let mut readers = Vec::with_capacity(repr.readers.len());
        for reader in &repr.readers {
            readers.push(ReaderEntry {
                kind: ReaderKind::resolve(&reader.type_name)?,
                type_name: reader.type_name.clone(),
                version: reader.version,
            });
        }

        Ok(Self {
            header: repr.header,
            readers,
            content,
        })
    }
}
