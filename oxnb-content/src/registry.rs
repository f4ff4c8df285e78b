//! The reader table: which content readers an XNB file declares, and how a
//! payload dispatches to them.
//!
//! Readers are a closed set, modelled as an enum rather than trait objects;
//! the registry preserves the file's table order and resolves the 1-based
//! reader indices embedded in payloads.

use crate::content::Content;
use crate::readers;
use oxnb_core::binary::{BinaryReader, BinaryWriter};
use oxnb_core::error::{Result, XnbError};
use oxnb_core::typename::TypeName;

/// The content readers this build understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    Texture2D,
    SoundEffect,
    Item,
    Animations,
}

impl ReaderKind {
    /// Resolve an assembly-qualified reader type name. The assembly
    /// qualifier is ignored for matching.
    pub fn resolve(type_name: &str) -> Result<Self> {
        let parsed = TypeName::parse(type_name);
        match parsed.name.as_str() {
            "Microsoft.Xna.Framework.Content.Texture2DReader" => Ok(Self::Texture2D),
            "Microsoft.Xna.Framework.Content.SoundEffectReader" => Ok(Self::SoundEffect),
            "SFD.Content.ItemsContentTypeReader" => Ok(Self::Item),
            "SFD.Content.AnimationsContentTypeReader" => Ok(Self::Animations),
            _ => Err(XnbError::unknown_reader(type_name)),
        }
    }

    /// The reader kind responsible for a payload.
    pub fn for_content(content: &Content) -> Self {
        match content {
            Content::Texture2D(_) => Self::Texture2D,
            Content::SoundEffect(_) => Self::SoundEffect,
            Content::Item(_) => Self::Item,
            Content::Animations(_) => Self::Animations,
        }
    }

    /// Canonical assembly-qualified type name, used when a document does
    /// not carry one of its own.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Texture2D => {
                "Microsoft.Xna.Framework.Content.Texture2DReader, Microsoft.Xna.Framework.Graphics, Version=4.0.0.0, Culture=neutral, PublicKeyToken=842cf8be1de50553"
            }
            Self::SoundEffect => {
                "Microsoft.Xna.Framework.Content.SoundEffectReader, Microsoft.Xna.Framework, Version=4.0.0.0, Culture=neutral, PublicKeyToken=842cf8be1de50553"
            }
            Self::Item => "SFD.Content.ItemsContentTypeReader",
            Self::Animations => "SFD.Content.AnimationsContentTypeReader",
        }
    }

    /// Whether payloads of this reader carry a reader index when nested
    /// inside another payload. All four readers decode reference types, so
    /// all are polymorphic; none of the four formats nests readers today.
    pub fn is_polymorphic(self) -> bool {
        true
    }

    /// Decode a payload of this kind.
    pub fn read_from(
        self,
        reader: &mut BinaryReader<'_>,
        _registry: &ReaderRegistry,
    ) -> Result<Content> {
        match self {
            Self::Texture2D => Ok(Content::Texture2D(readers::texture::read(reader)?)),
            Self::SoundEffect => Ok(Content::SoundEffect(readers::sound::read(reader)?)),
            Self::Item => Ok(Content::Item(readers::item::read(reader)?)),
            Self::Animations => Ok(Content::Animations(readers::animation::read(reader)?)),
        }
    }

    /// Encode a payload of this kind.
    pub fn write_to(
        self,
        writer: &mut BinaryWriter,
        content: &Content,
        _registry: &ReaderRegistry,
    ) -> Result<()> {
        match (self, content) {
            (Self::Texture2D, Content::Texture2D(texture)) => {
                readers::texture::write(writer, texture)
            }
            (Self::SoundEffect, Content::SoundEffect(sound)) => {
                readers::sound::write(writer, sound)
            }
            (Self::Item, Content::Item(item)) => readers::item::write(writer, item),
            (Self::Animations, Content::Animations(animations)) => {
                readers::animation::write(writer, animations)
            }
            (kind, content) => Err(XnbError::type_mismatch(
                format!("{kind:?}"),
                content.kind_name(),
            )),
        }
    }
}

/// One row of the reader table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderEntry {
    /// Resolved reader.
    pub kind: ReaderKind,
    /// The type name exactly as stored in the file.
    pub type_name: String,
    /// Reader version from the file.
    pub version: i32,
}

/// The ordered reader table of one XNB file.
#[derive(Debug, Clone, Default)]
pub struct ReaderRegistry {
    entries: Vec<ReaderEntry>,
}

impl ReaderRegistry {
    /// Build a registry from resolved entries.
    pub fn new(entries: Vec<ReaderEntry>) -> Self {
        Self { entries }
    }

    /// The table rows, in file order.
    pub fn entries(&self) -> &[ReaderEntry] {
        &self.entries
    }

    /// Resolve a 1-based reader index (0 is the reserved null payload).
    pub fn get(&self, index: i32) -> Result<&ReaderEntry> {
        if index < 1 || index as usize > self.entries.len() {
            return Err(XnbError::InvalidReaderIndex {
                index,
                readers: self.entries.len(),
            });
        }
        Ok(&self.entries[index as usize - 1])
    }

    /// Read the reader table: a 7-bit count, then name/version rows. Every
    /// name must resolve.
    pub fn read_table(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let count = reader.read_7bit()?;
        let mut entries = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            let type_name = reader.read_string()?;
            let version = reader.read_i32()?;
            let kind = ReaderKind::resolve(&type_name)?;
            entries.push(ReaderEntry {
                kind,
                type_name,
                version,
            });
        }
        Ok(Self { entries })
    }

    /// Write the reader table.
    pub fn write_table(&self, writer: &mut BinaryWriter) -> Result<()> {
        writer.write_7bit(self.entries.len() as i32)?;
        for entry in &self.entries {
            writer.write_string(&entry.type_name)?;
            writer.write_i32(entry.version);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ignores_assembly() {
        let kind = ReaderKind::resolve(
            "Microsoft.Xna.Framework.Content.Texture2DReader, Microsoft.Xna.Framework.Graphics, Version=4.0.0.0",
        )
        .unwrap();
        assert_eq!(kind, ReaderKind::Texture2D);

        assert_eq!(
            ReaderKind::resolve("SFD.Content.AnimationsContentTypeReader").unwrap(),
            ReaderKind::Animations
        );
    }

    #[test]
    fn test_resolve_unknown_reader() {
        assert!(matches!(
            ReaderKind::resolve("BLANK"),
            Err(XnbError::UnknownReader { .. })
        ));
    }

    #[test]
    fn test_index_bounds() {
        let registry = ReaderRegistry::new(vec![
            ReaderEntry {
                kind: ReaderKind::Texture2D,
                type_name: ReaderKind::Texture2D.canonical_name().to_string(),
                version: 0,
            };
            4
        ]);
        assert!(registry.get(1).is_ok());
        assert!(registry.get(4).is_ok());
        assert!(matches!(
            registry.get(0),
            Err(XnbError::InvalidReaderIndex { index: 0, .. })
        ));
        assert!(matches!(
            registry.get(255),
            Err(XnbError::InvalidReaderIndex {
                index: 255,
                readers: 4
            })
        ));
    }

    #[test]
    fn test_table_roundtrip() {
        let registry = ReaderRegistry::new(vec![ReaderEntry {
            kind: ReaderKind::Item,
            type_name: "SFD.Content.ItemsContentTypeReader, SFD".to_string(),
            version: 0,
        }]);
        let mut w = BinaryWriter::new();
        registry.write_table(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        let parsed = ReaderRegistry::read_table(&mut r).unwrap();
        assert_eq!(parsed.entries(), registry.entries());
    }
}
