//! SFD item wire codec and per-layer PNG sidecar export.
//!
//! Item art is palette-compressed: a table of up to 255 RGBA colors,
//! followed by parts whose layers encode each pixel as either a
//! repeat-previous flag or a palette index. The color register starts
//! transparent on read but at the last palette color on write; both sides
//! of that asymmetry are the format's.

use crate::content::{ItemPart, SfdItem};
use crate::document::{SidecarEmit, SidecarLoad};
use crate::media;
use crate::readers::expect_newline;
use oxnb_core::binary::{BinaryReader, BinaryWriter};
use oxnb_core::error::{Result, XnbError};
use serde::{Deserialize, Serialize};

/// Largest palette the one-byte length prefix can carry.
const MAX_PALETTE: usize = 255;

/// Decode an item payload.
pub fn read(reader: &mut BinaryReader<'_>) -> Result<SfdItem> {
    let file_name = reader.read_string()?;
    let game_name = reader.read_string()?;
    let equipment_layer = reader.read_i32()?;
    let id = reader.read_string()?;
    let jacket_under_belt = reader.read_bool()?;
    let can_equip = reader.read_bool()?;
    let can_script = reader.read_bool()?;
    let color_palette = reader.read_string()?;
    let width = reader.read_i32()?;
    let height = reader.read_i32()?;

    let palette_len = reader.read_u8()? as usize;
    let mut palette = Vec::with_capacity(palette_len);
    for _ in 0..palette_len {
        let c = reader.read_bytes(4)?;
        palette.push([c[0], c[1], c[2], c[3]]);
    }

    let part_count = reader.read_i32()?;
    expect_newline(reader)?;

    let mut parts = Vec::with_capacity(part_count.max(0) as usize);
    for _ in 0..part_count {
        let part_type = reader.read_i32()?;
        let layer_count = reader.read_i32()?;
        let mut layers = Vec::with_capacity(layer_count.max(0) as usize);
        for _ in 0..layer_count {
            let present = reader.read_bool()?;
            let layer = if present {
                Some(read_layer(reader, width, height, &palette)?)
            } else {
                None
            };
            expect_newline(reader)?;
            layers.push(layer);
        }
        parts.push(ItemPart { part_type, layers });
    }

    Ok(SfdItem {
        file_name,
        game_name,
        equipment_layer,
        id,
        jacket_under_belt,
        can_equip,
        can_script,
        color_palette,
        width,
        height,
        parts,
    })
}

fn read_layer(
    reader: &mut BinaryReader<'_>,
    width: i32,
    height: i32,
    palette: &[[u8; 4]],
) -> Result<Vec<u8>> {
    let count = (width * height).max(0) as usize;
    let mut pixels = vec![0u8; count * 4];
    let mut register = [0u8; 4];
    for i in 0..count {
        let repeat = reader.read_bool()?;
        if !repeat {
            let index = reader.read_u8()?;
            register = *palette
                .get(index as usize)
                .ok_or(XnbError::PaletteIndexOutOfRange {
                    index,
                    palette: palette.len(),
                })?;
        }
        pixels[i * 4..i * 4 + 4].copy_from_slice(&register);
    }
    Ok(pixels)
}

/// Encode an item payload, rebuilding the palette from the layer pixels.
pub fn write(writer: &mut BinaryWriter, item: &SfdItem) -> Result<()> {
    writer.write_string(&item.file_name)?;
    writer.write_string(&item.game_name)?;
    writer.write_i32(item.equipment_layer);
    writer.write_string(&item.id)?;
    writer.write_bool(item.jacket_under_belt);
    writer.write_bool(item.can_equip);
    writer.write_bool(item.can_script);
    writer.write_string(&item.color_palette)?;
    writer.write_i32(item.width);
    writer.write_i32(item.height);

    let palette = build_palette(item);
    writer.write_u8(palette.len() as u8);
    for color in &palette {
        writer.write_bytes(color);
    }

    writer.write_i32(item.parts.len() as i32);
    writer.write_char('\n');

    for part in &item.parts {
        writer.write_i32(part.part_type);
        writer.write_i32(part.layers.len() as i32);
        for layer in &part.layers {
            match layer {
                Some(pixels) => {
                    writer.write_bool(true);
                    write_layer(writer, pixels, &palette)?;
                }
                None => writer.write_bool(false),
            }
            writer.write_char('\n');
        }
    }
    Ok(())
}

/// Collect the distinct layer colors in encounter order, up to the palette
/// limit. Colors past the limit are left out and surface as
/// [`XnbError::PaletteMiss`] during encoding.
fn build_palette(item: &SfdItem) -> Vec<[u8; 4]> {
    let mut palette: Vec<[u8; 4]> = Vec::new();
    for part in &item.parts {
        for pixels in part.layers.iter().flatten() {
            for px in pixels.chunks_exact(4) {
                let color = [px[0], px[1], px[2], px[3]];
                if !palette.contains(&color) && palette.len() < MAX_PALETTE {
                    palette.push(color);
                }
            }
        }
    }
    palette
}

fn write_layer(writer: &mut BinaryWriter, pixels: &[u8], palette: &[[u8; 4]]) -> Result<()> {
    let mut register = *palette.last().unwrap_or(&[0, 0, 0, 0]);
    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        if color == register {
            writer.write_bool(true);
        } else {
            writer.write_bool(false);
            let index = palette
                .iter()
                .position(|c| *c == color)
                .ok_or(XnbError::PaletteMiss { color })?;
            writer.write_u8(index as u8);
            register = color;
        }
    }
    Ok(())
}

/// Document form of an item: layers live in PNG sidecars, absent or empty
/// layers as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDoc {
    pub file_name: String,
    pub game_name: String,
    pub equipment_layer: i32,
    pub id: String,
    pub jacket_under_belt: bool,
    pub can_equip: bool,
    pub can_script: bool,
    pub color_palette: String,
    pub width: i32,
    pub height: i32,
    pub parts: Vec<ItemPartDoc>,
}

/// Document form of one item part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPartDoc {
    #[serde(rename = "type")]
    pub part_type: i32,
    pub layers: Vec<Option<String>>,
}

/// Emit one PNG sidecar per non-empty layer, named by part type and layer
/// sequence, and return the document form.
pub fn export(item: &SfdItem, emit: SidecarEmit<'_>) -> Result<ItemDoc> {
    let mut parts = Vec::with_capacity(item.parts.len());
    for part in &item.parts {
        let mut layers = Vec::with_capacity(part.layers.len());
        for (sequence, layer) in part.layers.iter().enumerate() {
            let exported = match layer {
                Some(pixels) if !is_empty_layer(pixels) => {
                    let png =
                        media::png_encode(pixels, item.width as u32, item.height as u32)?;
                    Some(emit(&png, &format!("_{}_{}.png", part.part_type, sequence))?)
                }
                _ => None,
            };
            layers.push(exported);
        }
        parts.push(ItemPartDoc {
            part_type: part.part_type,
            layers,
        });
    }
    Ok(ItemDoc {
        file_name: item.file_name.clone(),
        game_name: item.game_name.clone(),
        equipment_layer: item.equipment_layer,
        id: item.id.clone(),
        jacket_under_belt: item.jacket_under_belt,
        can_equip: item.can_equip,
        can_script: item.can_script,
        color_palette: item.color_palette.clone(),
        width: item.width,
        height: item.height,
        parts,
    })
}

/// Load the layer sidecars back.
pub fn import(doc: &ItemDoc, load: SidecarLoad<'_>) -> Result<SfdItem> {
    let mut parts = Vec::with_capacity(doc.parts.len());
    for part in &doc.parts {
        let mut layers = Vec::with_capacity(part.layers.len());
        for layer in &part.layers {
            let pixels = match layer {
                Some(name) => {
                    let bytes = load(name)?;
                    let (pixels, width, height) = media::png_decode(&bytes)?;
                    if (width, height) != (doc.width as u32, doc.height as u32) {
                        return Err(XnbError::document(format!(
                            "layer {name} is {width}x{height}, item is {}x{}",
                            doc.width, doc.height
                        )));
                    }
                    Some(pixels)
                }
                None => None,
            };
            layers.push(pixels);
        }
        parts.push(ItemPart {
            part_type: part.part_type,
            layers,
        });
    }
    Ok(SfdItem {
        file_name: doc.file_name.clone(),
        game_name: doc.game_name.clone(),
        equipment_layer: doc.equipment_layer,
        id: doc.id.clone(),
        jacket_under_belt: doc.jacket_under_belt,
        can_equip: doc.can_equip,
        can_script: doc.can_script,
        color_palette: doc.color_palette.clone(),
        width: doc.width,
        height: doc.height,
        parts,
    })
}

/// A layer with no visible pixel exports as absent.
fn is_empty_layer(pixels: &[u8]) -> bool {
    pixels.chunks_exact(4).all(|px| px[3] == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> SfdItem {
        let red = [200u8, 0, 0, 255];
        let blue = [0u8, 0, 200, 255];
        let clear = [0u8, 0, 0, 0];
        let layer: Vec<u8> = [red, red, blue, clear].concat();
        SfdItem {
            file_name: "ItemsOfficerHat".to_string(),
            game_name: "Officer Hat".to_string(),
            equipment_layer: 7,
            id: "OfficerHat2".to_string(),
            jacket_under_belt: false,
            can_equip: true,
            can_script: true,
            color_palette: "Uniform".to_string(),
            width: 2,
            height: 2,
            parts: vec![ItemPart {
                part_type: 4,
                layers: vec![Some(layer), None],
            }],
        }
    }

    #[test]
    fn test_item_roundtrip() {
        let item = sample_item();
        let mut w = BinaryWriter::new();
        write(&mut w, &item).unwrap();
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        let decoded = read(&mut r).unwrap();
        assert_eq!(decoded, item);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_palette_closure() {
        // Every encoded pixel's color must sit in the emitted palette.
        let item = sample_item();
        let palette = build_palette(&item);
        for part in &item.parts {
            for pixels in part.layers.iter().flatten() {
                for px in pixels.chunks_exact(4) {
                    assert!(palette.contains(&[px[0], px[1], px[2], px[3]]));
                }
            }
        }
    }

    #[test]
    fn test_palette_index_out_of_range() {
        let item = sample_item();
        let mut w = BinaryWriter::new();
        write(&mut w, &item).unwrap();
        let mut bytes = w.into_bytes();

        // Corrupt the first explicit palette index to an impossible value.
        let palette = build_palette(&item);
        let needle = bytes
            .iter()
            .position(|&b| b == b'\n')
            .expect("separator present");
        // First layer byte after the part header: present flag, then the
        // first pixel's repeat flag and index byte.
        let index_pos = needle + 1 + 4 + 4 + 1 + 1;
        bytes[index_pos] = palette.len() as u8;

        let mut r = BinaryReader::new(&bytes);
        assert!(matches!(
            read(&mut r),
            Err(XnbError::PaletteIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_export_skips_empty_layers() {
        let mut item = sample_item();
        // Make the second layer present but fully transparent.
        item.parts[0].layers[1] = Some(vec![0u8; 16]);

        let mut emitted = Vec::new();
        let doc = export(&item, &mut |_, suffix| {
            emitted.push(suffix.to_string());
            Ok(format!("OfficerHat{suffix}"))
        })
        .unwrap();

        assert_eq!(emitted, vec!["_4_0.png"]);
        assert_eq!(doc.parts[0].layers[0].as_deref(), Some("OfficerHat_4_0.png"));
        assert_eq!(doc.parts[0].layers[1], None);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let item = sample_item();
        let mut store: Vec<(String, Vec<u8>)> = Vec::new();
        let doc = export(&item, &mut |bytes, suffix| {
            let name = format!("OfficerHat{suffix}");
            store.push((name.clone(), bytes.to_vec()));
            Ok(name)
        })
        .unwrap();

        let restored = import(&doc, &mut |name| {
            store
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, bytes)| bytes.clone())
                .ok_or_else(|| XnbError::sidecar(format!("missing {name}")))
        })
        .unwrap();
        assert_eq!(restored, item);
    }
}
