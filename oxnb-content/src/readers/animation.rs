//! SFD animations wire codec.
//!
//! An animations asset is a flat list of named animations; each frame
//! carries an event string, a duration, collision rectangles and part
//! placements. Frames and animations are newline-terminated records. The
//! document form is the structured data itself; there are no sidecars.

use crate::content::{Animation, AnimationFrame, FrameCollision, FramePart};
use crate::readers::expect_newline;
use oxnb_core::binary::{BinaryReader, BinaryWriter};
use oxnb_core::error::Result;

/// Decode an animations payload.
pub fn read(reader: &mut BinaryReader<'_>) -> Result<Vec<Animation>> {
    let animation_count = reader.read_i32()?;
    let mut animations = Vec::with_capacity(animation_count.max(0) as usize);
    for _ in 0..animation_count {
        let name = reader.read_string()?;
        let frame_count = reader.read_i32()?;
        let mut frames = Vec::with_capacity(frame_count.max(0) as usize);
        for _ in 0..frame_count {
            frames.push(read_frame(reader)?);
        }
        expect_newline(reader)?;
        animations.push(Animation { name, frames });
    }
    Ok(animations)
}

fn read_frame(reader: &mut BinaryReader<'_>) -> Result<AnimationFrame> {
    let event = reader.read_string()?;
    let time = reader.read_i32()?;

    let collision_count = reader.read_i32()?;
    let mut collisions = Vec::with_capacity(collision_count.max(0) as usize);
    for _ in 0..collision_count {
        collisions.push(FrameCollision {
            id: reader.read_i32()?,
            width: reader.read_f32()?,
            height: reader.read_f32()?,
            x: reader.read_f32()?,
            y: reader.read_f32()?,
        });
    }

    let part_count = reader.read_i32()?;
    let mut parts = Vec::with_capacity(part_count.max(0) as usize);
    for _ in 0..part_count {
        parts.push(FramePart {
            id: reader.read_i32()?,
            x: reader.read_f32()?,
            y: reader.read_f32()?,
            rotation: reader.read_f32()?,
            flip: reader.read_i32()?,
            scale_x: reader.read_f32()?,
            scale_y: reader.read_f32()?,
            postfix: reader.read_string()?,
        });
    }

    expect_newline(reader)?;
    Ok(AnimationFrame {
        event,
        time,
        collisions,
        parts,
    })
}

/// Encode an animations payload.
pub fn write(writer: &mut BinaryWriter, animations: &[Animation]) -> Result<()> {
    writer.write_i32(animations.len() as i32);
    for animation in animations {
        writer.write_string(&animation.name)?;
        writer.write_i32(animation.frames.len() as i32);
        for frame in &animation.frames {
            write_frame(writer, frame)?;
        }
        writer.write_char('\n');
    }
    Ok(())
}

fn write_frame(writer: &mut BinaryWriter, frame: &AnimationFrame) -> Result<()> {
    writer.write_string(&frame.event)?;
    writer.write_i32(frame.time);

    writer.write_i32(frame.collisions.len() as i32);
    for collision in &frame.collisions {
        writer.write_i32(collision.id);
        writer.write_f32(collision.width);
        writer.write_f32(collision.height);
        writer.write_f32(collision.x);
        writer.write_f32(collision.y);
    }

    writer.write_i32(frame.parts.len() as i32);
    for part in &frame.parts {
        writer.write_i32(part.id);
        writer.write_f32(part.x);
        writer.write_f32(part.y);
        writer.write_f32(part.rotation);
        writer.write_i32(part.flip);
        writer.write_f32(part.scale_x);
        writer.write_f32(part.scale_y);
        writer.write_string(&part.postfix)?;
    }

    writer.write_char('\n');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_animations() -> Vec<Animation> {
        vec![
            Animation {
                name: "WalkCycle".to_string(),
                frames: vec![AnimationFrame {
                    event: "step".to_string(),
                    time: 120,
                    collisions: vec![FrameCollision {
                        id: 1,
                        width: 4.0,
                        height: 8.0,
                        x: -1.5,
                        y: 0.25,
                    }],
                    parts: vec![
                        FramePart {
                            id: 103,
                            x: 1.0,
                            y: 2.0,
                            rotation: 0.5,
                            flip: 1,
                            scale_x: 1.0,
                            scale_y: -1.0,
                            postfix: "_b".to_string(),
                        },
                        FramePart {
                            id: -51,
                            x: 0.0,
                            y: 0.0,
                            rotation: 0.0,
                            flip: 0,
                            scale_x: 1.0,
                            scale_y: 1.0,
                            postfix: String::new(),
                        },
                    ],
                }],
            },
            Animation {
                name: "UpperRECOIL2".to_string(),
                frames: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_animations_roundtrip() {
        let animations = sample_animations();
        let mut w = BinaryWriter::new();
        write(&mut w, &animations).unwrap();
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        let decoded = read(&mut r).unwrap();
        assert_eq!(decoded, animations);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_empty_list_roundtrip() {
        let mut w = BinaryWriter::new();
        write(&mut w, &[]).unwrap();
        let mut r = BinaryReader::new(w.as_bytes());
        assert!(read(&mut r).unwrap().is_empty());
    }
}
