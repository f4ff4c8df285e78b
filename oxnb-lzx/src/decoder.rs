//! Stateful LZX decompression.
//!
//! The decoder owns a sliding window of `2^window_bits` bytes, the
//! three-slot repeated-offset queue and the four Huffman trees, and produces
//! output frame by frame. Block state persists across frames: a block may
//! span several frames, and a frame may contain several blocks.

use crate::bitstream::LzxBitReader;
use crate::huffman::HuffmanTable;
use crate::tables::{
    ALIGNED_NUM_ELEMENTS, ALIGNED_TABLE_BITS, EXTRA_BITS, LENGTH_MAX_SYMBOLS, LENGTH_TABLE_BITS,
    MAINTREE_TABLE_BITS, MAX_WINDOW_BITS, MIN_MATCH, MIN_WINDOW_BITS, NUM_CHARS,
    NUM_PRIMARY_LENGTHS, NUM_SECONDARY_LENGTHS, POSITION_BASE, PRETREE_NUM_ELEMENTS,
    PRETREE_TABLE_BITS, position_slots,
};
use oxnb_core::error::{Result, XnbError};

/// The three LZX block types, plus the pre-first-block state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    None,
    Verbatim,
    Aligned,
    Uncompressed,
}

/// A stateful LZX decompressor.
///
/// One instance decodes one logical stream; the window, offset queue and
/// trees carry over between [`LzxDecoder::decompress`] calls. Distinct
/// streams need distinct instances.
#[derive(Debug)]
pub struct LzxDecoder {
    window: Vec<u8>,
    window_size: usize,
    window_posn: usize,

    /// Repeated-offset LRU queue, most recent first.
    r0: usize,
    r1: usize,
    r2: usize,

    main_elements: usize,
    /// Whether the one-time stream header (the Intel E8 bit) was consumed.
    header_read: bool,

    block_type: BlockType,
    block_length: usize,
    block_remaining: usize,

    pretree: HuffmanTable,
    aligned: HuffmanTable,
    length: HuffmanTable,
    maintree: HuffmanTable,
}

impl LzxDecoder {
    /// Create a decoder with a `2^window_bits` byte window.
    ///
    /// `window_bits` must be in `15..=21`.
    pub fn new(window_bits: u32) -> Result<Self> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&window_bits) {
            return Err(XnbError::WindowSizeOutOfRange { bits: window_bits });
        }
        let window_size = 1usize << window_bits;
        let main_elements = NUM_CHARS + (position_slots(window_bits) << 3);

        Ok(Self {
            window: vec![0; window_size],
            window_size,
            window_posn: 0,
            r0: 1,
            r1: 1,
            r2: 1,
            main_elements,
            header_read: false,
            block_type: BlockType::None,
            block_length: 0,
            block_remaining: 0,
            pretree: HuffmanTable::new(PRETREE_NUM_ELEMENTS, PRETREE_TABLE_BITS),
            aligned: HuffmanTable::new(ALIGNED_NUM_ELEMENTS, ALIGNED_TABLE_BITS),
            length: HuffmanTable::new(LENGTH_MAX_SYMBOLS, LENGTH_TABLE_BITS),
            maintree: HuffmanTable::new(main_elements, MAINTREE_TABLE_BITS),
        })
    }

    /// Decode exactly `frame_size` bytes from the stream.
    ///
    /// `block_size` is the byte budget of the enclosing compressed block,
    /// used to bound raw copies inside Uncompressed blocks. The returned
    /// bytes are the newest `frame_size` bytes of the window.
    pub fn decompress(
        &mut self,
        reader: &mut LzxBitReader<'_>,
        frame_size: usize,
        block_size: usize,
    ) -> Result<Vec<u8>> {
        let block_end = reader.position() + block_size;

        if !self.header_read {
            if reader.read_bits(1)? != 0 {
                return Err(XnbError::IntelE8NotSupported);
            }
            self.header_read = true;
        }

        let mut togo = frame_size;
        while togo > 0 {
            if self.block_remaining == 0 {
                if reader.remaining() == 0 {
                    return Err(XnbError::EofWithDataRemaining { remaining: togo });
                }
                self.read_block_header(reader)?;
            }

            let mut this_run = self.block_remaining.min(togo) as isize;
            togo -= this_run as usize;
            self.block_remaining -= this_run as usize;

            self.window_posn &= self.window_size - 1;
            if self.window_posn + this_run as usize > self.window_size {
                return Err(XnbError::WindowRunOverflow {
                    position: self.window_posn,
                    run: this_run as usize,
                    window: self.window_size,
                });
            }

            match self.block_type {
                BlockType::Verbatim => this_run = self.decode_run(reader, this_run, false)?,
                BlockType::Aligned => this_run = self.decode_run(reader, this_run, true)?,
                BlockType::Uncompressed => {
                    let run = this_run as usize;
                    if reader.position() + run > block_end {
                        return Err(XnbError::BlockOverrun { block_size });
                    }
                    let dest = self.window_posn;
                    reader.copy_bytes(&mut self.window[dest..dest + run])?;
                    self.window_posn += run;
                    this_run = 0;
                }
                BlockType::None => {
                    return Err(XnbError::InvalidBlockType { block_type: 0 });
                }
            }

            // A match may overshoot the run boundary; the overshoot is
            // charged against the remainder of the block.
            if this_run < 0 {
                let overshoot = (-this_run) as usize;
                if overshoot > self.block_remaining {
                    return Err(XnbError::EofWithDataRemaining { remaining: togo });
                }
                self.block_remaining -= overshoot;
            }
        }

        reader.align();

        let end = if self.window_posn == 0 {
            self.window_size
        } else {
            self.window_posn
        };
        let start = end
            .checked_sub(frame_size)
            .ok_or(XnbError::EofWithDataRemaining { remaining: togo })?;
        Ok(self.window[start..start + frame_size].to_vec())
    }

    /// Read the next block header: 3-bit type, 24-bit length, and the
    /// per-type tree data. Verbatim and Aligned share the main and length
    /// trees; Aligned additionally leads with its 8-entry offsets tree.
    fn read_block_header(&mut self, reader: &mut LzxBitReader<'_>) -> Result<()> {
        // An odd-length Uncompressed block leaves one pad byte before the
        // next block header.
        if self.block_type == BlockType::Uncompressed && self.block_length & 1 == 1 {
            reader.read_u8()?;
        }

        let block_type = reader.read_bits(3)?;
        let hi = reader.read_bits(16)?;
        let lo = reader.read_bits(8)?;
        self.block_length = ((hi << 8) | lo) as usize;
        self.block_remaining = self.block_length;

        self.block_type = match block_type {
            1 => {
                self.read_header_trees(reader, false)?;
                BlockType::Verbatim
            }
            2 => {
                self.read_header_trees(reader, true)?;
                BlockType::Aligned
            }
            3 => {
                reader.align();
                self.r0 = reader.read_u32_le()? as usize;
                self.r1 = reader.read_u32_le()? as usize;
                self.r2 = reader.read_u32_le()? as usize;
                BlockType::Uncompressed
            }
            other => return Err(XnbError::InvalidBlockType { block_type: other }),
        };
        Ok(())
    }

    /// Read the Huffman trees of a Verbatim or Aligned block header.
    fn read_header_trees(&mut self, reader: &mut LzxBitReader<'_>, aligned: bool) -> Result<()> {
        if aligned {
            for i in 0..ALIGNED_NUM_ELEMENTS {
                self.aligned.lengths[i] = reader.read_bits(3)? as u8;
            }
            self.aligned.rebuild()?;
        }

        self.maintree
            .read_lengths(reader, 0, NUM_CHARS, &mut self.pretree)?;
        self.maintree
            .read_lengths(reader, NUM_CHARS, self.main_elements, &mut self.pretree)?;
        self.maintree.rebuild()?;

        self.length
            .read_lengths(reader, 0, NUM_SECONDARY_LENGTHS, &mut self.pretree)?;
        self.length.rebuild()?;
        Ok(())
    }

    /// Decode literals and matches until `this_run` output bytes have been
    /// produced. Returns the (possibly negative) residual run count; a
    /// negative value means the final match overshot the run boundary.
    fn decode_run(
        &mut self,
        reader: &mut LzxBitReader<'_>,
        mut this_run: isize,
        aligned: bool,
    ) -> Result<isize> {
        while this_run > 0 {
            let main_element = self.maintree.read_symbol(reader)? as usize;

            if main_element < NUM_CHARS {
                self.window[self.window_posn] = main_element as u8;
                self.window_posn += 1;
                this_run -= 1;
                continue;
            }

            let main_element = main_element - NUM_CHARS;

            let mut match_length = main_element & NUM_PRIMARY_LENGTHS;
            if match_length == NUM_PRIMARY_LENGTHS {
                match_length += self.length.read_symbol(reader)? as usize;
            }
            match_length += MIN_MATCH;

            let slot = main_element >> 3;
            let match_offset = match slot {
                0 => self.r0,
                1 => {
                    let offset = self.r1;
                    self.r1 = self.r0;
                    self.r0 = offset;
                    offset
                }
                2 => {
                    let offset = self.r2;
                    self.r2 = self.r0;
                    self.r0 = offset;
                    offset
                }
                _ => {
                    let offset = if aligned {
                        self.read_aligned_offset(reader, slot)?
                    } else if slot != 3 {
                        let extra = EXTRA_BITS[slot] as u32;
                        let verbatim_bits = reader.read_bits(extra)? as usize;
                        POSITION_BASE[slot] as usize - 2 + verbatim_bits
                    } else {
                        // Slot 3 carries no fine bits; its offset is fixed.
                        1
                    };
                    self.r2 = self.r1;
                    self.r1 = self.r0;
                    self.r0 = offset;
                    offset
                }
            };

            if match_offset == 0 || match_offset > self.window_size {
                return Err(XnbError::WindowRunOverflow {
                    position: self.window_posn,
                    run: match_length,
                    window: self.window_size,
                });
            }

            this_run -= match_length as isize;
            self.copy_match(match_offset, match_length)?;
        }
        Ok(this_run)
    }

    /// Decode the fine offset of an Aligned-block match for `slot > 2`.
    fn read_aligned_offset(
        &mut self,
        reader: &mut LzxBitReader<'_>,
        slot: usize,
    ) -> Result<usize> {
        let extra = EXTRA_BITS[slot] as u32;
        let base = POSITION_BASE[slot] as usize - 2;
        let offset = if extra > 3 {
            let verbatim_bits = (reader.read_bits(extra - 3)? as usize) << 3;
            let aligned_bits = self.aligned.read_symbol(reader)? as usize;
            base + verbatim_bits + aligned_bits
        } else if extra == 3 {
            base + self.aligned.read_symbol(reader)? as usize
        } else if extra > 0 {
            base + reader.read_bits(extra)? as usize
        } else {
            1
        };
        Ok(offset)
    }

    /// Copy `match_length` bytes from `match_offset` back in the window to
    /// the write cursor. The source may wrap around the window start; the
    /// copy proceeds byte by byte forward so overlapping ranges replicate.
    fn copy_match(&mut self, match_offset: usize, mut match_length: usize) -> Result<()> {
        let mut dest = self.window_posn;
        let mut src;

        if self.window_posn >= match_offset {
            src = dest - match_offset;
        } else {
            // Source starts in the wrapped region at the end of the window.
            src = dest + self.window_size - match_offset;
            let mut wrapped = match_offset - self.window_posn;
            if wrapped < match_length {
                match_length -= wrapped;
                self.window_posn += wrapped;
                while wrapped > 0 {
                    self.window[dest] = self.window[src];
                    dest += 1;
                    src += 1;
                    wrapped -= 1;
                }
                src = 0;
            }
        }
        self.window_posn += match_length;

        if dest + match_length > self.window_size {
            return Err(XnbError::WindowRunOverflow {
                position: dest,
                run: match_length,
                window: self.window_size,
            });
        }
        while match_length > 0 {
            self.window[dest] = self.window[src];
            dest += 1;
            src += 1;
            match_length -= 1;
        }
        Ok(())
    }
}
