//! Canonical Huffman decoding for LZX trees.
//!
//! Each of the four LZX trees (pre-tree, aligned offsets, main, length) is a
//! canonical Huffman code transmitted as per-symbol code lengths. Decoding
//! uses a direct lookup table for codes no longer than the table width, with
//! 2-entry internal nodes appended past the leaf region for longer codes.

use crate::bitstream::LzxBitReader;
use crate::tables::PRETREE_NUM_ELEMENTS;
use oxnb_core::error::{Result, XnbError};

/// Sentinel marking an unused or not-yet-allocated table entry.
const EMPTY: u16 = 0xFFFF;

/// A canonical Huffman tree: per-symbol code lengths plus the decode table
/// rebuilt from them.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Number of symbols in the alphabet.
    symbols: usize,
    /// Width of the direct-lookup region in bits.
    table_bits: u32,
    /// Code length per symbol; zero means the symbol is absent.
    pub lengths: Vec<u8>,
    /// Decode table: `2^table_bits` leaf entries plus internal nodes.
    table: Vec<u16>,
}

impl HuffmanTable {
    /// Create a table for `symbols` symbols with a `table_bits`-wide direct
    /// lookup region. All code lengths start at zero.
    pub fn new(symbols: usize, table_bits: u32) -> Self {
        Self {
            symbols,
            table_bits,
            lengths: vec![0; symbols],
            table: vec![0; (1 << table_bits) + (symbols << 1)],
        }
    }

    /// Rebuild the decode table from the current code lengths.
    ///
    /// Phase one lays out canonical codes of length `<= table_bits` as
    /// direct-lookup leaves (shortest first, then by symbol). Phase two
    /// threads longer codes through appended 2-entry internal nodes. A code
    /// assignment that overruns the code space in either phase fails with
    /// [`XnbError::TableOverrun`]; an exactly-full table succeeds, and any
    /// remaining entries are marked unused.
    pub fn rebuild(&mut self) -> Result<()> {
        let nsyms = self.symbols;
        let nbits = self.table_bits;
        self.table.fill(0);

        let mut pos: u32 = 0;
        let table_mask: u32 = 1 << nbits;
        let mut bit_mask: u32 = table_mask >> 1;
        let mut bit_num: u32 = 1;

        while bit_num <= nbits {
            for sym in 0..nsyms {
                if self.lengths[sym] as u32 == bit_num {
                    let leaf = pos;
                    pos += bit_mask;
                    if pos > table_mask {
                        return Err(XnbError::TableOverrun);
                    }
                    for fill in 0..bit_mask {
                        self.table[(leaf + fill) as usize] = sym as u16;
                    }
                }
            }
            bit_mask >>= 1;
            bit_num += 1;
        }

        if pos == table_mask {
            return Ok(());
        }

        for entry in pos..table_mask {
            self.table[entry as usize] = EMPTY;
        }

        let mut next_symbol = if (table_mask >> 1) < nsyms as u32 {
            nsyms as u32
        } else {
            table_mask >> 1
        };
        let mut pos = pos << 16;
        let table_mask = table_mask << 16;
        let mut bit_mask = 1u32 << 15;

        while bit_num <= 16 {
            for sym in 0..nsyms {
                if self.lengths[sym] as u32 == bit_num {
                    let mut leaf = (pos >> 16) as usize;
                    for fill in 0..(bit_num - nbits) {
                        if self.table[leaf] == EMPTY {
                            self.table[(next_symbol << 1) as usize] = EMPTY;
                            self.table[(next_symbol << 1) as usize + 1] = EMPTY;
                            self.table[leaf] = next_symbol as u16;
                            next_symbol += 1;
                        }
                        leaf = (self.table[leaf] as usize) << 1;
                        if (pos >> (15 - fill)) & 1 == 1 {
                            leaf += 1;
                        }
                    }
                    self.table[leaf] = sym as u16;
                    pos += bit_mask;
                    if pos > table_mask {
                        return Err(XnbError::TableOverrun);
                    }
                }
            }
            bit_mask >>= 1;
            bit_num += 1;
        }

        if pos == table_mask {
            return Ok(());
        }

        // An unfilled table is only legal when no symbol has a code at all.
        if self.lengths.iter().all(|&len| len == 0) {
            Ok(())
        } else {
            Err(XnbError::TableOverrun)
        }
    }

    /// Decode one symbol from the bitstream.
    pub fn read_symbol(&self, reader: &mut LzxBitReader<'_>) -> Result<u32> {
        let mut entry = self.table[reader.peek_bits(self.table_bits) as usize] as u32;

        if entry as usize >= self.symbols {
            // Long code: walk the internal nodes one bit at a time against
            // a 32-bit window of the stream.
            let window = reader.peek_long();
            let mut probe = 1u32 << (32 - self.table_bits);
            loop {
                probe >>= 1;
                if probe == 0 {
                    return Err(XnbError::TableOverrun);
                }
                entry <<= 1;
                entry |= u32::from(window & probe != 0);
                entry = *self
                    .table
                    .get(entry as usize)
                    .ok_or(XnbError::TableOverrun)? as u32;
                if (entry as usize) < self.symbols {
                    break;
                }
            }
        }

        reader.read_bits(self.lengths[entry as usize] as u32)?;
        Ok(entry)
    }

    /// Read code lengths for symbols `first..last` from the stream into
    /// this table, leaving the decode table to be rebuilt by the caller.
    ///
    /// The lengths are delta-coded against the previous values of this
    /// table, via a 20-symbol pre-tree whose own 4-bit lengths lead the
    /// stream. Pre-tree symbols 17 and 18 emit zero runs, 19 repeats a
    /// delta-coded value, and 0..=16 are single deltas; all deltas wrap
    /// modulo 17.
    pub fn read_lengths(
        &mut self,
        reader: &mut LzxBitReader<'_>,
        first: usize,
        last: usize,
        pretree: &mut HuffmanTable,
    ) -> Result<()> {
        for i in 0..PRETREE_NUM_ELEMENTS {
            pretree.lengths[i] = reader.read_bits(4)? as u8;
        }
        pretree.rebuild()?;

        let mut x = first;
        while x < last {
            let sym = pretree.read_symbol(reader)?;
            match sym {
                17 => {
                    let mut run = reader.read_bits(4)? + 4;
                    while run > 0 && x < last {
                        self.lengths[x] = 0;
                        x += 1;
                        run -= 1;
                    }
                }
                18 => {
                    let mut run = reader.read_bits(5)? + 20;
                    while run > 0 && x < last {
                        self.lengths[x] = 0;
                        x += 1;
                        run -= 1;
                    }
                }
                19 => {
                    let mut run = reader.read_bits(1)? + 4;
                    let delta = pretree.read_symbol(reader)?;
                    let value = wrap17(self.lengths[x] as i32 - delta as i32);
                    while run > 0 && x < last {
                        self.lengths[x] = value;
                        x += 1;
                        run -= 1;
                    }
                }
                sym => {
                    self.lengths[x] = wrap17(self.lengths[x] as i32 - sym as i32);
                    x += 1;
                }
            }
        }
        Ok(())
    }
}

/// Wrap a code-length delta into `0..17`. The negative wrap is part of the
/// format.
fn wrap17(value: i32) -> u8 {
    if value < 0 {
        (value + 17) as u8
    } else {
        value as u8
    }
}
