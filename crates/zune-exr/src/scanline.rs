/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Scanline blocks and the offset table that indexes them

use alloc::vec::Vec;

use zune_core::log::trace;

use crate::bytestream::ExrByteWriter;
use crate::header::FileHeader;
use crate::packer::RowPacker;

/// Row index and payload size preceding every block
pub const BLOCK_PREFIX_LEN: usize = 8;
/// Bytes per offset table entry
pub const OFFSET_ENTRY_LEN: usize = 8;

/// A single uncompressed scanline
pub struct ScanlineBlock<'a> {
    pub y:       i32,
    pub payload: &'a [u8]
}

impl<'a> ScanlineBlock<'a> {
    pub fn encoded_len(&self) -> usize {
        BLOCK_PREFIX_LEN + self.payload.len()
    }

    /// Write the row index, payload length and payload
    pub fn write(&self, writer: &mut ExrByteWriter) {
        writer.write_i32_le(self.y);
        // callers keep payloads below i32::MAX, see validate_dimensions
        writer.write_i32_le(self.payload.len() as i32);
        writer.write_all(self.payload);
    }
}

/// Absolute file positions of every scanline block, in row order
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OffsetTable {
    offsets: Vec<u64>
}

impl OffsetTable {
    /// Build the table by accumulating block lengths from `first_block`
    pub fn from_block_lengths<I>(first_block: u64, lengths: I) -> OffsetTable
    where
        I: IntoIterator<Item = usize>
    {
        let mut position = first_block;
        let offsets = lengths
            .into_iter()
            .map(|length| {
                let offset = position;
                position += length as u64;
                offset
            })
            .collect();

        OffsetTable { offsets }
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        self.offsets.len() * OFFSET_ENTRY_LEN
    }

    pub fn write(&self, writer: &mut ExrByteWriter) {
        writer.reserve(self.encoded_len());
        for offset in &self.offsets {
            writer.write_u64_le(*offset);
        }
    }
}

/// Turns packed rows into scanline blocks
///
/// Rows are emitted strictly top to bottom, matching the
/// increasing-Y line order written in the header.
pub struct ScanlineEncoder<'a> {
    packer:     RowPacker<'a>,
    header_len: usize
}

impl<'a> ScanlineEncoder<'a> {
    pub fn new(header: &FileHeader, packer: RowPacker<'a>) -> ScanlineEncoder<'a> {
        ScanlineEncoder {
            packer,
            header_len: header.encoded_len()
        }
    }

    /// Bytes of one encoded block, prefix included
    pub const fn block_len(&self) -> usize {
        BLOCK_PREFIX_LEN + self.packer.row_len()
    }

    /// Offset of the first block, right behind the offset table
    pub fn first_block_offset(&self) -> u64 {
        (self.header_len + self.packer.height() * OFFSET_ENTRY_LEN) as u64
    }

    pub fn offset_table(&self) -> OffsetTable {
        let block_len = self.block_len();
        OffsetTable::from_block_lengths(
            self.first_block_offset(),
            (0..self.packer.height()).map(|_| block_len)
        )
    }

    /// Total bytes of all blocks
    pub fn blocks_len(&self) -> usize {
        self.block_len() * self.packer.height()
    }

    /// Append the block for row `y` to `out`, reusing `scratch` for the payload
    pub fn encode_row(&self, y: usize, scratch: &mut Vec<u8>, out: &mut Vec<u8>) {
        scratch.clear();
        self.packer.pack_row(y, scratch);

        trace!("Encoding scanline {y}");

        let block = ScanlineBlock {
            // heights are validated to fit in i32
            y:       y as i32,
            payload: scratch.as_slice()
        };
        block.write(&mut ExrByteWriter::new(out));
    }

    pub fn height(&self) -> usize {
        self.packer.height()
    }
}
