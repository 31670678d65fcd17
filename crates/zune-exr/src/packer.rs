/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Pixel packing
//!
//! Callers hand us pixels as `R`,`G`,`B`,`A`,`R`,`G`,`B`,`A`...
//! EXR scanlines store each channel as its own run, in channel-name order,
//! so a row of `RGBARGBA` becomes `AA`,`BB`,`GG`,`RR`.

use alloc::vec::Vec;

use crate::errors::ExrEncodeErrors;
use crate::header::{interleaved_index, rgba_channels, BYTES_PER_SAMPLE, CHANNEL_COUNT};

/// Regroups an interleaved RGBA `f32` buffer into packed scanline payloads
///
/// Packing is a pure transform, packing the same row twice
/// yields identical bytes.
pub struct RowPacker<'a> {
    samples: &'a [f32],
    width:   usize,
    height:  usize,
    /// interleaved component index for each stored channel
    order:   Vec<usize>
}

impl<'a> RowPacker<'a> {
    /// Create a packer for `samples`
    ///
    /// # Errors
    /// - [`ExrEncodeErrors::BufferSizeMismatch`] if `samples` does not hold
    ///   exactly `width * height * 4` values
    pub fn new(
        samples: &'a [f32], width: usize, height: usize
    ) -> Result<RowPacker<'a>, ExrEncodeErrors> {
        let expected = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(CHANNEL_COUNT))
            .ok_or(ExrEncodeErrors::InvalidDimensions(
                width as i64,
                height as i64,
                "image size overflows"
            ))?;
        let found = samples.len();

        if expected != found {
            return Err(ExrEncodeErrors::BufferSizeMismatch(expected, found));
        }
        let order = rgba_channels()
            .iter()
            .filter_map(|channel| interleaved_index(channel.name))
            .collect();

        Ok(RowPacker {
            samples,
            width,
            height,
            order
        })
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    /// Bytes a packed row takes
    pub const fn row_len(&self) -> usize {
        self.width * CHANNEL_COUNT * BYTES_PER_SAMPLE
    }

    /// Append the packed payload of row `y` to `out`
    ///
    /// # Panics
    /// If `y` is not less than the image height
    pub fn pack_row(&self, y: usize, out: &mut Vec<u8>) {
        assert!(y < self.height, "row {y} out of bounds for height {}", self.height);

        let stride = self.width * CHANNEL_COUNT;
        let row = &self.samples[y * stride..(y + 1) * stride];

        out.reserve(self.row_len());

        for &component in &self.order {
            for pixel in row.chunks_exact(CHANNEL_COUNT) {
                out.extend_from_slice(&pixel[component].to_le_bytes());
            }
        }
    }

    /// Iterate over packed rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        (0..self.height).map(|y| {
            let mut row = Vec::with_capacity(self.row_len());
            self.pack_row(y, &mut row);
            row
        })
    }

    /// Pack every row at once
    pub fn pack_rows(&self) -> Vec<Vec<u8>> {
        self.rows().collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::ExrErrorKind;
    use crate::packer::RowPacker;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn rows_are_stored_abgr() {
        let samples: [f32; 8] = [1.0, 0.5, 0.25, 1.0, 0.0, 0.0, 0.0, 1.0];
        let packer = RowPacker::new(&samples, 2, 1).unwrap();
        let rows = packer.pack_rows();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 32);
        assert_eq!(
            floats(&rows[0]),
            [1.0, 1.0, 0.25, 0.0, 0.5, 0.0, 1.0, 0.0]
        );
    }

    #[test]
    fn second_row_uses_its_own_samples() {
        let samples: Vec<f32> = (0..16).map(|c| c as f32).collect();
        let packer = RowPacker::new(&samples, 2, 2).unwrap();

        let mut row = vec![];
        packer.pack_row(1, &mut row);
        // pixels 8..12 and 12..16, alpha first
        assert_eq!(
            floats(&row),
            [11.0, 15.0, 10.0, 14.0, 9.0, 13.0, 8.0, 12.0]
        );
    }

    #[test]
    fn packing_is_deterministic() {
        let samples: Vec<f32> = (0..48).map(|c| c as f32 * 0.1).collect();
        let packer = RowPacker::new(&samples, 4, 3).unwrap();
        assert_eq!(packer.pack_rows(), packer.pack_rows());
    }

    #[test]
    fn lazy_rows_match_single_rows() {
        let samples: Vec<f32> = (0..24).map(|c| c as f32).collect();
        let packer = RowPacker::new(&samples, 2, 3).unwrap();

        let mut expected = vec![];
        packer.pack_row(2, &mut expected);
        assert_eq!(packer.rows().nth(2), Some(expected));
        assert_eq!(packer.rows().count(), 3);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let samples = [0.0_f32; 15];
        let err = RowPacker::new(&samples, 2, 2).err().unwrap();
        assert_eq!(err.kind(), ExrErrorKind::BufferSizeMismatch);

        let samples = [0.0_f32; 17];
        assert!(RowPacker::new(&samples, 2, 2).is_err());
    }
}
