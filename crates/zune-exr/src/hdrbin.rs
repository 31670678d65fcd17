/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! HDRBIN, a raw dump of RGBA `f32` pixels behind a fixed header
//!
//! ```text
//! ╔════════╤══════════════════════════════════════════════╗
//! ║ Bytes  │ Description                                  ║
//! ╠════════╪══════════════════════════════════════════════╣
//! ║ 6      │ "HDRBIN" magic value                         ║
//! ╟────────┼──────────────────────────────────────────────╢
//! ║ 2      │ 16-Bit LE version, always 1                  ║
//! ╟────────┼──────────────────────────────────────────────╢
//! ║ 4      │ 32-Bit LE unsigned integer (width)           ║
//! ╟────────┼──────────────────────────────────────────────╢
//! ║ 4      │ 32-Bit LE unsigned integer (height)          ║
//! ╟────────┼──────────────────────────────────────────────╢
//! ║ 1      │ channel count, always 4                      ║
//! ╟────────┼──────────────────────────────────────────────╢
//! ║ 1      │ sample type, 1 for 32-bit float              ║
//! ╟────────┼──────────────────────────────────────────────╢
//! ║ 8      │ reserved, zero                               ║
//! ╟────────┼──────────────────────────────────────────────╢
//! ║ [4444] │ 4x32-Bit LE floats [RGBA] / pixel, row-major ║
//! ╚════════╧══════════════════════════════════════════════╝
//! ```

use alloc::vec::Vec;
use std::io::Write;
use std::path::Path;

use zune_core::bit_depth::BitDepth;
use zune_core::colorspace::ColorSpace;
use zune_core::log::debug;

use crate::bytestream::ExrByteWriter;
use crate::errors::ExrEncodeErrors;
use crate::file_io::publish_atomically;
use crate::header::{validate_dimensions, BYTES_PER_SAMPLE, CHANNEL_COUNT};
use crate::options::ExrEncoderOptions;

pub const HDRBIN_MAGIC: &[u8; 6] = b"HDRBIN";
pub const HDRBIN_VERSION: u16 = 1;
pub const HDRBIN_HEADER_SIZE: usize = 26;
const HDRBIN_FLOAT32: u8 = 1;

/// Samples written per chunk
const CHUNK_SAMPLES: usize = 4096;

/// Encoder for HDRBIN files
///
/// Takes the same input as [`ExrEncoder`](crate::ExrEncoder) and stores it
/// without any reordering.
pub struct HdrBinEncoder<'a> {
    data:    &'a [f32],
    options: ExrEncoderOptions
}

impl<'a> HdrBinEncoder<'a> {
    pub fn new(data: &'a [f32], options: ExrEncoderOptions) -> HdrBinEncoder<'a> {
        HdrBinEncoder { data, options }
    }

    fn validate(&self) -> Result<(u32, u32), ExrEncodeErrors> {
        let width = i64::try_from(self.options.width()).unwrap_or(i64::MAX);
        let height = i64::try_from(self.options.height()).unwrap_or(i64::MAX);
        let (w, h) = validate_dimensions(width, height)?;

        if self.options.colorspace() != ColorSpace::RGBA
            || self.options.depth() != BitDepth::Float32
        {
            return Err(ExrEncodeErrors::UnsupportedLayout(
                self.options.colorspace(),
                self.options.depth()
            ));
        }
        let expected = w * h * CHANNEL_COUNT;
        if self.data.len() != expected {
            return Err(ExrEncodeErrors::BufferSizeMismatch(expected, self.data.len()));
        }
        // validate_dimensions keeps both below i32::MAX
        Ok((w as u32, h as u32))
    }

    /// Exact size of the output, `None` for invalid dimensions
    pub fn expected_file_size(&self) -> Option<usize> {
        self.options
            .width()
            .checked_mul(self.options.height())?
            .checked_mul(CHANNEL_COUNT * BYTES_PER_SAMPLE)?
            .checked_add(HDRBIN_HEADER_SIZE)
    }

    /// Encode into a sink, returning the number of bytes written
    pub fn encode<W: Write>(&self, sink: W) -> Result<usize, ExrEncodeErrors> {
        let (width, height) = self.validate()?;
        self.encode_validated(width, height, sink)
    }

    fn encode_validated<W: Write>(
        &self, width: u32, height: u32, mut sink: W
    ) -> Result<usize, ExrEncodeErrors> {
        debug!("Encoding {width}x{height} HDRBIN");

        let mut buffer = Vec::with_capacity(CHUNK_SAMPLES * BYTES_PER_SAMPLE);
        {
            let mut writer = ExrByteWriter::new(&mut buffer);
            writer.write_all(HDRBIN_MAGIC);
            writer.write_u16_le(HDRBIN_VERSION);
            writer.write_u32_le(width);
            writer.write_u32_le(height);
            writer.write_u8(CHANNEL_COUNT as u8);
            writer.write_u8(HDRBIN_FLOAT32);
            writer.write_all(&[0; 8]);
        }
        sink.write_all(&buffer)?;
        let mut position = buffer.len();

        for chunk in self.data.chunks(CHUNK_SAMPLES) {
            buffer.clear();
            let mut writer = ExrByteWriter::new(&mut buffer);
            for sample in chunk {
                writer.write_f32_le(*sample);
            }
            sink.write_all(&buffer)?;
            position += buffer.len();
        }
        sink.flush()?;

        Ok(position)
    }

    /// Encode to `path`, replacing it only once the whole file is written
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<usize, ExrEncodeErrors> {
        let (width, height) = self.validate()?;
        publish_atomically(path.as_ref(), &self.options, |out| {
            self.encode_validated(width, height, out)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::ExrErrorKind;
    use crate::hdrbin::{HdrBinEncoder, HDRBIN_HEADER_SIZE};
    use crate::options::ExrEncoderOptions;

    #[test]
    fn header_layout() {
        let data: [f32; 8] = [1.0, 0.5, 0.25, 1.0, 0.0, 0.0, 0.0, 1.0];
        let encoder = HdrBinEncoder::new(&data, ExrEncoderOptions::new(2, 1));
        let mut out: Vec<u8> = vec![];
        let size = encoder.encode(&mut out).unwrap();

        assert_eq!(size, HDRBIN_HEADER_SIZE + 32);
        assert_eq!(Some(size), encoder.expected_file_size());
        assert_eq!(&out[0..6], b"HDRBIN");
        assert_eq!(&out[6..8], &[1, 0]);
        assert_eq!(&out[8..12], &2_u32.to_le_bytes());
        assert_eq!(&out[12..16], &1_u32.to_le_bytes());
        assert_eq!(&out[16..18], &[4, 1]);
        assert_eq!(&out[18..26], &[0; 8]);
        // samples keep their interleaved order
        assert_eq!(&out[26..30], &1.0_f32.to_le_bytes());
        assert_eq!(&out[30..34], &0.5_f32.to_le_bytes());
    }

    #[test]
    fn same_validation_as_exr() {
        let err = HdrBinEncoder::new(&[], ExrEncoderOptions::new(0, 5))
            .encode(Vec::<u8>::new())
            .unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::InvalidDimensions);

        let data = [0.0_f32; 15];
        let err = HdrBinEncoder::new(&data, ExrEncoderOptions::new(2, 2))
            .encode(Vec::<u8>::new())
            .unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::BufferSizeMismatch);
    }

    #[test]
    fn writes_atomically_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.hdrbin");
        let data = vec![0.75_f32; 3 * 5 * 4];

        let size = HdrBinEncoder::new(&data, ExrEncoderOptions::new(3, 5))
            .write_to_file(&path)
            .unwrap();

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk.len(), size);

        let mut in_memory: Vec<u8> = vec![];
        HdrBinEncoder::new(&data, ExrEncoderOptions::new(3, 5))
            .encode(&mut in_memory)
            .unwrap();
        assert_eq!(on_disk, in_memory);
    }
}
