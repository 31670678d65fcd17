/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! OpenEXR encoder

use alloc::vec::Vec;
use std::io::Write;
use std::path::Path;

use zune_core::bit_depth::BitDepth;
use zune_core::colorspace::ColorSpace;
use zune_core::log::{debug, trace};

use crate::bytestream::ExrByteWriter;
use crate::errors::ExrEncodeErrors;
use crate::file_io::publish_atomically;
use crate::header::FileHeader;
use crate::options::ExrEncoderOptions;
use crate::packer::RowPacker;
use crate::scanline::ScanlineEncoder;

/// A simple EXR encoder
///
/// Writes a single part, uncompressed scanline file with four `f32`
/// channels.
///
/// Data is expected to be interleaved RGBA `f32` in row-major order,
/// top row first, and its length should be `width*height*4`
pub struct ExrEncoder<'a> {
    data:    &'a [f32],
    options: ExrEncoderOptions
}

impl<'a> ExrEncoder<'a> {
    /// Create a new EXR encoder context that can encode
    /// the provided data
    ///
    /// # Arguments
    ///  - `data`: Data to encode
    ///  - `options`: Contains metadata for data, including width and height
    pub fn new(data: &'a [f32], options: ExrEncoderOptions) -> ExrEncoder<'a> {
        ExrEncoder { data, options }
    }

    pub const fn options(&self) -> &ExrEncoderOptions {
        &self.options
    }

    /// Exact size of the encoded file, or `None` if
    /// the dimensions in the options are invalid
    pub fn expected_file_size(&self) -> Option<usize> {
        let header = self.header().ok()?;
        let height = header.height();

        header
            .encoded_len()
            .checked_add(height.checked_mul(8)?)?
            .checked_add(height.checked_mul(8 + header.scanline_payload_len())?)
    }

    fn header(&self) -> Result<FileHeader, ExrEncodeErrors> {
        let width = i64::try_from(self.options.width()).unwrap_or(i64::MAX);
        let height = i64::try_from(self.options.height()).unwrap_or(i64::MAX);
        FileHeader::new(width, height)
    }

    /// Run every check that can fail before a single byte is written
    ///
    /// Dimensions are checked first, then the layout, then the buffer.
    pub(crate) fn prepare(&self) -> Result<(FileHeader, ScanlineEncoder<'a>), ExrEncodeErrors> {
        let header = self.header()?;

        if self.options.colorspace() != ColorSpace::RGBA
            || self.options.depth() != BitDepth::Float32
        {
            return Err(ExrEncodeErrors::UnsupportedLayout(
                self.options.colorspace(),
                self.options.depth()
            ));
        }
        let packer = RowPacker::new(self.data, header.width(), header.height())?;
        let scanlines = ScanlineEncoder::new(&header, packer);

        Ok((header, scanlines))
    }

    /// Encode into a sink
    ///
    /// Rows are packed and written one at a time, so apart from the
    /// header and offset table only a single scanline is held in memory.
    ///
    /// # Arguments:
    /// - sink: Where to write the bytes
    ///
    /// # Returns
    /// - Ok(usize):  The number of bytes written into the sink
    /// - Err(ExrEncodeErrors): An error if something occurred, validation errors
    ///   are returned before anything is written to `sink`
    ///
    /// # Example
    /// - Encode a 10x10 image of black opaque pixels
    /// ```
    /// use zune_exr::{ExrEncoder, ExrEncoderOptions};
    /// let (w, h) = (10, 10);
    /// let data = [0.0_f32, 0.0, 0.0, 1.0].repeat(w * h);
    /// let encoder = ExrEncoder::new(&data, ExrEncoderOptions::new(w, h));
    /// let mut output: Vec<u8> = vec![];
    /// let size = encoder.encode(&mut output).unwrap();
    /// assert_eq!(size, output.len());
    /// assert_eq!(Some(size), encoder.expected_file_size());
    /// ```
    pub fn encode<W: Write>(&self, sink: W) -> Result<usize, ExrEncodeErrors> {
        let (header, scanlines) = self.prepare()?;
        Self::encode_prepared(&header, &scanlines, sink)
    }

    /// Write an already validated image into `sink`
    fn encode_prepared<W: Write>(
        header: &FileHeader, scanlines: &ScanlineEncoder<'_>, mut sink: W
    ) -> Result<usize, ExrEncodeErrors> {
        let offsets = scanlines.offset_table();

        debug!(
            "Encoding {}x{} EXR, {} attribute bytes, {} scanline bytes",
            header.width(),
            header.height(),
            header.attributes_len(),
            scanlines.blocks_len()
        );

        let mut buffer = Vec::with_capacity(header.encoded_len() + offsets.encoded_len());
        {
            let mut writer = ExrByteWriter::new(&mut buffer);
            header.write(&mut writer);
            offsets.write(&mut writer);
        }
        sink.write_all(&buffer)?;

        let mut position = buffer.len();
        let mut scratch = Vec::with_capacity(header.scanline_payload_len());

        for (y, offset) in offsets.offsets().iter().enumerate() {
            debug_assert_eq!(*offset, position as u64);

            buffer.clear();
            scanlines.encode_row(y, &mut scratch, &mut buffer);
            sink.write_all(&buffer)?;

            position += buffer.len();
        }
        sink.flush()?;

        trace!("Wrote {position} bytes");

        Ok(position)
    }

    /// Encode into a freshly allocated vector
    pub fn encode_to_vec(&self) -> Result<Vec<u8>, ExrEncodeErrors> {
        let mut output = Vec::with_capacity(self.expected_file_size().unwrap_or(0));
        self.encode(&mut output)?;
        Ok(output)
    }

    /// Encode to a file at `path`
    ///
    /// The bytes are written to a temporary file in the same directory
    /// which replaces `path` only after the whole image has been written,
    /// see [`publish_atomically`].
    ///
    /// Validation errors are reported before the file system is touched.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<usize, ExrEncodeErrors> {
        let (header, scanlines) = self.prepare()?;
        publish_atomically(path.as_ref(), &self.options, |out| {
            Self::encode_prepared(&header, &scanlines, out)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zune_core::colorspace::ColorSpace;

    use crate::encoder::ExrEncoder;
    use crate::errors::ExrErrorKind;
    use crate::options::ExrEncoderOptions;

    /// Accepts `limit` bytes, then errors on every write
    struct ShortSink {
        written: Vec<u8>,
        limit:   usize
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written.len() + buf.len() > self.limit {
                return Err(std::io::Error::other("sink is full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn two_by_one_size() {
        let data: [f32; 8] = [1.0, 0.5, 0.25, 1.0, 0.0, 0.0, 0.0, 1.0];
        let output = ExrEncoder::new(&data, ExrEncoderOptions::new(2, 1))
            .encode_to_vec()
            .unwrap();
        assert_eq!(output.len(), 8 + 323 + 8 + 40);
    }

    #[test]
    fn validation_happens_before_writing() {
        let data = [0.0_f32; 15];
        let mut sink: Vec<u8> = vec![];
        let err = ExrEncoder::new(&data, ExrEncoderOptions::new(2, 2))
            .encode(&mut sink)
            .unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::BufferSizeMismatch);
        assert!(sink.is_empty());

        let err = ExrEncoder::new(&[], ExrEncoderOptions::new(0, 5))
            .encode(&mut sink)
            .unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::InvalidDimensions);
        assert!(sink.is_empty());
    }

    #[test]
    fn non_rgba_layouts_are_rejected() {
        let data = [0.0_f32; 12];
        let options = ExrEncoderOptions::new(2, 2).set_colorspace(ColorSpace::RGB);
        let err = ExrEncoder::new(&data, options).encode_to_vec().unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::UnsupportedLayout);
    }

    #[test]
    fn sink_errors_are_write_failures() {
        let data = vec![0.25_f32; 8 * 8 * 4];
        let mut sink = ShortSink {
            written: vec![],
            limit:   1000
        };
        let err = ExrEncoder::new(&data, ExrEncoderOptions::new(8, 8))
            .encode(&mut sink)
            .unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::WriteFailed);
        assert!(err.io_error().is_some());
    }

    #[test]
    fn file_matches_in_memory_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.exr");
        let data: Vec<f32> = (0..5 * 3 * 4).map(|c| c as f32 * 0.25).collect();
        let encoder = ExrEncoder::new(&data, ExrEncoderOptions::new(5, 3));

        let size = encoder.write_to_file(&path).unwrap();
        let on_disk = std::fs::read(&path).unwrap();

        assert_eq!(on_disk.len(), size);
        assert_eq!(on_disk, encoder.encode_to_vec().unwrap());

        let short = &data[1..];
        let err = ExrEncoder::new(short, ExrEncoderOptions::new(5, 3))
            .write_to_file(dir.path().join("short.exr"))
            .unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::BufferSizeMismatch);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn invalid_options_have_no_size() {
        let encoder = ExrEncoder::new(&[], ExrEncoderOptions::new(0, 0));
        assert_eq!(encoder.expected_file_size(), None);
    }
}
