/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! EXR header construction
//!
//! The header of an image produced by this crate is a pure function of
//! its width and height, every other attribute is fixed.

use alloc::vec::Vec;

use zune_core::log::debug;

use crate::bytestream::ExrByteWriter;
use crate::errors::ExrEncodeErrors;

/// Magic number every OpenEXR file starts with
pub const EXR_MAGIC: u32 = 0x762f_3101;
/// Version field, version 2 in the low byte and no flag bits,
/// i.e a single part scanline image with short attribute names
pub const EXR_VERSION: u32 = 2;
/// Number of channels written per pixel
pub const CHANNEL_COUNT: usize = 4;
/// Bytes a single `f32` sample takes on disk
pub const BYTES_PER_SAMPLE: usize = 4;

/// Sample storage of a channel
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PixelType {
    /// 32-bit IEEE-754 float
    Float
}

impl PixelType {
    /// Identifier stored in the channel list
    pub const fn to_int(self) -> i32 {
        match self {
            PixelType::Float => 2
        }
    }
}

/// A single entry of the `channels` attribute
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChannelDescriptor {
    pub name:       &'static str,
    pub pixel_type: PixelType,
    pub x_sampling: i32,
    pub y_sampling: i32
}

impl ChannelDescriptor {
    /// A full resolution `f32` channel
    pub const fn float(name: &'static str) -> ChannelDescriptor {
        ChannelDescriptor {
            name,
            pixel_type: PixelType::Float,
            x_sampling: 1,
            y_sampling: 1
        }
    }
    /// name, pixel type, pLinear, 3 reserved bytes, x and y sampling
    fn serialized_len(&self) -> usize {
        self.name.len() + 1 + 4 + 1 + 3 + 4 + 4
    }

    fn write(&self, writer: &mut ExrByteWriter) {
        writer.write_null_terminated(self.name);
        writer.write_i32_le(self.pixel_type.to_int());
        // pLinear followed by reserved bytes
        writer.write_all(&[0, 0, 0, 0]);
        writer.write_i32_le(self.x_sampling);
        writer.write_i32_le(self.y_sampling);
    }
}

/// The channels we write, in the order the format stores them
///
/// Readers expect the channel list sorted by name, so interleaved
/// `R,G,B,A` input ends up stored as `A,B,G,R`.
pub fn rgba_channels() -> Vec<ChannelDescriptor> {
    let mut channels = vec![
        ChannelDescriptor::float("R"),
        ChannelDescriptor::float("G"),
        ChannelDescriptor::float("B"),
        ChannelDescriptor::float("A"),
    ];
    channels.sort_by(|a, b| a.name.cmp(b.name));
    channels
}

/// Index into an interleaved `R,G,B,A` pixel for a channel name
pub(crate) fn interleaved_index(name: &str) -> Option<usize> {
    match name {
        "R" => Some(0),
        "G" => Some(1),
        "B" => Some(2),
        "A" => Some(3),
        _ => None
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Compression {
    None
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineOrder {
    IncreasingY
}

/// Typed value of a header attribute
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    ChannelList(Vec<ChannelDescriptor>),
    Compression(Compression),
    /// x_min, y_min, x_max, y_max
    Box2i(i32, i32, i32, i32),
    LineOrder(LineOrder),
    Float(f32),
    V2f(f32, f32)
}

impl AttributeValue {
    /// The type name written after the attribute name
    pub const fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::ChannelList(_) => "chlist",
            AttributeValue::Compression(_) => "compression",
            AttributeValue::Box2i(..) => "box2i",
            AttributeValue::LineOrder(_) => "lineOrder",
            AttributeValue::Float(_) => "float",
            AttributeValue::V2f(..) => "v2f"
        }
    }

    /// Size in bytes of the serialized value
    pub fn value_len(&self) -> usize {
        match self {
            AttributeValue::ChannelList(channels) => {
                // list terminator
                channels.iter().map(|c| c.serialized_len()).sum::<usize>() + 1
            }
            AttributeValue::Compression(_) | AttributeValue::LineOrder(_) => 1,
            AttributeValue::Box2i(..) => 16,
            AttributeValue::Float(_) => 4,
            AttributeValue::V2f(..) => 8
        }
    }

    fn write(&self, writer: &mut ExrByteWriter) {
        match self {
            AttributeValue::ChannelList(channels) => {
                for channel in channels {
                    channel.write(writer);
                }
                writer.write_u8(0);
            }
            AttributeValue::Compression(Compression::None) => writer.write_u8(0),
            AttributeValue::LineOrder(LineOrder::IncreasingY) => writer.write_u8(0),
            AttributeValue::Box2i(x_min, y_min, x_max, y_max) => {
                writer.write_i32_le(*x_min);
                writer.write_i32_le(*y_min);
                writer.write_i32_le(*x_max);
                writer.write_i32_le(*y_max);
            }
            AttributeValue::Float(value) => writer.write_f32_le(*value),
            AttributeValue::V2f(x, y) => {
                writer.write_f32_le(*x);
                writer.write_f32_le(*y);
            }
        }
    }
}

/// A named, typed header entry
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name:  &'static str,
    pub value: AttributeValue
}

impl Attribute {
    const fn new(name: &'static str, value: AttributeValue) -> Attribute {
        Attribute { name, value }
    }

    /// Bytes this attribute takes, including name, type and size field
    pub fn serialized_len(&self) -> usize {
        self.name.len() + 1 + self.value.type_name().len() + 1 + 4 + self.value.value_len()
    }

    fn write(&self, writer: &mut ExrByteWriter) {
        writer.write_null_terminated(self.name);
        writer.write_null_terminated(self.value.type_name());
        // value sizes are tiny, the cast never truncates
        writer.write_u32_le(self.value.value_len() as u32);
        self.value.write(writer);
    }
}

/// Check width and height and convert them to sizes
///
/// This runs before anything looks at the pixel buffer or the file system.
///
/// # Errors
/// [`ExrEncodeErrors::InvalidDimensions`] if either dimension is not positive
/// or the geometry cannot be described by the format's 32-bit fields.
pub fn validate_dimensions(width: i64, height: i64) -> Result<(usize, usize), ExrEncodeErrors> {
    if width <= 0 || height <= 0 {
        return Err(ExrEncodeErrors::InvalidDimensions(
            width,
            height,
            "width and height must be positive"
        ));
    }
    // block sizes are stored as i32, so a whole scanline must fit in one
    let row_bytes = width
        .checked_mul((CHANNEL_COUNT * BYTES_PER_SAMPLE) as i64)
        .filter(|bytes| *bytes <= i64::from(i32::MAX));

    if row_bytes.is_none() {
        return Err(ExrEncodeErrors::InvalidDimensions(
            width,
            height,
            "a scanline of this width does not fit a 32-bit block size"
        ));
    }
    if height > i64::from(i32::MAX) {
        return Err(ExrEncodeErrors::InvalidDimensions(
            width,
            height,
            "height does not fit the 32-bit data window"
        ));
    }
    let (w, h) = match (usize::try_from(width), usize::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(ExrEncodeErrors::InvalidDimensions(
                width,
                height,
                "dimensions do not fit in memory sizes"
            ))
        }
    };
    if w.checked_mul(h)
        .and_then(|pixels| pixels.checked_mul(CHANNEL_COUNT * BYTES_PER_SAMPLE))
        .is_none()
    {
        return Err(ExrEncodeErrors::InvalidDimensions(
            width,
            height,
            "image size overflows"
        ));
    }
    Ok((w, h))
}

/// Magic, version and the attribute list of an RGBA f32 scanline image
#[derive(Clone, Debug, PartialEq)]
pub struct FileHeader {
    width:      usize,
    height:     usize,
    attributes: Vec<Attribute>
}

impl FileHeader {
    /// Build the header for an image of `width` x `height`
    ///
    /// # Errors
    /// [`ExrEncodeErrors::InvalidDimensions`], see [`validate_dimensions`]
    pub fn new(width: i64, height: i64) -> Result<FileHeader, ExrEncodeErrors> {
        let (w, h) = validate_dimensions(width, height)?;

        debug!("Building EXR header for a {w}x{h} image");

        // validated above, both fit in i32
        let x_max = (w - 1) as i32;
        let y_max = (h - 1) as i32;

        let attributes = vec![
            Attribute::new("channels", AttributeValue::ChannelList(rgba_channels())),
            Attribute::new("compression", AttributeValue::Compression(Compression::None)),
            Attribute::new("dataWindow", AttributeValue::Box2i(0, 0, x_max, y_max)),
            Attribute::new("displayWindow", AttributeValue::Box2i(0, 0, x_max, y_max)),
            Attribute::new("lineOrder", AttributeValue::LineOrder(LineOrder::IncreasingY)),
            Attribute::new("pixelAspectRatio", AttributeValue::Float(1.0)),
            Attribute::new("screenWindowCenter", AttributeValue::V2f(0.0, 0.0)),
            Attribute::new("screenWindowWidth", AttributeValue::Float(1.0)),
        ];

        Ok(FileHeader {
            width: w,
            height: h,
            attributes
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }

    /// The channels as they are laid out in every scanline
    pub fn channels(&self) -> &[ChannelDescriptor] {
        match self.attribute("channels") {
            Some(AttributeValue::ChannelList(channels)) => channels,
            _ => &[]
        }
    }

    /// Payload bytes of one scanline block
    pub const fn scanline_payload_len(&self) -> usize {
        self.width * CHANNEL_COUNT * BYTES_PER_SAMPLE
    }

    /// Length of the attribute list including its terminator
    pub fn attributes_len(&self) -> usize {
        self.attributes
            .iter()
            .map(|attr| attr.serialized_len())
            .sum::<usize>()
            + 1
    }

    /// Length of magic, version and attribute list
    pub fn encoded_len(&self) -> usize {
        8 + self.attributes_len()
    }

    /// Write magic, version and the terminated attribute list
    pub fn write(&self, writer: &mut ExrByteWriter) {
        writer.reserve(self.encoded_len());
        writer.write_u32_le(EXR_MAGIC);
        writer.write_u32_le(EXR_VERSION);

        for attribute in &self.attributes {
            attribute.write(writer);
        }
        writer.write_u8(0);
    }
}

#[cfg(test)]
mod tests {
    use crate::bytestream::ExrByteWriter;
    use crate::errors::ExrErrorKind;
    use crate::header::{rgba_channels, validate_dimensions, AttributeValue, FileHeader};

    #[test]
    fn channels_are_sorted() {
        let names: Vec<_> = rgba_channels().iter().map(|c| c.name).collect();
        assert_eq!(names, ["A", "B", "G", "R"]);
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        for (w, h) in [(0, 5), (5, 0), (-1, 3), (3, -7), (0, 0)] {
            let err = FileHeader::new(w, h).unwrap_err();
            assert_eq!(err.kind(), ExrErrorKind::InvalidDimensions);
        }
    }

    #[test]
    fn too_wide_scanlines_are_rejected() {
        let max_width = i64::from(i32::MAX) / 16;
        assert!(validate_dimensions(max_width, 1).is_ok());
        let err = validate_dimensions(max_width + 1, 1).unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::InvalidDimensions);
        let err = validate_dimensions(1, i64::from(i32::MAX) + 1).unwrap_err();
        assert_eq!(err.kind(), ExrErrorKind::InvalidDimensions);
    }

    #[test]
    fn windows_follow_dimensions() {
        let header = FileHeader::new(640, 480).unwrap();
        assert_eq!(
            header.attribute("dataWindow"),
            Some(&AttributeValue::Box2i(0, 0, 639, 479))
        );
        assert_eq!(
            header.attribute("displayWindow"),
            header.attribute("dataWindow")
        );
        assert_eq!(header.scanline_payload_len(), 640 * 16);
    }

    #[test]
    fn channel_list_is_the_first_attribute() {
        let header = FileHeader::new(4, 4).unwrap();
        let names: Vec<_> = header.attributes().iter().map(|attr| attr.name).collect();
        assert_eq!(
            names,
            [
                "channels",
                "compression",
                "dataWindow",
                "displayWindow",
                "lineOrder",
                "pixelAspectRatio",
                "screenWindowCenter",
                "screenWindowWidth"
            ]
        );
        assert_eq!(header.channels(), rgba_channels().as_slice());
        assert!(header.channels().iter().all(|c| c.x_sampling == 1 && c.y_sampling == 1));
    }

    #[test]
    fn header_byte_layout() {
        let header = FileHeader::new(2, 1).unwrap();
        // the attribute list of an RGBA f32 image is always 323 bytes
        assert_eq!(header.attributes_len(), 323);

        let mut out = vec![];
        header.write(&mut ExrByteWriter::new(&mut out));
        assert_eq!(out.len(), header.encoded_len());
        assert_eq!(&out[0..4], &[0x01, 0x31, 0x2f, 0x76]);
        assert_eq!(&out[4..8], &[2, 0, 0, 0]);
        assert!(out[8..].starts_with(b"channels\0chlist\0"));
        // size of a four channel list: 4 * (2 + 16) + 1
        assert_eq!(&out[24..28], &73_u32.to_le_bytes());
        assert!(out[28..].starts_with(b"A\0"));
        assert_eq!(*out.last().unwrap(), 0);
    }
}
