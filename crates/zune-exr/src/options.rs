/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Encoder options
//!
//! Geometry and layout of the image being encoded, plus a few
//! flags that control how files are published to disk.

use bitflags::bitflags;
use zune_core::bit_depth::BitDepth;
use zune_core::colorspace::ColorSpace;

bitflags! {
    /// Flags controlling how an encoded file reaches the disk
    #[derive(Copy, Debug, Clone, Eq, PartialEq)]
    pub struct WriteFlags: u32 {
        /// Call `fsync` on the temporary file before renaming it
        const SYNC_BEFORE_PUBLISH = 0b0000_0001;
        /// Fail instead of replacing a file already at the destination
        const NO_CLOBBER          = 0b0000_0010;
    }
}

impl Default for WriteFlags {
    fn default() -> Self {
        WriteFlags::SYNC_BEFORE_PUBLISH
    }
}

/// Options for the encoders in this crate
///
/// Both encoders only accept interleaved RGBA `f32` data, the
/// colorspace and depth are carried so that callers holding
/// other layouts get a clear error rather than garbage output.
#[derive(Debug, Copy, Clone)]
pub struct ExrEncoderOptions {
    width:      usize,
    height:     usize,
    colorspace: ColorSpace,
    depth:      BitDepth,
    flags:      WriteFlags
}

impl Default for ExrEncoderOptions {
    fn default() -> Self {
        Self {
            width:      0,
            height:     0,
            colorspace: ColorSpace::RGBA,
            depth:      BitDepth::Float32,
            flags:      WriteFlags::default()
        }
    }
}

impl ExrEncoderOptions {
    /// Options for an RGBA `f32` image of `width` x `height`
    pub fn new(width: usize, height: usize) -> ExrEncoderOptions {
        ExrEncoderOptions::default()
            .set_width(width)
            .set_height(height)
    }

    /// Get the width for which the image will be encoded in
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Get height for which the image will be encoded in
    pub const fn height(&self) -> usize {
        self.height
    }

    pub const fn colorspace(&self) -> ColorSpace {
        self.colorspace
    }

    pub const fn depth(&self) -> BitDepth {
        self.depth
    }

    pub const fn flags(&self) -> WriteFlags {
        self.flags
    }

    /// Whether the temporary file is synced before it replaces the destination
    pub const fn sync_before_publish(&self) -> bool {
        self.flags.contains(WriteFlags::SYNC_BEFORE_PUBLISH)
    }

    /// Whether an existing destination file makes the write fail
    pub const fn no_clobber(&self) -> bool {
        self.flags.contains(WriteFlags::NO_CLOBBER)
    }

    /// Set width for the image to be encoded
    pub fn set_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Set height for the image to be encoded
    pub fn set_height(mut self, height: usize) -> Self {
        self.height = height;
        self
    }

    /// Set the colorspace of the input data
    pub fn set_colorspace(mut self, colorspace: ColorSpace) -> Self {
        self.colorspace = colorspace;
        self
    }

    /// Set the depth of the input data
    pub fn set_depth(mut self, depth: BitDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Toggle syncing the file to disk before publishing it
    ///
    /// Turning this off trades durability on power loss for speed,
    /// the rename itself stays atomic.
    pub fn set_sync_before_publish(mut self, yes: bool) -> Self {
        self.flags.set(WriteFlags::SYNC_BEFORE_PUBLISH, yes);
        self
    }

    /// Refuse to replace an existing file at the destination
    pub fn set_no_clobber(mut self, yes: bool) -> Self {
        self.flags.set(WriteFlags::NO_CLOBBER, yes);
        self
    }
}
