/*
 * Copyright (c) 2023.
 *
 * This software is free software; You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! An OpenEXR encoder
//!
//! Turns a flat buffer of interleaved RGBA `f32` samples into a single part,
//! uncompressed scanline EXR file.
//!
//! # Features
//! - Minimal interface, few dependencies
//! - No unsafe
//! - Files are written to a sibling temporary file and renamed into place,
//!   so a failed write never leaves a truncated image behind
//!
//! # Layout
//! ```text
//! ╔══════════════╤═══════════════════════════════════════════════════════╗
//! ║ Bytes        │ Description                                           ║
//! ╠══════════════╪═══════════════════════════════════════════════════════╣
//! ║ 4            │ magic 0x762f3101                                      ║
//! ╟──────────────┼───────────────────────────────────────────────────────╢
//! ║ 4            │ version 2, no flags                                   ║
//! ╟──────────────┼───────────────────────────────────────────────────────╢
//! ║ ...          │ attributes: name\0 type\0 size value, ended by \0     ║
//! ╟──────────────┼───────────────────────────────────────────────────────╢
//! ║ 8 * height   │ absolute offset of every scanline block               ║
//! ╟──────────────┼───────────────────────────────────────────────────────╢
//! ║ per row      │ y, payload size, then the A, B, G, R runs of the row  ║
//! ╚══════════════╧═══════════════════════════════════════════════════════╝
//! ```
//! All numbers are little endian.
//!
//! # Usage notes
//! Pixels are expected top row first, with a mandatory alpha channel. The
//! encoder does not interpret the samples in any way, values are stored as is.
//!
//! The same input can also be stored as HDRBIN, a raw dump used by some
//! capture pipelines, via [`HdrBinEncoder`] or [`write_hdrbin_image`].
//!
//! # Example
//! ```no_run
//! use zune_exr::write_image;
//! // a single opaque white pixel
//! let pixels = [1.0, 1.0, 1.0, 1.0];
//! write_image("white.exr", 1, 1, &pixels).unwrap();
//! ```
#![forbid(unsafe_code)]
#![macro_use]
extern crate alloc;
extern crate core;
pub extern crate zune_core;

use std::path::Path;

pub use encoder::ExrEncoder;
pub use errors::{ExrEncodeErrors, ExrErrorKind};
pub use hdrbin::HdrBinEncoder;
pub use options::{ExrEncoderOptions, WriteFlags};

pub mod bytestream;
mod encoder;
mod errors;
pub mod file_io;
pub mod hdrbin;
pub mod header;
mod options;
pub mod packer;
pub mod scanline;

/// Write an RGBA `f32` image to `path` as an OpenEXR file
///
/// # Arguments
/// - `path`: Destination, replaced atomically if it already exists
/// - `width`, `height`: Image dimensions, both must be positive
/// - `pixels`: `width*height*4` samples, interleaved `R,G,B,A`, row-major,
///   top row first
///
/// # Returns
/// - Ok(usize): Size of the written file
/// - Err(ExrEncodeErrors): Why nothing was written. Dimension and buffer errors
///   are found before the file system is touched, I/O errors leave `path`
///   as it was.
pub fn write_image<P: AsRef<Path>>(
    path: P, width: i64, height: i64, pixels: &[f32]
) -> Result<usize, ExrEncodeErrors> {
    let (w, h) = header::validate_dimensions(width, height)?;
    ExrEncoder::new(pixels, ExrEncoderOptions::new(w, h)).write_to_file(path)
}

/// Write an RGBA `f32` image to `path` in the HDRBIN raw format
///
/// Takes the same arguments and gives the same guarantees as [`write_image`]
pub fn write_hdrbin_image<P: AsRef<Path>>(
    path: P, width: i64, height: i64, pixels: &[f32]
) -> Result<usize, ExrEncodeErrors> {
    let (w, h) = header::validate_dimensions(width, height)?;
    HdrBinEncoder::new(pixels, ExrEncoderOptions::new(w, h)).write_to_file(path)
}
