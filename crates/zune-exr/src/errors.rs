/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use core::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

use zune_core::bit_depth::BitDepth;
use zune_core::colorspace::ColorSpace;

/// The broad category an [`ExrEncodeErrors`] falls into
///
/// Callers deciding whether to retry can match on this instead
/// of on the full error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ExrErrorKind {
    /// Width or height is not positive or not representable
    InvalidDimensions,
    /// The pixel buffer length disagrees with the declared geometry
    BufferSizeMismatch,
    /// The encoder options describe a layout other than RGBA f32
    UnsupportedLayout,
    /// The temporary output file could not be created
    FileCreateFailed,
    /// An I/O error occurred while writing or publishing the file
    WriteFailed
}

/// Errors possible during encoding
pub enum ExrEncodeErrors {
    /// Width or height is zero, negative or too large for the format.
    ///
    /// # Arguments
    /// - width as given by the caller
    /// - height as given by the caller
    /// - the reason the pair was rejected
    InvalidDimensions(i64, i64, &'static str),
    /// The input size was expected to be of a certain size but isn't
    ///
    /// # Arguments
    /// - 1st argument is the number of samples we expected
    /// - 2nd argument is the number of samples found
    BufferSizeMismatch(usize, usize),
    /// The options passed to the encoder are not RGBA with `f32` samples
    UnsupportedLayout(ColorSpace, BitDepth),
    /// The temporary file next to the destination could not be created
    FileCreateFailed(PathBuf, std::io::Error),
    /// Writing, syncing or renaming the output failed.
    ///
    /// The path is `None` when encoding into a caller provided sink.
    WriteFailed(Option<PathBuf>, std::io::Error)
}

impl ExrEncodeErrors {
    /// Return the category of this error
    pub const fn kind(&self) -> ExrErrorKind {
        match self {
            ExrEncodeErrors::InvalidDimensions(..) => ExrErrorKind::InvalidDimensions,
            ExrEncodeErrors::BufferSizeMismatch(..) => ExrErrorKind::BufferSizeMismatch,
            ExrEncodeErrors::UnsupportedLayout(..) => ExrErrorKind::UnsupportedLayout,
            ExrEncodeErrors::FileCreateFailed(..) => ExrErrorKind::FileCreateFailed,
            ExrEncodeErrors::WriteFailed(..) => ExrErrorKind::WriteFailed
        }
    }

    /// Return the underlying system error for I/O failures
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            ExrEncodeErrors::FileCreateFailed(_, err) | ExrEncodeErrors::WriteFailed(_, err) => {
                Some(err)
            }
            _ => None
        }
    }

    /// Attach a destination path to a sink error that has none yet
    pub(crate) fn with_path(self, path: &std::path::Path) -> ExrEncodeErrors {
        match self {
            ExrEncodeErrors::WriteFailed(None, err) => {
                ExrEncodeErrors::WriteFailed(Some(path.to_path_buf()), err)
            }
            other => other
        }
    }
}

impl Debug for ExrEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ExrEncodeErrors::InvalidDimensions(width, height, reason) => {
                writeln!(f, "Invalid dimensions {width}x{height}: {reason}")
            }
            ExrEncodeErrors::BufferSizeMismatch(expected, found) => {
                writeln!(
                    f,
                    "Pixel buffer has {found} samples but the image needs {expected} (width*height*4)"
                )
            }
            ExrEncodeErrors::UnsupportedLayout(colorspace, depth) => {
                writeln!(
                    f,
                    "Unsupported layout {colorspace:?}/{depth:?}, EXR encoding expects RGBA f32 data"
                )
            }
            ExrEncodeErrors::FileCreateFailed(path, err) => {
                writeln!(f, "Could not create a temporary file for {path:?}: {err}")
            }
            ExrEncodeErrors::WriteFailed(Some(path), err) => {
                writeln!(f, "Writing {path:?} failed: {err}")
            }
            ExrEncodeErrors::WriteFailed(None, err) => {
                writeln!(f, "I/O error {err}")
            }
        }
    }
}

impl Display for ExrEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for ExrEncodeErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExrEncodeErrors::FileCreateFailed(_, err) | ExrEncodeErrors::WriteFailed(_, err) => {
                Some(err)
            }
            _ => None
        }
    }
}

impl From<std::io::Error> for ExrEncodeErrors {
    fn from(value: std::io::Error) -> Self {
        ExrEncodeErrors::WriteFailed(None, value)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::path::Path;

    use crate::errors::{ExrEncodeErrors, ExrErrorKind};

    #[test]
    fn io_kinds_expose_source() {
        let err = ExrEncodeErrors::from(std::io::Error::other("disk on fire"));
        assert_eq!(err.kind(), ExrErrorKind::WriteFailed);
        assert!(err.source().is_some());
        assert!(err.io_error().is_some());
    }

    #[test]
    fn validation_kinds_have_no_source() {
        let err = ExrEncodeErrors::BufferSizeMismatch(16, 15);
        assert_eq!(err.kind(), ExrErrorKind::BufferSizeMismatch);
        assert!(err.source().is_none());
        assert!(format!("{err}").contains("15"));
    }

    #[test]
    fn path_is_attached_once() {
        let err = ExrEncodeErrors::from(std::io::Error::other("short write"))
            .with_path(Path::new("a.exr"))
            .with_path(Path::new("b.exr"));

        match err {
            ExrEncodeErrors::WriteFailed(Some(path), _) => assert_eq!(path, Path::new("a.exr")),
            other => panic!("unexpected error {other:?}")
        }
    }
}
