/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! All-or-nothing file output
//!
//! Encoded bytes go to a temporary file created next to the destination,
//! which is renamed over the destination once everything is written.
//! Readers of the destination therefore see either the previous file,
//! no file, or the complete new one.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use zune_core::log::{debug, trace, warn};

use crate::errors::ExrEncodeErrors;
use crate::options::ExrEncoderOptions;

/// Suffix of temporary files, a crashed process may leave these behind
pub const TEMP_SUFFIX: &str = ".tmp";

fn create_failed(path: &Path, reason: &'static str) -> ExrEncodeErrors {
    ExrEncodeErrors::FileCreateFailed(
        path.to_path_buf(),
        std::io::Error::new(std::io::ErrorKind::InvalidInput, reason)
    )
}

/// Directory the temporary file has to live in for the rename to be atomic
fn sibling_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from(".")
    }
}

/// Remove an unpublished temporary file
fn discard(temp: NamedTempFile) {
    let temp_path = temp.path().to_path_buf();

    if let Err(err) = temp.close() {
        warn!("Could not remove temporary file {temp_path:?}: {err}");
    } else {
        trace!("Removed temporary file {temp_path:?}");
    }
}

/// Write a file at `path` through `write`, publishing it only on success
///
/// `write` receives a buffered handle to the temporary file and returns the
/// number of bytes it wrote. Any error it returns, as well as flush, sync and
/// rename failures, removes the temporary file and leaves `path` untouched.
///
/// # Errors
/// - [`ExrEncodeErrors::FileCreateFailed`] if the temporary file cannot be created
/// - [`ExrEncodeErrors::WriteFailed`] for any later I/O failure
/// - whatever `write` returns
pub fn publish_atomically<F>(
    path: &Path, options: &ExrEncoderOptions, write: F
) -> Result<usize, ExrEncodeErrors>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<usize, ExrEncodeErrors>
{
    let file_name = path
        .file_name()
        .ok_or_else(|| create_failed(path, "destination path has no file name"))?;

    let prefix = format!(".{}.", file_name.to_string_lossy());
    let dir = sibling_dir(path);

    let mut temp = Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(&dir)
        .map_err(|err| ExrEncodeErrors::FileCreateFailed(path.to_path_buf(), err))?;

    debug!("Writing {path:?} through {:?}", temp.path());

    let written = {
        let mut out = BufWriter::new(temp.as_file_mut());

        let result = write(&mut out).and_then(|written| {
            out.flush()?;
            Ok(written)
        });
        drop(out);

        match result {
            Ok(written) => written,
            Err(err) => {
                discard(temp);
                return Err(err.with_path(path));
            }
        }
    };

    if options.sync_before_publish() {
        if let Err(err) = temp.as_file().sync_all() {
            discard(temp);
            return Err(ExrEncodeErrors::WriteFailed(Some(path.to_path_buf()), err));
        }
    }

    let published = if options.no_clobber() {
        temp.persist_noclobber(path)
    } else {
        temp.persist(path)
    };

    match published {
        Ok(_) => {
            debug!("Published {written} bytes to {path:?}");
            Ok(written)
        }
        Err(err) => {
            discard(err.file);
            Err(ExrEncodeErrors::WriteFailed(
                Some(path.to_path_buf()),
                err.error
            ))
        }
    }
}
