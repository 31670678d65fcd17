/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A little endian byte writer
//!
//! Everything in an EXR file (and in HDRBIN) is stored little endian,
//! so unlike the general purpose zune writers this one has no notion
//! of mode and always appends to a growable vector.

use alloc::vec::Vec;
use core::mem::size_of;

/// Appends endian aware values to a borrowed vector
pub struct ExrByteWriter<'a> {
    buffer: &'a mut Vec<u8>,
    start:  usize
}

impl<'a> ExrByteWriter<'a> {
    /// Create a new writer appending to `buffer`
    ///
    /// Bytes already present in the buffer are left alone and
    /// are not counted by [`position`](Self::position)
    pub fn new(buffer: &'a mut Vec<u8>) -> ExrByteWriter<'a> {
        let start = buffer.len();
        ExrByteWriter { buffer, start }
    }

    /// Return the number of bytes this writer has appended
    ///
    /// ```
    /// use zune_exr::bytestream::ExrByteWriter;
    /// let mut sink = vec![1, 2, 3];
    /// let mut writer = ExrByteWriter::new(&mut sink);
    /// writer.write_u32_le(7);
    /// assert_eq!(writer.position(), 4);
    /// ```
    pub fn position(&self) -> usize {
        self.buffer.len() - self.start
    }

    /// Reserve space for at least `additional` more bytes
    pub fn reserve(&mut self, additional: usize) {
        self.buffer.reserve(additional);
    }

    /// Write a single byte
    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    /// Write raw bytes as is
    #[inline]
    pub fn write_all(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Write `string` followed by a null terminator
    pub fn write_null_terminated(&mut self, string: &str) {
        self.buffer.extend_from_slice(string.as_bytes());
        self.buffer.push(0);
    }
}

macro_rules! write_single_type {
    ($name:tt,$int_type:tt) => {
        impl<'a> ExrByteWriter<'a> {
            #[doc=concat!("Write ",stringify!($int_type)," as a little endian value")]
            #[inline]
            pub fn $name(&mut self, value: $int_type) {
                const SIZE: usize = size_of::<$int_type>();
                let bytes: [u8; SIZE] = value.to_le_bytes();
                self.buffer.extend_from_slice(&bytes);
            }
        }
    };
}

write_single_type!(write_u16_le, u16);
write_single_type!(write_u32_le, u32);
write_single_type!(write_i32_le, i32);
write_single_type!(write_u64_le, u64);
write_single_type!(write_f32_le, f32);

#[cfg(test)]
mod tests {
    use crate::bytestream::ExrByteWriter;

    #[test]
    fn writes_are_little_endian() {
        let mut sink = vec![];
        let mut writer = ExrByteWriter::new(&mut sink);
        writer.write_u32_le(0x762f_3101);
        writer.write_i32_le(-1);
        writer.write_f32_le(1.0);
        assert_eq!(writer.position(), 12);

        assert_eq!(&sink[0..4], &[0x01, 0x31, 0x2f, 0x76]);
        assert_eq!(&sink[4..8], &[0xff; 4]);
        assert_eq!(&sink[8..12], &1.0_f32.to_le_bytes());
    }

    #[test]
    fn null_terminated_strings() {
        let mut sink = vec![];
        ExrByteWriter::new(&mut sink).write_null_terminated("R");
        assert_eq!(sink, b"R\0");
    }
}
