// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Growable byte buffer and checked reader.
//!
//! All multi-byte scalars are little-endian regardless of the host. Variable-length
//! integers use a base-128 continuation scheme: seven payload bits per byte with the
//! high bit meaning "more bytes follow". Three widths are provided:
//!
//! | encoding          | max bytes | last byte                   |
//! |-------------------|-----------|-----------------------------|
//! | `varuint32`       | 5         | 4 payload bits, no continue |
//! | `varuint36_small` | 5         | 8 payload bits              |
//! | `varuint64`       | 9         | 8 payload bits              |
//!
//! Signed variants are zigzag-encoded on top of the unsigned ones.

use crate::error::Error;
use crate::meta::string_util::is_latin;
use byteorder::{ByteOrder, LittleEndian};

pub const MAX_VARUINT32_BYTES: usize = 5;
pub const MAX_VARUINT36_SMALL_BYTES: usize = 5;
pub const MAX_VARUINT64_BYTES: usize = 9;
pub const VARUINT36_SMALL_LIMIT: u64 = 1 << 36;

macro_rules! fixed_width_rw {
    ($ty:ty, $size:expr, $write:ident, $put_at:ident, $read:ident, $get_at:ident, $bo_write:ident, $bo_read:ident) => {
        impl Writer {
            #[inline(always)]
            pub fn $write(&mut self, value: $ty) {
                let mut tmp = [0u8; $size];
                LittleEndian::$bo_write(&mut tmp, value);
                self.bf.extend_from_slice(&tmp);
            }

            /// Overwrites previously written bytes at an absolute offset.
            #[inline(always)]
            pub fn $put_at(&mut self, offset: usize, value: $ty) -> Result<(), Error> {
                let end = offset + $size;
                if end > self.bf.len() {
                    return Err(Error::buffer_out_of_bound(offset, $size, self.bf.len()));
                }
                LittleEndian::$bo_write(&mut self.bf[offset..end], value);
                Ok(())
            }

            #[inline(always)]
            pub fn $get_at(&self, offset: usize) -> Result<$ty, Error> {
                let end = offset + $size;
                if end > self.bf.len() {
                    return Err(Error::buffer_out_of_bound(offset, $size, self.bf.len()));
                }
                Ok(LittleEndian::$bo_read(&self.bf[offset..end]))
            }
        }

        impl<'a> Reader<'a> {
            #[inline(always)]
            pub fn $read(&mut self) -> Result<$ty, Error> {
                self.check_bound($size)?;
                let value = LittleEndian::$bo_read(&self.bf[self.cursor..self.cursor + $size]);
                self.cursor += $size;
                Ok(value)
            }

            /// Reads at an absolute offset without moving the cursor.
            #[inline(always)]
            pub fn $get_at(&self, offset: usize) -> Result<$ty, Error> {
                let end = offset + $size;
                if end > self.bf.len() {
                    return Err(Error::buffer_out_of_bound(offset, $size, self.bf.len()));
                }
                Ok(LittleEndian::$bo_read(&self.bf[offset..end]))
            }
        }
    };
}

/// Owned, growable output buffer with a write cursor at its end.
#[derive(Default, Debug, Clone)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            bf: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn reset(&mut self) {
        self.bf.clear();
    }

    /// Drops everything written after the first `len` bytes.
    #[inline(always)]
    pub fn truncate(&mut self, len: usize) {
        self.bf.truncate(len);
    }

    /// Copies the written bytes out.
    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bf
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    #[inline(always)]
    pub fn reserve(&mut self, additional: usize) {
        self.bf.reserve(additional);
    }

    /// Appends `len` zero bytes, to be patched later with `put_*_at`/`set_bytes`.
    #[inline(always)]
    pub fn skip(&mut self, len: usize) {
        self.bf.resize(self.bf.len() + len, 0);
    }

    pub fn set_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), Error> {
        let end = offset + data.len();
        if end > self.bf.len() {
            return Err(Error::buffer_out_of_bound(offset, data.len(), self.bf.len()));
        }
        self.bf[offset..end].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    #[inline(always)]
    pub fn write_bool(&mut self, value: bool) {
        self.bf.push(value as u8);
    }

    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) {
        self.bf.push(value as u8);
    }

    pub fn put_u8_at(&mut self, offset: usize, value: u8) -> Result<(), Error> {
        match self.bf.get_mut(offset) {
            Some(b) => {
                *b = value;
                Ok(())
            }
            None => Err(Error::buffer_out_of_bound(offset, 1, self.bf.len())),
        }
    }

    #[inline(always)]
    pub fn write_varint32(&mut self, value: i32) {
        let zigzag = ((value << 1) ^ (value >> 31)) as u32;
        self.write_varuint32(zigzag);
    }

    pub fn write_varuint32(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.bf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.bf.push(value as u8);
    }

    #[inline(always)]
    pub fn write_varint64(&mut self, value: i64) {
        let zigzag = ((value << 1) ^ (value >> 63)) as u64;
        self.write_varuint64(zigzag);
    }

    pub fn write_varuint64(&mut self, mut value: u64) {
        for _ in 0..MAX_VARUINT64_BYTES - 1 {
            if value < 0x80 {
                self.bf.push(value as u8);
                return;
            }
            self.bf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        // ninth byte carries the remaining eight bits
        self.bf.push(value as u8);
    }

    /// Writes a value below 2^36, tuned for sizes and counts that are usually small.
    pub fn write_varuint36_small(&mut self, value: u64) -> Result<(), Error> {
        if value >= VARUINT36_SMALL_LIMIT {
            return Err(Error::encode_error(format!(
                "value {value} does not fit in a 36-bit varint"
            )));
        }
        let mut value = value;
        for _ in 0..MAX_VARUINT36_SMALL_BYTES - 1 {
            if value < 0x80 {
                self.bf.push(value as u8);
                return Ok(());
            }
            self.bf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.bf.push(value as u8);
        Ok(())
    }

    /// Writes chars as single bytes. Callers check the string is Latin-1 first.
    pub fn write_latin1_string(&mut self, s: &str) {
        debug_assert!(is_latin(s));
        self.bf.extend(s.chars().map(|c| c as u32 as u8));
    }

    #[inline(always)]
    pub fn write_utf8_string(&mut self, s: &str) {
        self.bf.extend_from_slice(s.as_bytes());
    }

    pub fn write_utf16_bytes(&mut self, units: &[u16]) {
        self.bf.reserve(units.len() * 2);
        for unit in units {
            self.write_u16(*unit);
        }
    }
}

/// Checked cursor over a borrowed byte slice.
///
/// Every read validates bounds first and fails with `BufferOutOfBound` on truncated
/// input; the cursor never moves past the end of the slice.
#[derive(Default, Debug, Clone)]
pub struct Reader<'a> {
    pub(crate) bf: &'a [u8],
    pub(crate) cursor: usize,
}

impl<'a> Reader<'a> {
    #[inline(always)]
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader { bf, cursor: 0 }
    }

    #[inline(always)]
    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: usize) -> Result<(), Error> {
        if cursor > self.bf.len() {
            return Err(Error::buffer_out_of_bound(cursor, 0, self.bf.len()));
        }
        self.cursor = cursor;
        Ok(())
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    #[inline(always)]
    pub fn slice_after_cursor(&self) -> &'a [u8] {
        &self.bf[self.cursor..]
    }

    pub fn sub_slice(&self, start: usize, end: usize) -> Result<&'a [u8], Error> {
        if end > self.bf.len() || end < start {
            return Err(Error::buffer_out_of_bound(
                start,
                end.saturating_sub(start),
                self.bf.len(),
            ));
        }
        Ok(&self.bf[start..end])
    }

    #[inline(always)]
    fn check_bound(&self, n: usize) -> Result<(), Error> {
        if self.cursor + n > self.bf.len() {
            Err(Error::buffer_out_of_bound(self.cursor, n, self.bf.len()))
        } else {
            Ok(())
        }
    }

    #[inline(always)]
    pub fn peek_u8(&self) -> Result<u8, Error> {
        match self.bf.get(self.cursor) {
            Some(b) => Ok(*b),
            None => Err(Error::buffer_out_of_bound(self.cursor, 1, self.bf.len())),
        }
    }

    #[inline(always)]
    pub fn peek_i8(&self) -> Result<i8, Error> {
        Ok(self.peek_u8()? as i8)
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let b = self.peek_u8()?;
        self.cursor += 1;
        Ok(b)
    }

    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    #[inline(always)]
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        let mut result = 0u32;
        for i in 0..MAX_VARUINT32_BYTES {
            let b = self.read_u8()? as u32;
            if i == MAX_VARUINT32_BYTES - 1 {
                if b & 0x80 != 0 {
                    return Err(Error::invalid_data(
                        "varuint32 continues past its 5-byte budget",
                    ));
                }
                if b > 0x0F {
                    return Err(Error::invalid_data("varuint32 overflows 32 bits"));
                }
            }
            result |= (b & 0x7F) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        Ok(result)
    }

    #[inline(always)]
    pub fn read_varint32(&mut self) -> Result<i32, Error> {
        let encoded = self.read_varuint32()?;
        Ok(((encoded >> 1) as i32) ^ -((encoded & 1) as i32))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        let mut result = 0u64;
        for i in 0..MAX_VARUINT64_BYTES - 1 {
            let b = self.read_u8()? as u64;
            result |= (b & 0x7F) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        let last = self.read_u8()? as u64;
        Ok(result | (last << 56))
    }

    #[inline(always)]
    pub fn read_varint64(&mut self) -> Result<i64, Error> {
        let encoded = self.read_varuint64()?;
        Ok(((encoded >> 1) as i64) ^ -((encoded & 1) as i64))
    }

    pub fn read_varuint36_small(&mut self) -> Result<u64, Error> {
        let mut result = 0u64;
        for i in 0..MAX_VARUINT36_SMALL_BYTES - 1 {
            let b = self.read_u8()? as u64;
            result |= (b & 0x7F) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        let last = self.read_u8()? as u64;
        Ok(result | (last << 28))
    }

    pub fn read_latin1_string(&mut self, len: usize) -> Result<String, Error> {
        let bytes = self.read_bytes(len)?;
        Ok(bytes.iter().map(|b| *b as char).collect())
    }

    pub fn read_utf8_string(&mut self, len: usize) -> Result<String, Error> {
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::encoding_error(format!("invalid utf8 string: {e}")))
    }

    /// Reads `len` bytes of little-endian UTF-16 code units.
    pub fn read_utf16_string(&mut self, len: usize) -> Result<String, Error> {
        if len % 2 != 0 {
            return Err(Error::encoding_error(format!(
                "utf16 byte length must be even, got {len}"
            )));
        }
        let bytes = self.read_bytes(len)?;
        let units: Vec<u16> = bytes.chunks_exact(2).map(LittleEndian::read_u16).collect();
        String::from_utf16(&units)
            .map_err(|e| Error::encoding_error(format!("invalid utf16 string: {e}")))
    }

    #[inline(always)]
    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check_bound(len)?;
        self.cursor += len;
        Ok(())
    }

    #[inline(always)]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.check_bound(len)?;
        let result = &self.bf[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(result)
    }
}

fixed_width_rw!(u16, 2, write_u16, put_u16_at, read_u16, get_u16_at, write_u16, read_u16);
fixed_width_rw!(i16, 2, write_i16, put_i16_at, read_i16, get_i16_at, write_i16, read_i16);
fixed_width_rw!(u32, 4, write_u32, put_u32_at, read_u32, get_u32_at, write_u32, read_u32);
fixed_width_rw!(i32, 4, write_i32, put_i32_at, read_i32, get_i32_at, write_i32, read_i32);
fixed_width_rw!(u64, 8, write_u64, put_u64_at, read_u64, get_u64_at, write_u64, read_u64);
fixed_width_rw!(i64, 8, write_i64, put_i64_at, read_i64, get_i64_at, write_i64, read_i64);
fixed_width_rw!(f32, 4, write_f32, put_f32_at, read_f32, get_f32_at, write_f32, read_f32);
fixed_width_rw!(f64, 8, write_f64, put_f64_at, read_f64, get_f64_at, write_f64, read_f64);
