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

use super::array::check_region;
use super::layout::{SlotTable, WORD_SIZE};
use super::BinaryArray;
use crate::buffer::Writer;
use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian};
use std::borrow::Cow;

/// View of a map region: `[key array length: i32][reserved: 4 bytes][key array][value array]`.
///
/// The value array takes the rest of the region. Binding fails when the key length
/// is negative or exceeds the region, when either array does not fit its part, or
/// when the two arrays hold different element counts.
#[derive(Clone, Debug)]
pub struct BinaryMap<'a> {
    buffer: Cow<'a, [u8]>,
    base_offset: usize,
    size_in_bytes: usize,
    key_size: usize,
    keys: SlotTable,
    values: SlotTable,
}

impl<'a> BinaryMap<'a> {
    pub fn point_to(buffer: &'a [u8], offset: usize, size: usize) -> Result<BinaryMap<'a>, Error> {
        Self::bind(Cow::Borrowed(buffer), offset, size)
    }

    fn bind(buffer: Cow<'a, [u8]>, offset: usize, size: usize) -> Result<BinaryMap<'a>, Error> {
        check_region(buffer.len(), offset, size)?;
        crate::ensure!(
            size >= WORD_SIZE,
            "map region of {} bytes has no key length",
            size
        );
        let key_size = LittleEndian::read_i32(&buffer[offset..offset + 4]) as i64;
        let value_size = size as i64 - WORD_SIZE as i64 - key_size;
        crate::ensure!(
            key_size >= 0 && value_size >= 0,
            "map region of {} bytes cannot hold a {}-byte key array",
            size,
            key_size
        );
        let key_size = key_size as usize;
        let keys = BinaryArray::layout(&buffer, offset + WORD_SIZE, key_size)?;
        let values = BinaryArray::layout(
            &buffer,
            offset + WORD_SIZE + key_size,
            value_size as usize,
        )?;
        crate::ensure!(
            keys.len() == values.len(),
            "map has {} keys but {} values",
            keys.len(),
            values.len()
        );
        Ok(BinaryMap {
            buffer,
            base_offset: offset,
            size_in_bytes: size,
            key_size,
            keys,
            values,
        })
    }

    /// Frames two arrays as a new owned map.
    pub fn from_arrays(
        keys: &BinaryArray,
        values: &BinaryArray,
    ) -> Result<BinaryMap<'static>, Error> {
        crate::ensure!(
            keys.num_elements() == values.num_elements(),
            "map has {} keys but {} values",
            keys.num_elements(),
            values.num_elements()
        );
        let key_size = i32::try_from(keys.size_in_bytes()).map_err(|_| {
            Error::unsupported_operation(format!(
                "key array of {} bytes is too large",
                keys.size_in_bytes()
            ))
        })?;
        let mut writer =
            Writer::with_capacity(WORD_SIZE + keys.size_in_bytes() + values.size_in_bytes());
        writer.write_i32(key_size);
        writer.write_i32(0);
        keys.write_to(&mut writer);
        values.write_to(&mut writer);
        let size = writer.len();
        BinaryMap::bind(Cow::Owned(writer.into_bytes()), 0, size)
    }

    pub fn num_elements(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> BinaryArray<'_> {
        BinaryArray::from_parts(
            &self.buffer,
            self.base_offset + WORD_SIZE,
            self.key_size,
            self.keys,
        )
    }

    pub fn values(&self) -> BinaryArray<'_> {
        BinaryArray::from_parts(
            &self.buffer,
            self.base_offset + WORD_SIZE + self.key_size,
            self.size_in_bytes - WORD_SIZE - self.key_size,
            self.values,
        )
    }

    pub fn copy(&self) -> BinaryMap<'static> {
        BinaryMap {
            buffer: Cow::Owned(self.region().to_vec()),
            base_offset: 0,
            size_in_bytes: self.size_in_bytes,
            key_size: self.key_size,
            keys: self.keys,
            values: self.values,
        }
    }

    pub fn write_to(&self, writer: &mut Writer) {
        writer.write_bytes(self.region());
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.region()
    }

    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }

    fn region(&self) -> &[u8] {
        &self.buffer[self.base_offset..self.base_offset + self.size_in_bytes]
    }
}
