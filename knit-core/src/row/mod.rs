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

//! Zero-copy row format.
//!
//! Arrays and rows share one layout: a null bitmap padded to 8-byte words, one 8-byte
//! slot per field, then variable-width data. Fixed-width values live inline in their
//! slot; variable-width values store `(offset: u32, size: u32)` relative to the region
//! base. An array additionally starts with its `u64` element count. A map is a
//! key-array length, the key array, then the value array.
//!
//! Views are bound to a region of an existing buffer and read lazily; only
//! [`BinaryRow::copy`], [`BinaryArray::copy`] and [`BinaryMap::copy`] materialize bytes.

macro_rules! slot_getters {
    () => {
        pub fn is_null_at(&self, idx: usize) -> Result<bool, Error> {
            self.slots.is_null(self.region(), idx)
        }

        pub fn get_bool(&self, idx: usize) -> Result<bool, Error> {
            Ok(self.slots.fixed(self.region(), idx)?[0] != 0)
        }

        pub fn get_i8(&self, idx: usize) -> Result<i8, Error> {
            Ok(self.slots.fixed(self.region(), idx)?[0] as i8)
        }

        pub fn get_i16(&self, idx: usize) -> Result<i16, Error> {
            Ok(LittleEndian::read_i16(self.slots.fixed(self.region(), idx)?))
        }

        pub fn get_i32(&self, idx: usize) -> Result<i32, Error> {
            Ok(LittleEndian::read_i32(self.slots.fixed(self.region(), idx)?))
        }

        pub fn get_i64(&self, idx: usize) -> Result<i64, Error> {
            Ok(LittleEndian::read_i64(self.slots.fixed(self.region(), idx)?))
        }

        pub fn get_f32(&self, idx: usize) -> Result<f32, Error> {
            Ok(LittleEndian::read_f32(self.slots.fixed(self.region(), idx)?))
        }

        pub fn get_f64(&self, idx: usize) -> Result<f64, Error> {
            Ok(LittleEndian::read_f64(self.slots.fixed(self.region(), idx)?))
        }

        pub fn get_binary(&self, idx: usize) -> Result<&[u8], Error> {
            let (offset, size) = self.slots.variable(self.region(), idx)?;
            Ok(&self.region()[offset..offset + size])
        }

        pub fn get_str(&self, idx: usize) -> Result<&str, Error> {
            std::str::from_utf8(self.get_binary(idx)?)
                .map_err(|e| Error::encoding_error(format!("invalid utf8 in slot {idx}: {e}")))
        }

        pub fn get_array(&self, idx: usize) -> Result<BinaryArray<'_>, Error> {
            let (offset, size) = self.slots.variable(self.region(), idx)?;
            BinaryArray::point_to(self.region(), offset, size)
        }

        pub fn get_map(&self, idx: usize) -> Result<BinaryMap<'_>, Error> {
            let (offset, size) = self.slots.variable(self.region(), idx)?;
            BinaryMap::point_to(self.region(), offset, size)
        }

        pub fn get_row(&self, idx: usize, num_fields: usize) -> Result<BinaryRow<'_>, Error> {
            let (offset, size) = self.slots.variable(self.region(), idx)?;
            BinaryRow::point_to(self.region(), offset, size, num_fields)
        }

        /// Appends the bound bytes unchanged.
        pub fn write_to(&self, writer: &mut Writer) {
            writer.write_bytes(self.region());
        }

        /// The bound region.
        pub fn as_bytes(&self) -> &[u8] {
            self.region()
        }

        pub fn base_offset(&self) -> usize {
            self.base_offset
        }

        pub fn size_in_bytes(&self) -> usize {
            self.size_in_bytes
        }

        #[inline(always)]
        fn region(&self) -> &[u8] {
            &self.buffer[self.base_offset..self.base_offset + self.size_in_bytes]
        }
    };
}

mod array;
mod layout;
mod map;
#[allow(clippy::module_inception)]
mod row;
mod writer;

pub use array::BinaryArray;
pub use layout::calculate_bitmap_width_in_bytes;
pub use map::BinaryMap;
pub use row::BinaryRow;
pub use writer::{ArrayWriter, MapWriter, RowWriter, WriteCallbackInfo};
