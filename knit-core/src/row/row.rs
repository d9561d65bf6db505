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
use super::layout::SlotTable;
use super::{BinaryArray, BinaryMap};
use crate::buffer::Writer;
use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian};
use std::borrow::Cow;

/// View of a row region: `[null bitmap][slots][data]`. The field count is not
/// stored and must be supplied by the reader.
#[derive(Clone, Debug)]
pub struct BinaryRow<'a> {
    buffer: Cow<'a, [u8]>,
    base_offset: usize,
    size_in_bytes: usize,
    slots: SlotTable,
}

impl<'a> BinaryRow<'a> {
    pub fn point_to(
        buffer: &'a [u8],
        offset: usize,
        size: usize,
        num_fields: usize,
    ) -> Result<BinaryRow<'a>, Error> {
        check_region(buffer.len(), offset, size)?;
        Ok(BinaryRow {
            buffer: Cow::Borrowed(buffer),
            base_offset: offset,
            size_in_bytes: size,
            slots: SlotTable::new(0, num_fields, size)?,
        })
    }

    /// Binds to a whole buffer holding a single row.
    pub fn from_bytes(buffer: &'a [u8], num_fields: usize) -> Result<BinaryRow<'a>, Error> {
        Self::point_to(buffer, 0, buffer.len(), num_fields)
    }

    pub fn num_fields(&self) -> usize {
        self.slots.len()
    }

    pub fn copy(&self) -> BinaryRow<'static> {
        BinaryRow {
            buffer: Cow::Owned(self.region().to_vec()),
            base_offset: 0,
            size_in_bytes: self.size_in_bytes,
            slots: self.slots,
        }
    }

    slot_getters!();
}
