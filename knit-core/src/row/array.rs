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

use super::layout::{SlotTable, WORD_SIZE};
use super::{BinaryMap, BinaryRow};
use crate::buffer::Writer;
use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian};
use std::borrow::Cow;

/// Checks that `[offset, offset + size)` lies inside a buffer of `len` bytes.
pub(crate) fn check_region(len: usize, offset: usize, size: usize) -> Result<(), Error> {
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(()),
        _ => Err(Error::buffer_out_of_bound(offset, size, len)),
    }
}

/// View of an array region: `[num_elements: u64][null bitmap][slots][data]`.
#[derive(Clone, Debug)]
pub struct BinaryArray<'a> {
    buffer: Cow<'a, [u8]>,
    base_offset: usize,
    size_in_bytes: usize,
    slots: SlotTable,
}

impl<'a> BinaryArray<'a> {
    /// Binds to `buffer[offset..offset + size]` without copying.
    pub fn point_to(buffer: &'a [u8], offset: usize, size: usize) -> Result<BinaryArray<'a>, Error> {
        Self::bind(Cow::Borrowed(buffer), offset, size)
    }

    pub(crate) fn bind(
        buffer: Cow<'a, [u8]>,
        offset: usize,
        size: usize,
    ) -> Result<BinaryArray<'a>, Error> {
        let slots = Self::layout(&buffer, offset, size)?;
        Ok(BinaryArray {
            buffer,
            base_offset: offset,
            size_in_bytes: size,
            slots,
        })
    }

    pub(crate) fn layout(buffer: &[u8], offset: usize, size: usize) -> Result<SlotTable, Error> {
        check_region(buffer.len(), offset, size)?;
        crate::ensure!(
            size >= WORD_SIZE,
            "array region of {} bytes has no element count",
            size
        );
        let num_elements = LittleEndian::read_u64(&buffer[offset..offset + WORD_SIZE]);
        let num_elements = usize::try_from(num_elements).map_err(|_| {
            Error::invalid_data(format!("array element count {num_elements} is too large"))
        })?;
        SlotTable::new(WORD_SIZE, num_elements, size)
    }

    /// A view sharing `buffer`, whose layout was already checked.
    pub(crate) fn from_parts(
        buffer: &'a [u8],
        offset: usize,
        size: usize,
        slots: SlotTable,
    ) -> BinaryArray<'a> {
        BinaryArray {
            buffer: Cow::Borrowed(buffer),
            base_offset: offset,
            size_in_bytes: size,
            slots,
        }
    }

    pub fn num_elements(&self) -> usize {
        self.slots.len()
    }

    /// Owned copy of the bound region, independent of the original buffer.
    pub fn copy(&self) -> BinaryArray<'static> {
        BinaryArray {
            buffer: Cow::Owned(self.region().to_vec()),
            base_offset: 0,
            size_in_bytes: self.size_in_bytes,
            slots: self.slots,
        }
    }

    pub fn to_i64_vec(&self) -> Result<Vec<i64>, Error> {
        (0..self.num_elements()).map(|i| self.get_i64(i)).collect()
    }

    pub fn to_string_vec(&self) -> Result<Vec<String>, Error> {
        (0..self.num_elements())
            .map(|i| self.get_str(i).map(str::to_owned))
            .collect()
    }

    slot_getters!();
}
