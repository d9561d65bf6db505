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

use crate::error::Error;

pub(crate) const WORD_SIZE: usize = 8;

/// Null bitmap width for `num_fields` fields, in whole 8-byte words.
#[inline(always)]
pub fn calculate_bitmap_width_in_bytes(num_fields: usize) -> usize {
    (num_fields / 64 + usize::from(num_fields % 64 != 0)) * WORD_SIZE
}

#[inline(always)]
pub(crate) fn round_to_word(size: usize) -> usize {
    (size + WORD_SIZE - 1) & !(WORD_SIZE - 1)
}

/// Null bitmap and slot positions inside a region, relative to the region base.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlotTable {
    bitmap_start: usize,
    slots_start: usize,
    fixed_end: usize,
    len: usize,
}

impl SlotTable {
    /// Lays out `len` slots after a `header`-byte prefix, failing when the fixed
    /// part does not fit in `region_size`.
    pub(crate) fn new(header: usize, len: usize, region_size: usize) -> Result<SlotTable, Error> {
        let slots_start = header + calculate_bitmap_width_in_bytes(len);
        let fixed_end = len
            .checked_mul(WORD_SIZE)
            .and_then(|slots| slots.checked_add(slots_start))
            .ok_or_else(|| Error::invalid_data(format!("{len} slots overflow the region")))?;
        crate::ensure!(
            fixed_end <= region_size,
            "{} slots need {} bytes but the region has {}",
            len,
            fixed_end,
            region_size
        );
        Ok(SlotTable {
            bitmap_start: header,
            slots_start,
            fixed_end,
            len,
        })
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    fn check_index(&self, idx: usize) -> Result<(), Error> {
        crate::ensure!(
            idx < self.len,
            Error::unsupported_operation(format!(
                "slot {idx} is out of range for {} slots",
                self.len
            ))
        );
        Ok(())
    }

    pub(crate) fn is_null(&self, region: &[u8], idx: usize) -> Result<bool, Error> {
        self.check_index(idx)?;
        Ok(region[self.bitmap_start + idx / 8] & (1 << (idx % 8)) != 0)
    }

    /// The 8 bytes of slot `idx`.
    pub(crate) fn fixed<'r>(&self, region: &'r [u8], idx: usize) -> Result<&'r [u8], Error> {
        self.check_index(idx)?;
        let start = self.slots_start + idx * WORD_SIZE;
        Ok(&region[start..start + WORD_SIZE])
    }

    /// `(offset, size)` of the variable-width value of slot `idx`, checked against
    /// the region.
    pub(crate) fn variable(&self, region: &[u8], idx: usize) -> Result<(usize, usize), Error> {
        crate::ensure!(
            !self.is_null(region, idx)?,
            "slot {} is null",
            idx
        );
        let slot = self.fixed(region, idx)?;
        let offset = u32::from_le_bytes([slot[0], slot[1], slot[2], slot[3]]) as usize;
        let size = u32::from_le_bytes([slot[4], slot[5], slot[6], slot[7]]) as usize;
        crate::ensure!(
            offset >= self.fixed_end && offset + size <= region.len(),
            "slot {} points at [{}, {}) outside the data of a {}-byte region",
            idx,
            offset,
            offset + size,
            region.len()
        );
        Ok((offset, size))
    }
}
