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

use super::layout::{calculate_bitmap_width_in_bytes, round_to_word, WORD_SIZE};
use crate::buffer::Writer;
use crate::error::Error;

/// Returned by `write_start`, consumed by the matching `write_end`.
pub struct WriteCallbackInfo {
    slot_offset: usize,
    data_start: usize,
}

struct FieldWriterHelper<'a> {
    writer: &'a mut Writer,
    base_offset: usize,
    bitmap_offset: usize,
    slots_offset: usize,
    num_fields: usize,
}

impl<'a> FieldWriterHelper<'a> {
    /// Appends a zeroed bitmap and slot table for `num_fields` fields after a
    /// `header`-byte prefix already written at `base_offset`.
    fn new(
        writer: &'a mut Writer,
        base_offset: usize,
        header: usize,
        num_fields: usize,
    ) -> FieldWriterHelper<'a> {
        let bitmap_offset = base_offset + header;
        let bitmap_width = calculate_bitmap_width_in_bytes(num_fields);
        let fixed_size = bitmap_width + num_fields * WORD_SIZE;
        writer.reserve(fixed_size);
        writer.skip(fixed_size);
        FieldWriterHelper {
            writer,
            base_offset,
            bitmap_offset,
            slots_offset: bitmap_offset + bitmap_width,
            num_fields,
        }
    }

    fn slot_offset(&self, idx: usize) -> Result<usize, Error> {
        crate::ensure!(
            idx < self.num_fields,
            Error::unsupported_operation(format!(
                "slot {idx} is out of range for {} slots",
                self.num_fields
            ))
        );
        Ok(self.slots_offset + idx * WORD_SIZE)
    }

    fn set_null_at(&mut self, idx: usize) -> Result<(), Error> {
        self.slot_offset(idx)?;
        self.writer.bf[self.bitmap_offset + idx / 8] |= 1 << (idx % 8);
        Ok(())
    }

    fn write_start(&mut self, idx: usize) -> Result<WriteCallbackInfo, Error> {
        let slot_offset = self.slot_offset(idx)?;
        let data_start = self.writer.len();
        self.writer
            .put_u32_at(slot_offset, to_u32(data_start - self.base_offset)?)?;
        Ok(WriteCallbackInfo {
            slot_offset,
            data_start,
        })
    }

    fn write_end(&mut self, callback_info: WriteCallbackInfo) -> Result<(), Error> {
        let size = self.writer.len() - callback_info.data_start;
        self.writer
            .put_u32_at(callback_info.slot_offset + 4, to_u32(size)?)?;
        self.writer.skip(round_to_word(size) - size);
        Ok(())
    }

    fn size_in_bytes(&self) -> usize {
        self.writer.len() - self.base_offset
    }
}

fn to_u32(value: usize) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| {
        Error::unsupported_operation(format!("{value} does not fit a 32-bit row offset"))
    })
}

macro_rules! field_writer_methods {
    ($($write:ident: $ty:ty => $put:ident),* $(,)?) => {
        pub fn get_writer(&mut self) -> &mut Writer {
            self.helper.writer
        }

        pub fn set_null_at(&mut self, idx: usize) -> Result<(), Error> {
            self.helper.set_null_at(idx)
        }

        /// Points slot `idx` at the current end of the buffer. Nested values are then
        /// written through [`get_writer`](Self::get_writer) and closed by `write_end`.
        pub fn write_start(&mut self, idx: usize) -> Result<WriteCallbackInfo, Error> {
            self.helper.write_start(idx)
        }

        /// Records the size of the value started by `write_start` and pads the
        /// buffer to the next word.
        pub fn write_end(&mut self, callback_info: WriteCallbackInfo) -> Result<(), Error> {
            self.helper.write_end(callback_info)
        }

        pub fn write_binary(&mut self, idx: usize, value: &[u8]) -> Result<(), Error> {
            let info = self.helper.write_start(idx)?;
            self.helper.writer.write_bytes(value);
            self.helper.write_end(info)
        }

        pub fn write_str(&mut self, idx: usize, value: &str) -> Result<(), Error> {
            self.write_binary(idx, value.as_bytes())
        }

        pub fn write_bool(&mut self, idx: usize, value: bool) -> Result<(), Error> {
            let slot = self.helper.slot_offset(idx)?;
            self.helper.writer.put_u8_at(slot, value as u8)
        }

        pub fn write_i8(&mut self, idx: usize, value: i8) -> Result<(), Error> {
            let slot = self.helper.slot_offset(idx)?;
            self.helper.writer.put_u8_at(slot, value as u8)
        }

        $(
            pub fn $write(&mut self, idx: usize, value: $ty) -> Result<(), Error> {
                let slot = self.helper.slot_offset(idx)?;
                self.helper.writer.$put(slot, value)
            }
        )*

        /// Bytes written since this writer was created.
        pub fn size_in_bytes(&self) -> usize {
            self.helper.size_in_bytes()
        }
    };
}

/// Writes a row of `num_fields` fields.
pub struct RowWriter<'a> {
    helper: FieldWriterHelper<'a>,
}

impl<'a> RowWriter<'a> {
    pub fn new(num_fields: usize, writer: &'a mut Writer) -> RowWriter<'a> {
        let base_offset = writer.len();
        RowWriter {
            helper: FieldWriterHelper::new(writer, base_offset, 0, num_fields),
        }
    }

    field_writer_methods!(
        write_i16: i16 => put_i16_at,
        write_i32: i32 => put_i32_at,
        write_i64: i64 => put_i64_at,
        write_f32: f32 => put_f32_at,
        write_f64: f64 => put_f64_at,
    );
}

/// Writes an array of `num_elements` elements.
pub struct ArrayWriter<'a> {
    helper: FieldWriterHelper<'a>,
}

impl<'a> ArrayWriter<'a> {
    pub fn new(num_elements: usize, writer: &'a mut Writer) -> ArrayWriter<'a> {
        let base_offset = writer.len();
        writer.write_u64(num_elements as u64);
        ArrayWriter {
            helper: FieldWriterHelper::new(writer, base_offset, WORD_SIZE, num_elements),
        }
    }

    field_writer_methods!(
        write_i16: i16 => put_i16_at,
        write_i32: i32 => put_i32_at,
        write_i64: i64 => put_i64_at,
        write_f32: f32 => put_f32_at,
        write_f64: f64 => put_f64_at,
    );
}

/// Writes a map: an 8-byte key-array length, then the key array and the value array,
/// both written through [`get_writer`](MapWriter::get_writer).
pub struct MapWriter<'a> {
    base_offset: usize,
    writer: &'a mut Writer,
}

impl<'a> MapWriter<'a> {
    pub fn new(writer: &'a mut Writer) -> MapWriter<'a> {
        let base_offset = writer.len();
        writer.reserve(WORD_SIZE);
        writer.skip(WORD_SIZE);
        MapWriter {
            base_offset,
            writer,
        }
    }

    pub fn get_writer(&mut self) -> &mut Writer {
        self.writer
    }

    /// Call before writing the key array; pass the result to `write_end`.
    pub fn write_start(&mut self) -> usize {
        self.writer.len()
    }

    /// Records the key array length. The value array follows directly.
    pub fn write_end(&mut self, keys_start: usize) -> Result<(), Error> {
        let size = self.writer.len() - keys_start;
        let size = i32::try_from(size).map_err(|_| {
            Error::unsupported_operation(format!("key array of {size} bytes is too large"))
        })?;
        self.writer.put_i32_at(self.base_offset, size)
    }

    pub fn size_in_bytes(&self) -> usize {
        self.writer.len() - self.base_offset
    }
}
