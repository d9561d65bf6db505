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
use crate::meta::is_latin;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::serializer::Serializer;
use crate::types;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StrEncoding {
    Latin1 = 0,
    Utf16 = 1,
    Utf8 = 2,
}

impl StrEncoding {
    fn from_bits(bits: u64) -> Result<StrEncoding, Error> {
        match bits {
            0 => Ok(StrEncoding::Latin1),
            1 => Ok(StrEncoding::Utf16),
            2 => Ok(StrEncoding::Utf8),
            other => Err(Error::encoding_error(format!(
                "unknown string encoding {other}"
            ))),
        }
    }
}

/// Payload: `varuint36_small(byte_len << 2 | encoding)` then the bytes. Latin-1 is used
/// whenever every char fits in a byte.
impl Serializer for String {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        if is_latin(self) {
            let len = self.chars().count() as u64;
            context
                .writer
                .write_varuint36_small(len << 2 | StrEncoding::Latin1 as u64)?;
            context.writer.write_latin1_string(self);
        } else if context.is_compress_string() {
            let len = self.len() as u64;
            context
                .writer
                .write_varuint36_small(len << 2 | StrEncoding::Utf8 as u64)?;
            context.writer.write_utf8_string(self);
        } else {
            let utf16: Vec<u16> = self.encode_utf16().collect();
            let len = utf16.len() as u64 * 2;
            context
                .writer
                .write_varuint36_small(len << 2 | StrEncoding::Utf16 as u64)?;
            context.writer.write_utf16_bytes(&utf16);
        }
        Ok(())
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        let header = context.reader.read_varuint36_small()?;
        let len = (header >> 2) as usize;
        match StrEncoding::from_bits(header & 0b11)? {
            StrEncoding::Latin1 => context.reader.read_latin1_string(len),
            StrEncoding::Utf16 => context.reader.read_utf16_string(len),
            StrEncoding::Utf8 => context.reader.read_utf8_string(len),
        }
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(self.clone())
    }

    builtin_type_info!(types::STRING);
}
