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

//! A byte buffer that remembers its byte order.
//!
//! Payload: `varuint32(len)`, the bytes, then one order byte (`1` for big endian).

use crate::error::Error;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::serializer::Serializer;
use crate::types;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
    order: Endian,
}

macro_rules! checked_get {
    ($name:ident, $ty:ty, $read:ident) => {
        pub fn $name(&self, offset: usize) -> Result<$ty, Error> {
            let size = std::mem::size_of::<$ty>();
            let slice = offset
                .checked_add(size)
                .and_then(|end| self.bytes.get(offset..end))
                .ok_or_else(|| Error::buffer_out_of_bound(offset, size, self.bytes.len()))?;
            Ok(match self.order {
                Endian::Little => LittleEndian::$read(slice),
                Endian::Big => BigEndian::$read(slice),
            })
        }
    };
}

impl ByteBuffer {
    pub fn new(bytes: Vec<u8>, order: Endian) -> ByteBuffer {
        ByteBuffer { bytes, order }
    }

    pub fn little_endian(bytes: Vec<u8>) -> ByteBuffer {
        ByteBuffer::new(bytes, Endian::Little)
    }

    pub fn big_endian(bytes: Vec<u8>) -> ByteBuffer {
        ByteBuffer::new(bytes, Endian::Big)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn order(&self) -> Endian {
        self.order
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    checked_get!(get_i16, i16, read_i16);
    checked_get!(get_i32, i32, read_i32);
    checked_get!(get_i64, i64, read_i64);
}

impl Serializer for ByteBuffer {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        let len = u32::try_from(self.bytes.len()).map_err(|_| {
            Error::unsupported_operation(format!(
                "byte buffer of {} bytes is too large",
                self.bytes.len()
            ))
        })?;
        context.writer.write_varuint32(len);
        context.writer.write_bytes(&self.bytes);
        context.writer.write_u8(match self.order {
            Endian::Little => 0,
            Endian::Big => 1,
        });
        Ok(())
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        let len = context.reader.read_varuint32()? as usize;
        let bytes = context.reader.read_bytes(len)?.to_vec();
        let order = match context.reader.read_u8()? {
            0 => Endian::Little,
            1 => Endian::Big,
            other => {
                return Err(Error::invalid_data(format!(
                    "unknown byte order marker {other}"
                )))
            }
        };
        Ok(ByteBuffer { bytes, order })
    }

    fn knit_copy(&self, _context: &mut CopyContext) -> Result<Self, Error> {
        Ok(self.clone())
    }

    builtin_type_info!(types::BINARY);
}
