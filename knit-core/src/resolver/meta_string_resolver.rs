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

//! Session-scoped deduplication of meta strings.
//!
//! The first occurrence of a meta string in a message is written in full:
//!
//! ```text
//! varuint32(len << 1) | len > 16 ? i64 hash : u8 encoding | bytes
//! ```
//!
//! and is assigned the next dynamic id. Later occurrences only write
//! `varuint32(((id + 1) << 1) | 1)`. The reader assigns ids in the same order, so the
//! tables line up without exchanging ids.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::buffer::{Reader, Writer};
use crate::ensure;
use crate::error::Error;
use crate::meta::{murmurhash3_x64_128, Encoding, MetaString, MetaStringDecoder};

const SMALL_STRING_THRESHOLD: usize = 16;
const HEADER_MASK: i64 = 0xff;
const HASH_SEED: u64 = 47;

/// Encoded bytes of a meta string plus the hash that identifies it on the wire.
/// The low byte of `hash_code` carries the encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetaStringBytes {
    pub bytes: Vec<u8>,
    pub hash_code: i64,
    pub encoding: Encoding,
    pub first8: u64,
    pub second8: u64,
}

fn compute_hash(bytes: &[u8], encoding: Encoding) -> i64 {
    let mut hash_code = (murmurhash3_x64_128(bytes, HASH_SEED).0 as i64).wrapping_abs();
    if hash_code == 0 {
        hash_code += 256;
    }
    hash_code = (hash_code as u64 & 0xffff_ffff_ffff_ff00) as i64;
    hash_code | (u8::from(encoding) as i64 & HEADER_MASK)
}

fn pack_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |v, (i, b)| v | ((*b as u64) << (8 * i)))
}

impl MetaStringBytes {
    pub fn new(bytes: Vec<u8>, hash_code: i64) -> Result<Self, Error> {
        let encoding = Encoding::from_byte((hash_code & HEADER_MASK) as u8)?;
        let first8 = pack_u64(&bytes);
        let second8 = if bytes.len() > 8 {
            pack_u64(&bytes[8..])
        } else {
            0
        };
        Ok(MetaStringBytes {
            bytes,
            hash_code,
            encoding,
            first8,
            second8,
        })
    }

    pub fn from_meta_string(meta_string: &MetaString) -> Result<Self, Error> {
        let hash_code = compute_hash(&meta_string.bytes, meta_string.encoding);
        Self::new(meta_string.bytes.clone(), hash_code)
    }

    pub fn decode(&self, decoder: &MetaStringDecoder) -> Result<MetaString, Error> {
        decoder.decode(&self.bytes, self.encoding)
    }
}

/// Write side. Encoded entries are cached for the resolver's lifetime; dynamic ids
/// are cleared by [`reset`](Self::reset) at the end of every message.
#[derive(Default)]
pub struct MetaStringWriterResolver {
    entries: Vec<MetaStringBytes>,
    index_by_string: HashMap<MetaString, usize>,
    dynamic_ids: Vec<Option<u32>>,
    dynamic_written: Vec<usize>,
}

impl MetaStringWriterResolver {
    /// Returns the resolver-lifetime id of a meta string, encoding it on first sight.
    pub fn get_or_create_id(&mut self, meta_string: &MetaString) -> Result<usize, Error> {
        if let Some(index) = self.index_by_string.get(meta_string) {
            return Ok(*index);
        }
        let index = self.entries.len();
        self.entries
            .push(MetaStringBytes::from_meta_string(meta_string)?);
        self.dynamic_ids.push(None);
        self.index_by_string.insert(meta_string.clone(), index);
        Ok(index)
    }

    pub fn get_bytes(&self, id: usize) -> Option<&MetaStringBytes> {
        self.entries.get(id)
    }

    pub fn write_meta_string_bytes(
        &mut self,
        writer: &mut Writer,
        meta_string: &MetaString,
    ) -> Result<(), Error> {
        let index = self.get_or_create_id(meta_string)?;
        if let Some(dynamic_id) = self.dynamic_ids[index] {
            writer.write_varuint32(((dynamic_id + 1) << 1) | 1);
            return Ok(());
        }
        let dynamic_id = self.dynamic_written.len() as u32;
        self.dynamic_ids[index] = Some(dynamic_id);
        self.dynamic_written.push(index);

        let entry = &self.entries[index];
        let len = entry.bytes.len();
        writer.write_varuint32((len as u32) << 1);
        if len > SMALL_STRING_THRESHOLD {
            writer.write_i64(entry.hash_code);
        } else {
            writer.write_u8(entry.encoding.into());
        }
        writer.write_bytes(&entry.bytes);
        Ok(())
    }

    pub fn reset(&mut self) {
        for index in self.dynamic_written.drain(..) {
            self.dynamic_ids[index] = None;
        }
    }
}

/// Read side: the mirror of [`MetaStringWriterResolver`].
#[derive(Default)]
pub struct MetaStringReaderResolver {
    entries: Vec<MetaStringBytes>,
    hash_to_index: HashMap<i64, usize>,
    small_to_index: HashMap<(u64, u64, u8, usize), usize>,
    decoded: HashMap<(usize, char, char), MetaString>,
    dynamic_read: Vec<usize>,
}

impl MetaStringReaderResolver {
    pub fn read_meta_string_bytes(&mut self, reader: &mut Reader) -> Result<&MetaStringBytes, Error> {
        let index = self.read_entry_index(reader)?;
        Ok(&self.entries[index])
    }

    pub fn read_meta_string(
        &mut self,
        reader: &mut Reader,
        decoder: &MetaStringDecoder,
    ) -> Result<MetaString, Error> {
        let index = self.read_entry_index(reader)?;
        let key = (index, decoder.special_char1, decoder.special_char2);
        if let Some(decoded) = self.decoded.get(&key) {
            return Ok(decoded.clone());
        }
        let decoded = self.entries[index].decode(decoder)?;
        self.decoded.insert(key, decoded.clone());
        Ok(decoded)
    }

    fn read_entry_index(&mut self, reader: &mut Reader) -> Result<usize, Error> {
        let header = reader.read_varuint32()?;
        let len = (header >> 1) as usize;
        if header & 0b1 != 0 {
            return len
                .checked_sub(1)
                .and_then(|id| self.dynamic_read.get(id).copied())
                .ok_or_else(|| {
                    Error::invalid_data(format!("meta string dynamic id {len} was never written"))
                });
        }
        let index = if len > SMALL_STRING_THRESHOLD {
            let hash_code = reader.read_i64()?;
            self.read_big_entry(reader, len, hash_code)?
        } else {
            self.read_small_entry(reader, len)?
        };
        self.dynamic_read.push(index);
        Ok(index)
    }

    fn read_big_entry(&mut self, reader: &mut Reader, len: usize, hash_code: i64) -> Result<usize, Error> {
        match self.hash_to_index.entry(hash_code) {
            Entry::Occupied(entry) => {
                reader.skip(len)?;
                Ok(*entry.get())
            }
            Entry::Vacant(entry) => {
                let bytes = reader.read_bytes(len)?.to_vec();
                let index = self.entries.len();
                self.entries.push(MetaStringBytes::new(bytes, hash_code)?);
                entry.insert(index);
                Ok(index)
            }
        }
    }

    fn read_small_entry(&mut self, reader: &mut Reader, len: usize) -> Result<usize, Error> {
        let encoding_byte = reader.read_u8()?;
        let encoding = Encoding::from_byte(encoding_byte)?;
        ensure!(
            len != 0 || encoding == Encoding::Utf8,
            Error::encoding_error(format!(
                "empty meta string must be utf8 encoded, got {encoding_byte}"
            ))
        );
        let bytes = reader.read_bytes(len)?;
        let first8 = pack_u64(bytes);
        let second8 = if len > 8 { pack_u64(&bytes[8..]) } else { 0 };
        match self.small_to_index.entry((first8, second8, encoding_byte, len)) {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let hash_code = compute_hash(bytes, encoding);
                let index = self.entries.len();
                self.entries
                    .push(MetaStringBytes::new(bytes.to_vec(), hash_code)?);
                entry.insert(index);
                Ok(index)
            }
        }
    }

    pub fn reset(&mut self) {
        self.dynamic_read.clear();
    }
}
