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

use crate::buffer::{Reader, Writer};
use crate::config::Config;
use crate::ensure;
use crate::error::{Error, ErrorKind};
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::type_resolver::{AnySerializer, TypeResolver};
use crate::serializer::sorted::Comparator;
use crate::serializer::synchronized::{AccessorLookup, Synchronized, SynchronizedSerializer};
use crate::serializer::Serializer;
use crate::types::config_flags::{IS_CROSS_LANGUAGE_FLAG, IS_LITTLE_ENDIAN_FLAG};
use crate::types::MAGIC_NUMBER;
use log::info;
use std::sync::Arc;

/// The serialization engine.
///
/// A `Knit` holds the configuration and the type registry. Register every user type
/// first; afterwards the instance is only read, so it can be shared across threads.
/// Each call to [`serialize`](Knit::serialize), [`deserialize`](Knit::deserialize) or
/// [`deep_copy`](Knit::deep_copy) runs its own session with fresh reference and
/// meta-string tables.
///
/// ```rust
/// use knit_core::knit::Knit;
/// use std::collections::HashMap;
///
/// # fn main() -> Result<(), knit_core::error::Error> {
/// let knit = Knit::default().track_ref(true).max_depth(32);
///
/// let mut scores = HashMap::new();
/// scores.insert("ada".to_string(), vec![3i32, 5, 8]);
/// let bytes = knit.serialize(&scores)?;
/// let decoded: HashMap<String, Vec<i32>> = knit.deserialize(&bytes)?;
/// assert_eq!(decoded, scores);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Knit {
    config: Config,
    type_resolver: TypeResolver,
}

impl Knit {
    /// Whether messages are flagged as cross-language in the header.
    pub fn xlang(mut self, xlang: bool) -> Self {
        self.config.xlang = xlang;
        self
    }

    /// Write strings as Latin-1 or UTF-8. With `false`, non Latin-1 strings are
    /// written as UTF-16.
    pub fn compress_string(mut self, compress_string: bool) -> Self {
        self.config.compress_string = compress_string;
        self
    }

    /// Track shared pointers by identity. Without it every occurrence is written by
    /// value and cyclic graphs are rejected.
    pub fn track_ref(mut self, track_ref: bool) -> Self {
        self.config.track_ref = track_ref;
        self
    }

    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn get_type_resolver(&self) -> &TypeResolver {
        &self.type_resolver
    }

    /// Registers `T` under the user type id `id`.
    pub fn register<T: Serializer>(&mut self, id: u32) -> Result<(), Error> {
        self.type_resolver.register_by_id::<T>(id)
    }

    /// Registers `T` by namespace and name, which travel as meta strings.
    pub fn register_by_name<T: Serializer>(
        &mut self,
        namespace: &str,
        type_name: &str,
    ) -> Result<(), Error> {
        self.type_resolver.register_by_name::<T>(namespace, type_name)
    }

    /// Registers `T` with a custom serializer used for polymorphic values.
    pub fn register_serializer<T: Serializer>(
        &mut self,
        id: u32,
        serializer: Arc<dyn AnySerializer>,
    ) -> Result<(), Error> {
        self.type_resolver.register_serializer_by_id::<T>(id, serializer)
    }

    pub fn register_serializer_by_name<T: Serializer>(
        &mut self,
        namespace: &str,
        type_name: &str,
        serializer: Arc<dyn AnySerializer>,
    ) -> Result<(), Error> {
        self.type_resolver
            .register_serializer_by_name::<T>(namespace, type_name, serializer)
    }

    /// Registers comparator type `C` under `id` and makes it usable by sorted
    /// containers of `T`.
    pub fn register_comparator<C, T>(&mut self, id: u32) -> Result<(), Error>
    where
        C: Comparator<T> + Serializer,
        T: 'static,
    {
        self.type_resolver.register_by_id::<C>(id)?;
        self.type_resolver.register_comparator_cast::<C, T>();
        Ok(())
    }

    pub fn register_comparator_by_name<C, T>(
        &mut self,
        namespace: &str,
        type_name: &str,
    ) -> Result<(), Error>
    where
        C: Comparator<T> + Serializer,
        T: 'static,
    {
        self.type_resolver.register_by_name::<C>(namespace, type_name)?;
        self.type_resolver.register_comparator_cast::<C, T>();
        Ok(())
    }

    /// Registers the adapter of a synchronized wrapper.
    ///
    /// Returns `Ok(false)` when `lookup` cannot provide the wrapper's internal
    /// accessor: the adapter is skipped, `W` stays unsupported and every other
    /// registration is unaffected.
    pub fn register_synchronized<W, L>(&mut self, lookup: &L) -> Result<bool, Error>
    where
        W: Synchronized + Serializer,
        L: AccessorLookup,
    {
        match lookup.find::<W>() {
            Ok(accessor) => {
                self.type_resolver.register_internal::<W>(
                    W::TYPE_ID,
                    Arc::new(SynchronizedSerializer::new(accessor)),
                    false,
                )?;
                self.type_resolver.register_accessor(accessor);
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::PlatformAccessFailure => {
                info!(
                    "skipping adapter for {}: {}",
                    std::any::type_name::<W>(),
                    err
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn write_head(&self, writer: &mut Writer) {
        writer.write_u16(MAGIC_NUMBER);
        let mut bitmap = IS_LITTLE_ENDIAN_FLAG;
        if self.config.xlang {
            bitmap |= IS_CROSS_LANGUAGE_FLAG;
        }
        writer.write_u8(bitmap);
    }

    fn read_head(&self, reader: &mut Reader) -> Result<(), Error> {
        let magic_number = reader.read_u16()?;
        ensure!(
            magic_number == MAGIC_NUMBER,
            "message must start with magic number {:#x}, found {:#x}",
            MAGIC_NUMBER,
            magic_number
        );
        let bitmap = reader.read_u8()?;
        ensure!(
            bitmap & IS_LITTLE_ENDIAN_FLAG != 0,
            Error::unsupported_operation("big endian producers are not supported")
        );
        let peer_is_xlang = bitmap & IS_CROSS_LANGUAGE_FLAG != 0;
        ensure!(
            peer_is_xlang == self.config.xlang,
            "header xlang bit is {}, expected {}",
            peer_is_xlang,
            self.config.xlang
        );
        Ok(())
    }

    /// Serializes `value` into a new byte vector.
    pub fn serialize<T: Serializer>(&self, value: &T) -> Result<Vec<u8>, Error> {
        let mut writer = Writer::default();
        self.serialize_to(value, &mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Appends the message for `value` to `writer` and returns its length. On error
    /// `writer` is left as it was.
    pub fn serialize_to<T: Serializer>(&self, value: &T, writer: &mut Writer) -> Result<usize, Error> {
        let start = writer.len();
        self.write_head(writer);
        let result = {
            let mut context = WriteContext::new(&self.type_resolver, &self.config, writer);
            let result = value.knit_write(&mut context, true, true);
            context.reset();
            result
        };
        if let Err(err) = result {
            writer.truncate(start);
            return Err(err);
        }
        Ok(writer.len() - start)
    }

    /// Reads one message. The whole slice must be consumed.
    pub fn deserialize<T: Serializer>(&self, bytes: &[u8]) -> Result<T, Error> {
        let mut reader = Reader::new(bytes);
        self.read_head(&mut reader)?;
        let mut context = ReadContext::new(&self.type_resolver, &self.config, reader);
        let value = T::knit_read(&mut context, true, true)?;
        let remaining = context.reader.remaining();
        ensure!(
            remaining == 0,
            "{} trailing bytes after the root value",
            remaining
        );
        context.reset();
        Ok(value)
    }

    /// Copies `value` structurally, preserving shared pointers and cycles.
    pub fn deep_copy<T: Serializer>(&self, value: &T) -> Result<T, Error> {
        let mut context = CopyContext::new(&self.type_resolver, &self.config);
        value.knit_copy(&mut context)
    }
}
