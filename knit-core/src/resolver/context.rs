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
use crate::error::Error;
use crate::meta::{MetaString, NAMESPACE_DECODER, TYPE_NAME_DECODER};
use crate::resolver::meta_string_resolver::{MetaStringReaderResolver, MetaStringWriterResolver};
use crate::resolver::ref_resolver::{RefReader, RefWriter};
use crate::resolver::type_resolver::{TypeInfo, TypeResolver};
use crate::types::is_named_type;
use log::trace;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

fn depth_error(max_depth: u32) -> Error {
    Error::depth_exceed(format!(
        "maximum nesting depth {max_depth} exceeded, the graph is too deep or cyclic \
         while reference tracking is off"
    ))
}

/// State of one write pass. Reference ids and meta-string ids live here, so a
/// context must not be shared between passes.
pub struct WriteContext<'a> {
    pub writer: &'a mut Writer,
    type_resolver: &'a TypeResolver,
    config: &'a Config,
    pub ref_writer: RefWriter,
    meta_string_resolver: MetaStringWriterResolver,
    untracked_path: Vec<usize>,
    depth: u32,
}

impl<'a> WriteContext<'a> {
    pub fn new(
        type_resolver: &'a TypeResolver,
        config: &'a Config,
        writer: &'a mut Writer,
    ) -> WriteContext<'a> {
        WriteContext {
            writer,
            type_resolver,
            config,
            ref_writer: RefWriter::new(),
            meta_string_resolver: MetaStringWriterResolver::default(),
            untracked_path: Vec::new(),
            depth: 0,
        }
    }

    #[inline(always)]
    pub fn get_type_resolver(&self) -> &'a TypeResolver {
        self.type_resolver
    }

    #[inline(always)]
    pub fn get_config(&self) -> &'a Config {
        self.config
    }

    #[inline(always)]
    pub fn is_track_ref(&self) -> bool {
        self.config.track_ref
    }

    #[inline(always)]
    pub fn is_compress_string(&self) -> bool {
        self.config.compress_string
    }

    pub fn write_meta_string(&mut self, meta_string: &MetaString) -> Result<(), Error> {
        self.meta_string_resolver
            .write_meta_string_bytes(self.writer, meta_string)
    }

    /// Writes the type info registered for `rust_type_id` and returns it.
    pub fn write_any_type_info(
        &mut self,
        rust_type_id: std::any::TypeId,
    ) -> Result<&'a Arc<TypeInfo>, Error> {
        let type_info = self.type_resolver.get_type_info(&rust_type_id)?;
        self.writer.write_varuint32(type_info.get_type_id());
        if type_info.is_registered_by_name() {
            self.write_meta_string(type_info.get_namespace())?;
            self.write_meta_string(type_info.get_type_name())?;
        }
        Ok(type_info)
    }

    #[inline(always)]
    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(depth_error(self.config.max_depth));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Marks a shared pointer as being written by value. Reaching it again before
    /// [`leave_untracked`](Self::leave_untracked) means the graph is cyclic.
    pub fn enter_untracked(&mut self, addr: usize) -> Result<(), Error> {
        if self.untracked_path.contains(&addr) {
            return Err(depth_error(self.config.max_depth));
        }
        self.untracked_path.push(addr);
        Ok(())
    }

    pub fn leave_untracked(&mut self) {
        self.untracked_path.pop();
    }

    pub fn reset(&mut self) {
        self.ref_writer.reset();
        self.meta_string_resolver.reset();
        self.untracked_path.clear();
        self.depth = 0;
        trace!("write context reset");
    }
}

/// State of one read pass over a borrowed byte slice.
pub struct ReadContext<'a> {
    pub reader: Reader<'a>,
    type_resolver: &'a TypeResolver,
    config: &'a Config,
    pub ref_reader: RefReader,
    meta_string_resolver: MetaStringReaderResolver,
    depth: u32,
}

impl<'a> ReadContext<'a> {
    pub fn new(
        type_resolver: &'a TypeResolver,
        config: &'a Config,
        reader: Reader<'a>,
    ) -> ReadContext<'a> {
        ReadContext {
            reader,
            type_resolver,
            config,
            ref_reader: RefReader::new(),
            meta_string_resolver: MetaStringReaderResolver::default(),
            depth: 0,
        }
    }

    #[inline(always)]
    pub fn get_type_resolver(&self) -> &'a TypeResolver {
        self.type_resolver
    }

    #[inline(always)]
    pub fn get_config(&self) -> &'a Config {
        self.config
    }

    fn read_names(&mut self) -> Result<(MetaString, MetaString), Error> {
        let namespace = self
            .meta_string_resolver
            .read_meta_string(&mut self.reader, &NAMESPACE_DECODER)?;
        let type_name = self
            .meta_string_resolver
            .read_meta_string(&mut self.reader, &TYPE_NAME_DECODER)?;
        Ok((namespace, type_name))
    }

    /// Reads type info written by [`WriteContext::write_any_type_info`] and resolves
    /// it to a registered type.
    pub fn read_any_type_info(&mut self) -> Result<&'a Arc<TypeInfo>, Error> {
        let type_id = self.reader.read_varuint32()?;
        if is_named_type(type_id) {
            let (namespace, type_name) = self.read_names()?;
            self.type_resolver
                .get_type_info_by_name(&namespace.original, &type_name.original)
                .ok_or_else(|| {
                    Error::unsupported_type(format!(
                        "no type registered as {}.{}",
                        namespace.original, type_name.original
                    ))
                })
        } else {
            self.type_resolver
                .get_type_info_by_id(type_id)
                .ok_or_else(|| Error::unsupported_type(format!("unknown type id {type_id}")))
        }
    }

    /// Reads type info and checks it designates the registered type `rust_type_id`.
    pub fn read_type_info_of(&mut self, rust_type_id: std::any::TypeId) -> Result<(), Error> {
        let local = self.type_resolver.get_type_info(&rust_type_id)?;
        let remote_id = self.reader.read_varuint32()?;
        ensure!(
            remote_id == local.get_type_id(),
            Error::type_mismatch(local.get_type_id(), remote_id)
        );
        if is_named_type(remote_id) {
            let (namespace, type_name) = self.read_names()?;
            ensure!(
                TypeResolver::names_match(local, &namespace, &type_name),
                Error::unsupported_type(format!(
                    "expected {}.{}, found {}.{}",
                    local.get_namespace().original,
                    local.get_type_name().original,
                    namespace.original,
                    type_name.original
                ))
            );
        }
        Ok(())
    }

    /// Reads a built-in type id and checks it.
    #[inline(always)]
    pub fn check_type_id(&mut self, expected: u32) -> Result<(), Error> {
        let remote = self.reader.read_varuint32()?;
        ensure!(remote == expected, Error::type_mismatch(expected, remote));
        Ok(())
    }

    #[inline(always)]
    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(depth_error(self.config.max_depth));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.ref_reader.reset();
        self.meta_string_resolver.reset();
        self.depth = 0;
        trace!("read context reset");
    }
}

/// State of one deep copy. Shared pointers are memoized by the address of their
/// pointee so that sharing and cycles are reproduced in the copy.
pub struct CopyContext<'a> {
    type_resolver: &'a TypeResolver,
    config: &'a Config,
    copied: HashMap<usize, Box<dyn Any>>,
    depth: u32,
}

impl<'a> CopyContext<'a> {
    pub fn new(type_resolver: &'a TypeResolver, config: &'a Config) -> CopyContext<'a> {
        CopyContext {
            type_resolver,
            config,
            copied: HashMap::new(),
            depth: 0,
        }
    }

    #[inline(always)]
    pub fn get_type_resolver(&self) -> &'a TypeResolver {
        self.type_resolver
    }

    pub fn get_copied<P: Any + Clone>(&self, addr: usize) -> Option<P> {
        self.copied
            .get(&addr)
            .and_then(|copied| copied.downcast_ref::<P>())
            .cloned()
    }

    pub fn store_copied(&mut self, addr: usize, copied: Box<dyn Any>) {
        self.copied.insert(addr, copied);
    }

    #[inline(always)]
    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(depth_error(self.config.max_depth));
        }
        Ok(())
    }

    #[inline(always)]
    pub fn dec_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
