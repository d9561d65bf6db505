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

//! Type registry: maps Rust types to wire type ids and back, and owns the dynamic
//! serializer table used for polymorphic values.

use super::context::{CopyContext, ReadContext, WriteContext};
use crate::error::Error;
use crate::meta::{MetaString, NAMESPACE_ENCODER, TYPE_NAME_ENCODER};
use crate::serializer::sorted::Comparator;
use crate::serializer::synchronized::{InternalAccessor, Synchronized};
use crate::serializer::Serializer;
use crate::types::{self, is_named_type, user_type_id, MAX_INTERNAL_TYPE_ID};
use log::debug;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Object-safe form of [`Serializer`], dispatched by type id for values whose concrete
/// type is only known at runtime (`Box<dyn Any>` elements, comparators, adapters).
///
/// `write_data` writes everything that follows the type info. For shared pointers
/// that includes their ref flag, so identity survives a polymorphic round trip.
pub trait AnySerializer: Send + Sync {
    fn write_data(&self, value: &dyn Any, context: &mut WriteContext) -> Result<(), Error>;

    fn read_data(&self, context: &mut ReadContext) -> Result<Box<dyn Any>, Error>;

    fn copy(&self, value: &dyn Any, context: &mut CopyContext) -> Result<Box<dyn Any>, Error>;
}

/// Forwards to the static [`Serializer`] impl of `T`.
pub struct TypedSerializer<T>(PhantomData<fn() -> T>);

impl<T> Default for TypedSerializer<T> {
    fn default() -> Self {
        TypedSerializer(PhantomData)
    }
}

pub(crate) fn downcast_value<T: 'static>(value: &dyn Any) -> Result<&T, Error> {
    value.downcast_ref::<T>().ok_or_else(|| {
        Error::unsupported_type(format!(
            "serializer for {} got a value of another type",
            std::any::type_name::<T>()
        ))
    })
}

impl<T: Serializer> AnySerializer for TypedSerializer<T> {
    fn write_data(&self, value: &dyn Any, context: &mut WriteContext) -> Result<(), Error> {
        let value = downcast_value::<T>(value)?;
        if T::knit_is_shared_ref() {
            value.knit_write(context, true, false)
        } else {
            value.knit_write_data(context)
        }
    }

    fn read_data(&self, context: &mut ReadContext) -> Result<Box<dyn Any>, Error> {
        let value = if T::knit_is_shared_ref() {
            T::knit_read(context, true, false)?
        } else {
            T::knit_read_data(context)?
        };
        Ok(Box::new(value))
    }

    fn copy(&self, value: &dyn Any, context: &mut CopyContext) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new(downcast_value::<T>(value)?.knit_copy(context)?))
    }
}

/// Turns a polymorphically read comparator into a typed one.
pub type ComparatorCast<T> = fn(Box<dyn Any>) -> Option<Arc<dyn Comparator<T>>>;

fn cast_comparator<C: Comparator<T>, T: 'static>(
    value: Box<dyn Any>,
) -> Option<Arc<dyn Comparator<T>>> {
    value
        .downcast::<C>()
        .ok()
        .map(|c| Arc::new(*c) as Arc<dyn Comparator<T>>)
}

#[derive(Clone)]
pub struct TypeInfo {
    type_id: u32,
    rust_type_id: std::any::TypeId,
    rust_type_name: &'static str,
    namespace: MetaString,
    type_name: MetaString,
    register_by_name: bool,
    serializer: Arc<dyn AnySerializer>,
}

impl std::fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type_id", &self.type_id)
            .field("rust_type", &self.rust_type_name)
            .field("namespace", &self.namespace.original)
            .field("type_name", &self.type_name.original)
            .finish()
    }
}

impl TypeInfo {
    fn new<T: 'static>(
        type_id: u32,
        namespace: &str,
        type_name: &str,
        register_by_name: bool,
        serializer: Arc<dyn AnySerializer>,
    ) -> Result<TypeInfo, Error> {
        Ok(TypeInfo {
            type_id,
            rust_type_id: std::any::TypeId::of::<T>(),
            rust_type_name: std::any::type_name::<T>(),
            namespace: NAMESPACE_ENCODER.encode(namespace)?,
            type_name: TYPE_NAME_ENCODER.encode(type_name)?,
            register_by_name,
            serializer,
        })
    }

    #[inline(always)]
    pub fn get_type_id(&self) -> u32 {
        self.type_id
    }

    #[inline(always)]
    pub fn get_rust_type_id(&self) -> std::any::TypeId {
        self.rust_type_id
    }

    pub fn get_rust_type_name(&self) -> &'static str {
        self.rust_type_name
    }

    #[inline(always)]
    pub fn get_namespace(&self) -> &MetaString {
        &self.namespace
    }

    #[inline(always)]
    pub fn get_type_name(&self) -> &MetaString {
        &self.type_name
    }

    #[inline(always)]
    pub fn is_registered_by_name(&self) -> bool {
        self.register_by_name
    }

    #[inline(always)]
    pub fn get_serializer(&self) -> &Arc<dyn AnySerializer> {
        &self.serializer
    }
}

fn describe(info: &TypeInfo) -> String {
    if info.register_by_name {
        format!("{}.{}", info.namespace.original, info.type_name.original)
    } else {
        format!("type id {}", info.type_id)
    }
}

/// Registry of type descriptors.
///
/// Built-in types get fixed ids shared by every language. User types registered by id
/// are written as `(id << 8) | EXT`; types registered by name are written as
/// `NAMED_EXT` plus their namespace and type name. A later registration of the same
/// Rust type replaces the earlier one, ids and names included. An id or name held by
/// another Rust type cannot be claimed.
///
/// The resolver is populated before any session starts and only read afterwards, so
/// it is shared by reference across threads.
pub struct TypeResolver {
    type_info_map: HashMap<std::any::TypeId, Arc<TypeInfo>>,
    type_info_map_by_id: HashMap<u32, Arc<TypeInfo>>,
    type_info_map_by_name: HashMap<(String, String), Arc<TypeInfo>>,
    comparator_casts: HashMap<(std::any::TypeId, std::any::TypeId), Box<dyn Any + Send + Sync>>,
    accessors: HashMap<std::any::TypeId, Box<dyn Any + Send + Sync>>,
}

impl Default for TypeResolver {
    fn default() -> Self {
        let mut resolver = TypeResolver {
            type_info_map: HashMap::new(),
            type_info_map_by_id: HashMap::new(),
            type_info_map_by_name: HashMap::new(),
            comparator_casts: HashMap::new(),
            accessors: HashMap::new(),
        };
        resolver.register_builtin_types();
        resolver
    }
}

impl TypeResolver {
    pub fn get_type_info(&self, type_id: &std::any::TypeId) -> Result<&Arc<TypeInfo>, Error> {
        self.type_info_map.get(type_id).ok_or_else(|| {
            Error::unsupported_type(format!(
                "{type_id:?} is not registered, register it before serializing"
            ))
        })
    }

    #[inline(always)]
    pub fn get_type_info_by_id(&self, id: u32) -> Option<&Arc<TypeInfo>> {
        self.type_info_map_by_id.get(&id)
    }

    #[inline(always)]
    pub fn get_type_info_by_name(&self, namespace: &str, type_name: &str) -> Option<&Arc<TypeInfo>> {
        self.type_info_map_by_name
            .get(&(namespace.to_owned(), type_name.to_owned()))
    }

    /// Wire type id of a registered Rust type.
    #[inline(always)]
    pub fn get_type_id(&self, type_id: &std::any::TypeId) -> Result<u32, Error> {
        Ok(self.get_type_info(type_id)?.type_id)
    }

    pub fn is_registered<T: 'static>(&self) -> bool {
        self.type_info_map.contains_key(&std::any::TypeId::of::<T>())
    }

    pub fn get_comparator_cast<T: 'static>(
        &self,
        comparator_type: std::any::TypeId,
    ) -> Option<ComparatorCast<T>> {
        self.comparator_casts
            .get(&(comparator_type, std::any::TypeId::of::<T>()))
            .and_then(|cast| cast.downcast_ref::<ComparatorCast<T>>())
            .copied()
    }

    pub(crate) fn register_accessor<W: Synchronized>(&mut self, accessor: InternalAccessor<W>) {
        self.accessors
            .insert(std::any::TypeId::of::<W>(), Box::new(accessor));
    }

    /// Internal accessor of a wrapper whose adapter is registered.
    pub fn get_accessor<W: Synchronized>(&self) -> Result<InternalAccessor<W>, Error> {
        self.accessors
            .get(&std::any::TypeId::of::<W>())
            .and_then(|accessor| accessor.downcast_ref::<InternalAccessor<W>>())
            .copied()
            .ok_or_else(|| {
                Error::unsupported_type(format!(
                    "no adapter registered for {}",
                    std::any::type_name::<W>()
                ))
            })
    }

    /// Fails when another Rust type already holds the id or name `info` claims.
    fn check_available(&self, info: &TypeInfo, index_by_id: bool) -> Result<(), Error> {
        let holder = if info.register_by_name {
            self.type_info_map_by_name.get(&(
                info.namespace.original.clone(),
                info.type_name.original.clone(),
            ))
        } else if index_by_id {
            self.type_info_map_by_id.get(&info.type_id)
        } else {
            None
        };
        match holder {
            Some(holder) if holder.rust_type_id != info.rust_type_id => {
                Err(Error::unsupported_operation(format!(
                    "cannot register {}: {} is already registered as {}",
                    info.rust_type_name,
                    holder.rust_type_name,
                    describe(info)
                )))
            }
            _ => Ok(()),
        }
    }

    fn insert(&mut self, info: TypeInfo, index_by_id: bool) -> Arc<TypeInfo> {
        let info = Arc::new(info);
        if let Some(previous) = self.type_info_map.insert(info.rust_type_id, info.clone()) {
            debug!(
                "re-registered {} (type id {} -> {})",
                info.rust_type_name, previous.type_id, info.type_id
            );
            self.unlink(&previous);
        }
        if info.register_by_name {
            let key = (
                info.namespace.original.clone(),
                info.type_name.original.clone(),
            );
            self.type_info_map_by_name.insert(key, info.clone());
        } else if index_by_id {
            self.type_info_map_by_id.insert(info.type_id, info.clone());
        }
        info
    }

    /// Drops the id and name entries still pointing at a replaced registration.
    fn unlink(&mut self, previous: &TypeInfo) {
        let rust_type_id = previous.rust_type_id;
        if previous.register_by_name {
            let key = (
                previous.namespace.original.clone(),
                previous.type_name.original.clone(),
            );
            if self
                .type_info_map_by_name
                .get(&key)
                .is_some_and(|info| info.rust_type_id == rust_type_id)
            {
                self.type_info_map_by_name.remove(&key);
            }
        } else if self
            .type_info_map_by_id
            .get(&previous.type_id)
            .is_some_and(|info| info.rust_type_id == rust_type_id)
        {
            self.type_info_map_by_id.remove(&previous.type_id);
        }
    }

    /// Registers `T` under a built-in type id. With `index_by_id` the id resolves to
    /// `T` when a polymorphic value is read.
    pub(crate) fn register_internal<T: Serializer>(
        &mut self,
        type_id: u32,
        serializer: Arc<dyn AnySerializer>,
        index_by_id: bool,
    ) -> Result<(), Error> {
        crate::ensure!(
            type_id <= MAX_INTERNAL_TYPE_ID,
            Error::unsupported_type(format!("{type_id} is not a built-in type id"))
        );
        let info = TypeInfo::new::<T>(type_id, "", "", false, serializer)?;
        self.check_available(&info, index_by_id)?;
        self.insert(info, index_by_id);
        Ok(())
    }

    pub fn register_serializer_by_id<T: Serializer>(
        &mut self,
        id: u32,
        serializer: Arc<dyn AnySerializer>,
    ) -> Result<(), Error> {
        crate::ensure!(
            id <= u32::MAX >> 8,
            Error::unsupported_type(format!("user type id {id} is too large"))
        );
        let info = TypeInfo::new::<T>(user_type_id(id), "", "", false, serializer)?;
        self.check_available(&info, true)?;
        let info = self.insert(info, true);
        debug!("registered {} with type id {}", info.rust_type_name, info.type_id);
        Ok(())
    }

    pub fn register_serializer_by_name<T: Serializer>(
        &mut self,
        namespace: &str,
        type_name: &str,
        serializer: Arc<dyn AnySerializer>,
    ) -> Result<(), Error> {
        crate::ensure!(
            !type_name.is_empty(),
            Error::unsupported_type("type name must not be empty")
        );
        let info = TypeInfo::new::<T>(types::NAMED_EXT, namespace, type_name, true, serializer)?;
        self.check_available(&info, false)?;
        let info = self.insert(info, false);
        debug!(
            "registered {} as {}.{}",
            info.rust_type_name, namespace, type_name
        );
        Ok(())
    }

    pub fn register_by_id<T: Serializer>(&mut self, id: u32) -> Result<(), Error> {
        self.register_serializer_by_id::<T>(id, Arc::new(TypedSerializer::<T>::default()))
    }

    pub fn register_by_name<T: Serializer>(
        &mut self,
        namespace: &str,
        type_name: &str,
    ) -> Result<(), Error> {
        self.register_serializer_by_name::<T>(
            namespace,
            type_name,
            Arc::new(TypedSerializer::<T>::default()),
        )
    }

    /// Makes comparator type `C` usable by sorted containers of `T`.
    pub fn register_comparator_cast<C: Comparator<T>, T: 'static>(&mut self) {
        let cast: ComparatorCast<T> = cast_comparator::<C, T>;
        self.comparator_casts.insert(
            (std::any::TypeId::of::<C>(), std::any::TypeId::of::<T>()),
            Box::new(cast),
        );
        debug!(
            "registered comparator {} for {}",
            std::any::type_name::<C>(),
            std::any::type_name::<T>()
        );
    }

    fn register_builtin<T: Serializer>(&mut self, type_id: u32) {
        let info = TypeInfo {
            type_id,
            rust_type_id: std::any::TypeId::of::<T>(),
            rust_type_name: std::any::type_name::<T>(),
            namespace: MetaString::default(),
            type_name: MetaString::default(),
            register_by_name: false,
            serializer: Arc::new(TypedSerializer::<T>::default()),
        };
        self.insert(info, true);
    }

    fn register_builtin_types(&mut self) {
        use crate::serializer::byte_buffer::ByteBuffer;
        use chrono::{NaiveDate, NaiveDateTime};

        self.register_builtin::<bool>(types::BOOL);
        self.register_builtin::<i8>(types::INT8);
        self.register_builtin::<i16>(types::INT16);
        self.register_builtin::<i32>(types::VAR_INT32);
        self.register_builtin::<i64>(types::VAR_INT64);
        self.register_builtin::<f32>(types::FLOAT32);
        self.register_builtin::<f64>(types::FLOAT64);
        self.register_builtin::<u8>(types::U8);
        self.register_builtin::<u16>(types::U16);
        self.register_builtin::<u32>(types::U32);
        self.register_builtin::<u64>(types::U64);
        self.register_builtin::<String>(types::STRING);
        self.register_builtin::<NaiveDateTime>(types::TIMESTAMP);
        self.register_builtin::<NaiveDate>(types::LOCAL_DATE);
        self.register_builtin::<ByteBuffer>(types::BINARY);
        self.register_builtin::<Vec<Box<dyn Any>>>(types::LIST);
        self.register_builtin::<HashMap<String, Box<dyn Any>>>(types::MAP);
    }

    /// Whether a name read off the wire designates `local`.
    pub(crate) fn names_match(local: &TypeInfo, namespace: &MetaString, type_name: &MetaString) -> bool {
        is_named_type(local.type_id)
            && local.namespace.original == namespace.original
            && local.type_name.original == type_name.original
    }
}
