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

//! Synchronized container wrappers and their adapter serializer.
//!
//! A wrapper owns an `Arc<Mutex<C>>`. Its serializer reaches that handle through an
//! [`InternalAccessor`] obtained from an [`AccessorLookup`] when the adapter is
//! registered. On the wire a wrapper is its container: the `LIST` or `MAP` id and the
//! plain payload, written while the wrapper's own lock is held so a concurrent
//! mutation is either fully in the snapshot or not at all. The handle is tracked like
//! any shared pointer, so wrappers sharing one handle still share it after a round
//! trip, and a reader of the plain container type can decode the bytes.

use crate::error::Error;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::type_resolver::{downcast_value, AnySerializer};
use crate::serializer::collection::{write_collection_data_untyped, write_map_data_untyped};
use crate::serializer::mutex::lock;
use crate::serializer::Serializer;
use crate::types;
use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// A container wrapper whose state lives behind a shared mutex.
pub trait Synchronized: Sized + 'static {
    type Inner: Serializer + Default;

    /// Wire type id of the wrapped container category.
    const TYPE_ID: u32;

    fn from_shared(shared: Arc<Mutex<Self::Inner>>) -> Self;

    fn shared(&self) -> &Arc<Mutex<Self::Inner>>;

    /// Writes the container so that every element or value carries its own type info.
    /// Used when the wrapper is held as a `Box<dyn Any>`.
    fn write_untyped(inner: &Self::Inner, context: &mut WriteContext) -> Result<(), Error>;
}

/// Capability to reach into a wrapper and to rebuild one around a handle.
pub struct InternalAccessor<W: Synchronized> {
    shared: fn(&W) -> &Arc<Mutex<W::Inner>>,
    factory: fn(Arc<Mutex<W::Inner>>) -> W,
}

impl<W: Synchronized> Clone for InternalAccessor<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: Synchronized> Copy for InternalAccessor<W> {}

impl<W: Synchronized> InternalAccessor<W> {
    pub fn new(
        shared: fn(&W) -> &Arc<Mutex<W::Inner>>,
        factory: fn(Arc<Mutex<W::Inner>>) -> W,
    ) -> Self {
        InternalAccessor { shared, factory }
    }

    pub fn shared<'w>(&self, wrapper: &'w W) -> &'w Arc<Mutex<W::Inner>> {
        (self.shared)(wrapper)
    }

    pub fn wrap(&self, shared: Arc<Mutex<W::Inner>>) -> W {
        (self.factory)(shared)
    }
}

/// Finds the internal accessor of a wrapper type. Failing with
/// `Error::platform_access` makes the engine skip the adapter.
pub trait AccessorLookup {
    fn find<W: Synchronized>(&self) -> Result<InternalAccessor<W>, Error>;
}

/// Uses the accessors declared by the [`Synchronized`] impl.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredAccessors;

impl AccessorLookup for DeclaredAccessors {
    fn find<W: Synchronized>(&self) -> Result<InternalAccessor<W>, Error> {
        Ok(InternalAccessor::new(W::shared, W::from_shared))
    }
}

/// Serializer of a wrapper held as a `Box<dyn Any>`. The id it is written under
/// resolves to the plain container on read, so the wrapper is written as a snapshot
/// without its handle identity.
pub struct SynchronizedSerializer<W: Synchronized> {
    accessor: InternalAccessor<W>,
}

impl<W: Synchronized> SynchronizedSerializer<W> {
    pub fn new(accessor: InternalAccessor<W>) -> Self {
        SynchronizedSerializer { accessor }
    }
}

impl<W: Synchronized> AnySerializer for SynchronizedSerializer<W> {
    fn write_data(&self, value: &dyn Any, context: &mut WriteContext) -> Result<(), Error> {
        let wrapper = downcast_value::<W>(value)?;
        let guard = lock(&**self.accessor.shared(wrapper))?;
        W::write_untyped(&guard, context)
    }

    fn read_data(&self, context: &mut ReadContext) -> Result<Box<dyn Any>, Error> {
        let inner = <W::Inner as Serializer>::knit_read_data(context)?;
        Ok(Box::new(self.accessor.wrap(Arc::new(Mutex::new(inner)))))
    }

    fn copy(&self, value: &dyn Any, context: &mut CopyContext) -> Result<Box<dyn Any>, Error> {
        let wrapper = downcast_value::<W>(value)?;
        let shared = self.accessor.shared(wrapper).knit_copy(context)?;
        Ok(Box::new(self.accessor.wrap(shared)))
    }
}

fn write_synchronized<W: Synchronized>(
    wrapper: &W,
    context: &mut WriteContext,
    write_ref_info: bool,
    write_type_info: bool,
) -> Result<(), Error> {
    let accessor = context.get_type_resolver().get_accessor::<W>()?;
    accessor
        .shared(wrapper)
        .knit_write(context, write_ref_info, write_type_info)
}

fn write_synchronized_data<W: Synchronized>(
    wrapper: &W,
    context: &mut WriteContext,
) -> Result<(), Error> {
    let accessor = context.get_type_resolver().get_accessor::<W>()?;
    accessor.shared(wrapper).knit_write_data(context)
}

fn read_synchronized<W: Synchronized>(
    context: &mut ReadContext,
    read_ref_info: bool,
    read_type_info: bool,
) -> Result<W, Error> {
    let accessor = context.get_type_resolver().get_accessor::<W>()?;
    let shared = Arc::<Mutex<W::Inner>>::knit_read(context, read_ref_info, read_type_info)?;
    Ok(accessor.wrap(shared))
}

fn read_synchronized_data<W: Synchronized>(context: &mut ReadContext) -> Result<W, Error> {
    let accessor = context.get_type_resolver().get_accessor::<W>()?;
    Ok(accessor.wrap(Arc::<Mutex<W::Inner>>::knit_read_data(context)?))
}

fn copy_synchronized<W: Synchronized>(wrapper: &W, context: &mut CopyContext) -> Result<W, Error> {
    let accessor = context.get_type_resolver().get_accessor::<W>()?;
    Ok(accessor.wrap(accessor.shared(wrapper).knit_copy(context)?))
}

/// `Serializer` methods of a wrapper type; the wrapper id is its container's.
macro_rules! synchronized_serializer {
    ($type_id:expr) => {
        fn knit_write(
            &self,
            context: &mut WriteContext,
            write_ref_info: bool,
            write_type_info: bool,
        ) -> Result<(), Error> {
            write_synchronized(self, context, write_ref_info, write_type_info)
        }

        fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
            write_synchronized_data(self, context)
        }

        fn knit_read(
            context: &mut ReadContext,
            read_ref_info: bool,
            read_type_info: bool,
        ) -> Result<Self, Error> {
            read_synchronized(context, read_ref_info, read_type_info)
        }

        fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
            read_synchronized_data(context)
        }

        fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
            copy_synchronized(self, context)
        }

        fn knit_is_shared_ref() -> bool {
            true
        }

        builtin_type_info!($type_id);
    };
}

/// A list whose every access goes through one mutex.
#[derive(Debug, Default)]
pub struct SynchronizedList<T> {
    inner: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for SynchronizedList<T> {
    fn clone(&self) -> Self {
        SynchronizedList {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SynchronizedList<T> {
    pub fn new(elements: Vec<T>) -> Self {
        SynchronizedList {
            inner: Arc::new(Mutex::new(elements)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>, Error> {
        lock(&self.inner)
    }

    pub fn push(&self, value: T) -> Result<(), Error> {
        self.lock()?.push(value);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.lock()?.is_empty())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> SynchronizedList<T> {
    pub fn snapshot(&self) -> Result<Vec<T>, Error> {
        Ok(self.lock()?.clone())
    }
}

impl<T: Serializer> Synchronized for SynchronizedList<T> {
    type Inner = Vec<T>;
    const TYPE_ID: u32 = types::LIST;

    fn from_shared(shared: Arc<Mutex<Vec<T>>>) -> Self {
        SynchronizedList { inner: shared }
    }

    fn shared(&self) -> &Arc<Mutex<Vec<T>>> {
        &self.inner
    }

    fn write_untyped(inner: &Vec<T>, context: &mut WriteContext) -> Result<(), Error> {
        write_collection_data_untyped(inner.iter(), inner.len(), context)
    }
}

impl<T: Serializer> Serializer for SynchronizedList<T> {
    synchronized_serializer!(types::LIST);
}

/// A hash map whose every access goes through one mutex.
#[derive(Debug, Default)]
pub struct SynchronizedMap<K, V> {
    inner: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Clone for SynchronizedMap<K, V> {
    fn clone(&self) -> Self {
        SynchronizedMap {
            inner: self.inner.clone(),
        }
    }
}

impl<K: Eq + Hash, V> SynchronizedMap<K, V> {
    pub fn new(entries: HashMap<K, V>) -> Self {
        SynchronizedMap {
            inner: Arc::new(Mutex::new(entries)),
        }
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, HashMap<K, V>>, Error> {
        lock(&self.inner)
    }

    pub fn insert(&self, key: K, value: V) -> Result<Option<V>, Error> {
        Ok(self.lock()?.insert(key, value))
    }

    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.lock()?.is_empty())
    }
}

impl<K: Eq + Hash + Clone, V: Clone> SynchronizedMap<K, V> {
    pub fn snapshot(&self) -> Result<HashMap<K, V>, Error> {
        Ok(self.lock()?.clone())
    }
}

impl<K: Serializer + Eq + Hash, V: Serializer> Synchronized for SynchronizedMap<K, V> {
    type Inner = HashMap<K, V>;
    const TYPE_ID: u32 = types::MAP;

    fn from_shared(shared: Arc<Mutex<HashMap<K, V>>>) -> Self {
        SynchronizedMap { inner: shared }
    }

    fn shared(&self) -> &Arc<Mutex<HashMap<K, V>>> {
        &self.inner
    }

    fn write_untyped(inner: &HashMap<K, V>, context: &mut WriteContext) -> Result<(), Error> {
        write_map_data_untyped(inner.iter(), inner.len(), context)
    }
}

impl<K: Serializer + Eq + Hash, V: Serializer> Serializer for SynchronizedMap<K, V> {
    synchronized_serializer!(types::MAP);
}
