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

//! Element streaming shared by every collection and map serializer.
//!
//! ```text
//! collection: varuint36_small(len) | header | [elem type info] | elem*
//! map:        varuint36_small(len) | key header | value header
//!             | [key type info] | [value type info] | (key value)*
//! ```
//!
//! Headers are always present and the declared type info is written even for empty
//! containers, so framing does not depend on the length. Reads collect elements into a
//! [`CollectionContainer`] / [`MapContainer`] and the target type is built from it in
//! one shot through [`FromCollectionContainer`] / [`FromMapContainer`].

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::Serializer;
use crate::types::collection_flags::{DECL_ELEMENT_TYPE, HAS_NULL, TRACKING_REF};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Decoded elements of a collection, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionContainer<T> {
    elements: Vec<T>,
}

impl<T> CollectionContainer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        CollectionContainer {
            elements: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn push(&mut self, element: T) {
        self.elements.push(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

/// Decoded entries of a map, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct MapContainer<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> MapContainer<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        MapContainer {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub fn push(&mut self, key: K, value: V) {
        self.entries.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

/// One-shot construction of a collection from its decoded elements.
pub trait FromCollectionContainer<T>: Sized {
    fn from_container(container: CollectionContainer<T>) -> Result<Self, Error>;
}

/// One-shot construction of a map from its decoded entries.
pub trait FromMapContainer<K, V>: Sized {
    fn from_container(container: MapContainer<K, V>) -> Result<Self, Error>;
}

impl<T> FromCollectionContainer<T> for Vec<T> {
    fn from_container(container: CollectionContainer<T>) -> Result<Self, Error> {
        Ok(container.into_vec())
    }
}

impl<T> FromCollectionContainer<T> for VecDeque<T> {
    fn from_container(container: CollectionContainer<T>) -> Result<Self, Error> {
        Ok(container.into_vec().into())
    }
}

impl<T: Eq + Hash> FromCollectionContainer<T> for HashSet<T> {
    fn from_container(container: CollectionContainer<T>) -> Result<Self, Error> {
        Ok(container.into_vec().into_iter().collect())
    }
}

impl<T: Ord> FromCollectionContainer<T> for BTreeSet<T> {
    fn from_container(container: CollectionContainer<T>) -> Result<Self, Error> {
        Ok(container.into_vec().into_iter().collect())
    }
}

impl<K: Eq + Hash, V> FromMapContainer<K, V> for HashMap<K, V> {
    fn from_container(container: MapContainer<K, V>) -> Result<Self, Error> {
        Ok(container.into_entries().into_iter().collect())
    }
}

impl<K: Ord, V> FromMapContainer<K, V> for BTreeMap<K, V> {
    fn from_container(container: MapContainer<K, V>) -> Result<Self, Error> {
        Ok(container.into_entries().into_iter().collect())
    }
}

fn element_header<T: Serializer>(context: &WriteContext, has_null: bool, declare: bool) -> u8 {
    let mut header = 0;
    if T::knit_is_shared_ref() && context.is_track_ref() {
        header |= TRACKING_REF;
    }
    if has_null {
        header |= HAS_NULL;
    }
    if declare && !T::knit_is_polymorphic() {
        header |= DECL_ELEMENT_TYPE;
    }
    header
}

#[inline(always)]
fn writes_flag(header: u8) -> bool {
    header & (TRACKING_REF | HAS_NULL) != 0
}

#[inline(always)]
fn is_declared(header: u8) -> bool {
    header & DECL_ELEMENT_TYPE != 0
}

fn write_len(len: usize, context: &mut WriteContext) -> Result<(), Error> {
    context.writer.write_varuint36_small(len as u64)
}

/// Reads an element count and caps the preallocation by what the buffer can hold.
fn read_len(context: &mut ReadContext) -> Result<(usize, usize), Error> {
    let len = context.reader.read_varuint36_small()? as usize;
    Ok((len, len.min(context.reader.remaining())))
}

/// Writes the header, the declared element type info and the elements, without the
/// count.
pub fn write_elements<'b, T, I>(iter: I, context: &mut WriteContext) -> Result<(), Error>
where
    T: Serializer + 'b,
    I: IntoIterator<Item = &'b T>,
    I::IntoIter: Clone,
{
    write_elements_with(iter, true, context)
}

fn write_elements_with<'b, T, I>(
    iter: I,
    declare: bool,
    context: &mut WriteContext,
) -> Result<(), Error>
where
    T: Serializer + 'b,
    I: IntoIterator<Item = &'b T>,
    I::IntoIter: Clone,
{
    let iter = iter.into_iter();
    let has_null = T::knit_is_option() && iter.clone().any(|e| e.knit_is_none());
    let header = element_header::<T>(context, has_null, declare);
    context.writer.write_u8(header);
    if is_declared(header) {
        T::knit_write_type_info(context)?;
    }
    context.inc_depth()?;
    for element in iter {
        element.knit_write(context, writes_flag(header), !is_declared(header))?;
    }
    context.dec_depth();
    Ok(())
}

pub fn read_elements<T: Serializer>(
    len: usize,
    capacity: usize,
    context: &mut ReadContext,
) -> Result<CollectionContainer<T>, Error> {
    let header = context.reader.read_u8()?;
    if is_declared(header) {
        T::knit_read_type_info(context)?;
    }
    let mut container = CollectionContainer::with_capacity(capacity);
    context.inc_depth()?;
    for _ in 0..len {
        container.push(T::knit_read(
            context,
            writes_flag(header),
            !is_declared(header),
        )?);
    }
    context.dec_depth();
    Ok(container)
}

pub fn write_collection_data<'b, T, I>(
    iter: I,
    len: usize,
    context: &mut WriteContext,
) -> Result<(), Error>
where
    T: Serializer + 'b,
    I: IntoIterator<Item = &'b T>,
    I::IntoIter: Clone,
{
    write_len(len, context)?;
    write_elements(iter, context)
}

/// Like [`write_collection_data`], but every element carries its own type info, which
/// is the form a reader of `Vec<Box<dyn Any>>` expects.
pub fn write_collection_data_untyped<'b, T, I>(
    iter: I,
    len: usize,
    context: &mut WriteContext,
) -> Result<(), Error>
where
    T: Serializer + 'b,
    I: IntoIterator<Item = &'b T>,
    I::IntoIter: Clone,
{
    write_len(len, context)?;
    write_elements_with(iter, false, context)
}

pub fn read_collection_data<T: Serializer>(
    context: &mut ReadContext,
) -> Result<CollectionContainer<T>, Error> {
    let (len, capacity) = read_len(context)?;
    read_elements(len, capacity, context)
}

/// Reads the element count only. Used by serializers that put metadata between the
/// count and the elements.
pub fn read_collection_len(context: &mut ReadContext) -> Result<(usize, usize), Error> {
    read_len(context)
}

pub fn write_collection_len(len: usize, context: &mut WriteContext) -> Result<(), Error> {
    write_len(len, context)
}

pub fn write_map_data<'b, K, V, I>(
    iter: I,
    len: usize,
    context: &mut WriteContext,
) -> Result<(), Error>
where
    K: Serializer + 'b,
    V: Serializer + 'b,
    I: IntoIterator<Item = (&'b K, &'b V)>,
    I::IntoIter: Clone,
{
    write_map_data_with(iter, len, true, context)
}

/// Like [`write_map_data`], but every value carries its own type info, which is the
/// form a reader of `HashMap<K, Box<dyn Any>>` expects.
pub fn write_map_data_untyped<'b, K, V, I>(
    iter: I,
    len: usize,
    context: &mut WriteContext,
) -> Result<(), Error>
where
    K: Serializer + 'b,
    V: Serializer + 'b,
    I: IntoIterator<Item = (&'b K, &'b V)>,
    I::IntoIter: Clone,
{
    write_map_data_with(iter, len, false, context)
}

fn write_map_data_with<'b, K, V, I>(
    iter: I,
    len: usize,
    declare_values: bool,
    context: &mut WriteContext,
) -> Result<(), Error>
where
    K: Serializer + 'b,
    V: Serializer + 'b,
    I: IntoIterator<Item = (&'b K, &'b V)>,
    I::IntoIter: Clone,
{
    write_len(len, context)?;
    let iter = iter.into_iter();
    let key_has_null = K::knit_is_option() && iter.clone().any(|(k, _)| k.knit_is_none());
    let value_has_null = V::knit_is_option() && iter.clone().any(|(_, v)| v.knit_is_none());
    let key_header = element_header::<K>(context, key_has_null, true);
    let value_header = element_header::<V>(context, value_has_null, declare_values);
    context.writer.write_u8(key_header);
    context.writer.write_u8(value_header);
    if is_declared(key_header) {
        K::knit_write_type_info(context)?;
    }
    if is_declared(value_header) {
        V::knit_write_type_info(context)?;
    }
    context.inc_depth()?;
    for (key, value) in iter {
        key.knit_write(context, writes_flag(key_header), !is_declared(key_header))?;
        value.knit_write(context, writes_flag(value_header), !is_declared(value_header))?;
    }
    context.dec_depth();
    Ok(())
}

pub fn read_map_data<K: Serializer, V: Serializer>(
    context: &mut ReadContext,
) -> Result<MapContainer<K, V>, Error> {
    let (len, capacity) = read_len(context)?;
    let key_header = context.reader.read_u8()?;
    let value_header = context.reader.read_u8()?;
    if is_declared(key_header) {
        K::knit_read_type_info(context)?;
    }
    if is_declared(value_header) {
        V::knit_read_type_info(context)?;
    }
    let mut container = MapContainer::with_capacity(capacity);
    context.inc_depth()?;
    for _ in 0..len {
        let key = K::knit_read(context, writes_flag(key_header), !is_declared(key_header))?;
        let value = V::knit_read(
            context,
            writes_flag(value_header),
            !is_declared(value_header),
        )?;
        container.push(key, value);
    }
    context.dec_depth();
    Ok(container)
}
