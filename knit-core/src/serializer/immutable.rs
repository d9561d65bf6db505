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

//! Read-only containers with shared storage.
//!
//! They use the same wire ids and payloads as their mutable counterparts (`LIST`,
//! `SET`, `MAP`): a peer may decode them into any container of the same category.
//! Reads go through the container surrogates and build the storage in one shot.
//! Cloning and deep copying share the storage.

use crate::error::Error;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::serializer::collection::{
    read_collection_data, read_map_data, write_collection_data, write_map_data,
    CollectionContainer, FromCollectionContainer, FromMapContainer, MapContainer,
};
use crate::serializer::Serializer;
use crate::types;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ImmutableList<T> {
    elements: Arc<[T]>,
}

impl<T> Clone for ImmutableList<T> {
    fn clone(&self) -> Self {
        ImmutableList {
            elements: self.elements.clone(),
        }
    }
}

impl<T> ImmutableList<T> {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn shares_storage_with(&self, other: &ImmutableList<T>) -> bool {
        Arc::ptr_eq(&self.elements, &other.elements)
    }
}

impl<T> From<Vec<T>> for ImmutableList<T> {
    fn from(elements: Vec<T>) -> Self {
        ImmutableList {
            elements: elements.into(),
        }
    }
}

impl<T> FromIterator<T> for ImmutableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ImmutableList {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<T> FromCollectionContainer<T> for ImmutableList<T> {
    fn from_container(container: CollectionContainer<T>) -> Result<Self, Error> {
        Ok(container.into_vec().into())
    }
}

impl<T: Serializer> Serializer for ImmutableList<T> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_collection_data(self.elements.iter(), self.len(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        ImmutableList::from_container(read_collection_data(context)?)
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(self.clone())
    }

    builtin_type_info!(types::LIST);
}

#[derive(Debug, PartialEq, Eq)]
pub struct ImmutableSet<T: Eq + Hash> {
    elements: Arc<HashSet<T>>,
}

impl<T: Eq + Hash> Clone for ImmutableSet<T> {
    fn clone(&self) -> Self {
        ImmutableSet {
            elements: self.elements.clone(),
        }
    }
}

impl<T: Eq + Hash> ImmutableSet<T> {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.elements.contains(value)
    }

    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, T> {
        self.elements.iter()
    }
}

impl<T: Eq + Hash> FromIterator<T> for ImmutableSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ImmutableSet {
            elements: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<T: Eq + Hash> FromCollectionContainer<T> for ImmutableSet<T> {
    fn from_container(container: CollectionContainer<T>) -> Result<Self, Error> {
        Ok(container.into_vec().into_iter().collect())
    }
}

impl<T: Serializer + Eq + Hash> Serializer for ImmutableSet<T> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_collection_data(self.elements.iter(), self.len(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        ImmutableSet::from_container(read_collection_data(context)?)
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(self.clone())
    }

    builtin_type_info!(types::SET);
}

#[derive(Debug, PartialEq, Eq)]
pub struct ImmutableMap<K: Eq + Hash, V> {
    entries: Arc<HashMap<K, V>>,
}

impl<K: Eq + Hash, V> Clone for ImmutableMap<K, V> {
    fn clone(&self) -> Self {
        ImmutableMap {
            entries: self.entries.clone(),
        }
    }
}

impl<K: Eq + Hash, V> ImmutableMap<K, V> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for ImmutableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ImmutableMap {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<K: Eq + Hash, V> FromMapContainer<K, V> for ImmutableMap<K, V> {
    fn from_container(container: MapContainer<K, V>) -> Result<Self, Error> {
        Ok(container.into_entries().into_iter().collect())
    }
}

impl<K: Serializer + Eq + Hash, V: Serializer> Serializer for ImmutableMap<K, V> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_map_data(self.entries.iter(), self.len(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        ImmutableMap::from_container(read_map_data(context)?)
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(self.clone())
    }

    builtin_type_info!(types::MAP);
}
