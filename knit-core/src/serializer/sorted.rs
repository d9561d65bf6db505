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

//! Immutable sorted set with an optional comparator.
//!
//! The set has its own type id, `SORTED_SET`, since its payload is not the plain
//! `SET` payload. Payload: `varuint36_small(len)`, the comparator (null flag when the natural order
//! is used, otherwise a not-null flag followed by the comparator written
//! polymorphically), then the elements. A comparator type is readable once its
//! serializer is registered together with a cast for the element type, see
//! `Knit::register_comparator`.

use crate::error::Error;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::serializer::any::{read_any, write_any};
use crate::serializer::collection::{
    read_collection_len, read_elements, write_collection_len, write_elements,
};
use crate::serializer::Serializer;
use crate::types::{self, RefFlag};
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Total order over `T`, carried along with the set it sorts.
pub trait Comparator<T>: Any + Send + Sync {
    fn compare(&self, a: &T, b: &T) -> Ordering;

    fn as_any(&self) -> &dyn Any;
}

/// Orders elements by their `Ord` impl, reversed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReverseOrder;

impl<T: Ord> Comparator<T> for ReverseOrder {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        b.cmp(a)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Serializer for ReverseOrder {
    fn knit_write_data(&self, _: &mut WriteContext) -> Result<(), Error> {
        Ok(())
    }

    fn knit_read_data(_: &mut ReadContext) -> Result<Self, Error> {
        Ok(ReverseOrder)
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(ReverseOrder)
    }
}

pub struct ImmutableSortedSet<T> {
    elements: Arc<[T]>,
    comparator: Option<Arc<dyn Comparator<T>>>,
}

impl<T> Clone for ImmutableSortedSet<T> {
    fn clone(&self) -> Self {
        ImmutableSortedSet {
            elements: self.elements.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ImmutableSortedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.elements.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for ImmutableSortedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: Ord + 'static> ImmutableSortedSet<T> {
    /// Builds a set in natural order, dropping duplicates.
    pub fn new<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut elements: Vec<T> = iter.into_iter().collect();
        elements.sort();
        elements.dedup();
        ImmutableSortedSet {
            elements: elements.into(),
            comparator: None,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.search(value).is_ok()
    }
}

impl<T: 'static> ImmutableSortedSet<T> {
    /// Builds a set ordered by `comparator`; elements comparing equal are collapsed.
    pub fn with_comparator<I: IntoIterator<Item = T>>(
        iter: I,
        comparator: Arc<dyn Comparator<T>>,
    ) -> Self {
        let mut elements: Vec<T> = iter.into_iter().collect();
        elements.sort_by(|a, b| comparator.compare(a, b));
        elements.dedup_by(|a, b| comparator.compare(a, b) == Ordering::Equal);
        ImmutableSortedSet {
            elements: elements.into(),
            comparator: Some(comparator),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn first(&self) -> Option<&T> {
        self.elements.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.elements.last()
    }

    pub fn comparator(&self) -> Option<&Arc<dyn Comparator<T>>> {
        self.comparator.as_ref()
    }
}

impl<T: Ord + 'static> ImmutableSortedSet<T> {
    fn search(&self, value: &T) -> Result<usize, usize> {
        match &self.comparator {
            Some(comparator) => self
                .elements
                .binary_search_by(|probe| comparator.compare(probe, value)),
            None => self.elements.binary_search(value),
        }
    }
}

fn read_comparator<T: 'static>(
    context: &mut ReadContext,
) -> Result<Option<Arc<dyn Comparator<T>>>, Error> {
    match context.ref_reader.read_ref_flag(&mut context.reader)? {
        RefFlag::Null => Ok(None),
        RefFlag::NotNullValue | RefFlag::RefValue => {
            let (type_info, value) = read_any(context)?;
            let cast = context
                .get_type_resolver()
                .get_comparator_cast::<T>(type_info.get_rust_type_id())
                .ok_or_else(|| {
                    Error::unsupported_type(format!(
                        "{} is not registered as a comparator of {}",
                        type_info.get_rust_type_name(),
                        std::any::type_name::<T>()
                    ))
                })?;
            cast(value).map(Some).ok_or_else(|| {
                Error::unsupported_type(format!(
                    "comparator cast for {} failed",
                    type_info.get_rust_type_name()
                ))
            })
        }
        RefFlag::Ref => Err(Error::invalid_ref("comparators are never written as references")),
    }
}

impl<T: Serializer + Ord> Serializer for ImmutableSortedSet<T> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_collection_len(self.len(), context)?;
        match &self.comparator {
            None => context.writer.write_i8(RefFlag::Null as i8),
            Some(comparator) => {
                context.writer.write_i8(RefFlag::NotNullValue as i8);
                write_any(Comparator::as_any(&**comparator), context)?;
            }
        }
        write_elements(self.elements.iter(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        let (len, capacity) = read_collection_len(context)?;
        let comparator = read_comparator::<T>(context)?;
        let elements = read_elements::<T>(len, capacity, context)?.into_vec();
        Ok(match comparator {
            Some(comparator) => ImmutableSortedSet::with_comparator(elements, comparator),
            None => ImmutableSortedSet::new(elements),
        })
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(self.clone())
    }

    builtin_type_info!(types::SORTED_SET);
}
