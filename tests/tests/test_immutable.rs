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

use knit_core::error::Error;
use knit_core::resolver::context::{CopyContext, ReadContext, WriteContext};
use knit_core::{
    Comparator, ErrorKind, ImmutableList, ImmutableMap, ImmutableSet, ImmutableSortedSet, Knit,
    ReverseOrder, Serializer,
};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Orders strings by length, then lexicographically.
struct ByLength;

impl Comparator<String> for ByLength {
    fn compare(&self, a: &String, b: &String) -> Ordering {
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Serializer for ByLength {
    fn knit_write_data(&self, _: &mut WriteContext) -> Result<(), Error> {
        Ok(())
    }

    fn knit_read_data(_: &mut ReadContext) -> Result<Self, Error> {
        Ok(ByLength)
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(ByLength)
    }
}

#[test]
fn immutable_containers_round_trip() {
    let knit = Knit::default();
    let list: ImmutableList<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let bytes = knit.serialize(&list).unwrap();
    assert_eq!(knit.deserialize::<ImmutableList<String>>(&bytes).unwrap(), list);
    // same category on the wire as a plain list
    assert_eq!(
        knit.deserialize::<Vec<String>>(&bytes).unwrap(),
        vec!["a", "b", "c"]
    );

    let set: ImmutableSet<i32> = (0..20).collect();
    let bytes = knit.serialize(&set).unwrap();
    let decoded: ImmutableSet<i32> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.len(), 20);
    assert!(decoded.contains(&19));
    let as_hash_set: HashSet<i32> = knit.deserialize(&bytes).unwrap();
    assert_eq!(as_hash_set, (0..20).collect());

    let map: ImmutableMap<String, u8> = [("one".to_string(), 1u8), ("two".to_string(), 2u8)]
        .into_iter()
        .collect();
    let bytes = knit.serialize(&map).unwrap();
    let decoded: ImmutableMap<String, u8> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.get(&"two".to_string()), Some(&2));
    let as_hash_map: HashMap<String, u8> = knit.deserialize(&bytes).unwrap();
    assert_eq!(as_hash_map.len(), 2);
}

#[test]
fn deep_copy_shares_immutable_storage() {
    let knit = Knit::default();
    let list: ImmutableList<i64> = (0..100).collect();
    let copy = knit.deep_copy(&list).unwrap();
    assert!(copy.shares_storage_with(&list));
    assert_eq!(copy, list);
}

#[test]
fn natural_order_sorted_set() {
    let knit = Knit::default();
    let set = ImmutableSortedSet::new(vec![5, 1, 4, 1, 3]);
    assert_eq!(set.iter().copied().collect::<Vec<i32>>(), vec![1, 3, 4, 5]);
    assert!(set.comparator().is_none());

    let bytes = knit.serialize(&set).unwrap();
    let decoded: ImmutableSortedSet<i32> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded, set);
    assert!(decoded.contains(&4));
    assert!(!decoded.contains(&2));
}

#[test]
fn reverse_order_sorted_set() {
    let mut knit = Knit::default();
    knit.register_comparator::<ReverseOrder, i32>(100).unwrap();
    let set = ImmutableSortedSet::with_comparator(vec![2, 9, 4], Arc::new(ReverseOrder));
    assert_eq!(set.first(), Some(&9));

    let bytes = knit.serialize(&set).unwrap();
    let decoded: ImmutableSortedSet<i32> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.iter().copied().collect::<Vec<i32>>(), vec![9, 4, 2]);
    assert!(decoded.comparator().is_some());
    assert!(decoded.contains(&4));
    assert_eq!(decoded.last(), Some(&2));
}

#[test]
fn custom_comparator_by_name() {
    let mut knit = Knit::default();
    knit.register_comparator_by_name::<ByLength, String>("demo", "ByLength")
        .unwrap();
    let words = ["pear", "fig", "banana", "kiwi"].iter().map(|s| s.to_string());
    let set = ImmutableSortedSet::with_comparator(words, Arc::new(ByLength));

    let bytes = knit.serialize(&set).unwrap();
    let decoded: ImmutableSortedSet<String> = knit.deserialize(&bytes).unwrap();
    assert_eq!(
        decoded.iter().cloned().collect::<Vec<String>>(),
        vec!["fig", "kiwi", "pear", "banana"]
    );
    assert!(decoded.contains(&"pear".to_string()));
}

#[test]
fn unregistered_comparator_is_unsupported() {
    let knit = Knit::default();
    let set = ImmutableSortedSet::with_comparator(vec![1i32, 2], Arc::new(ReverseOrder));
    let err = knit.serialize(&set).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);

    let mut writer_side = Knit::default();
    writer_side
        .register_comparator::<ReverseOrder, i32>(100)
        .unwrap();
    let bytes = writer_side.serialize(&set).unwrap();
    let err = knit.deserialize::<ImmutableSortedSet<i32>>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
}

#[test]
fn sorted_set_and_plain_set_do_not_mix() {
    let knit = Knit::default();
    let sorted = ImmutableSortedSet::new(vec![1, 2, 3]);
    let bytes = knit.serialize(&sorted).unwrap();
    let err = knit.deserialize::<HashSet<i32>>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);

    let plain: HashSet<i32> = [1, 2, 3].into_iter().collect();
    let bytes = knit.serialize(&plain).unwrap();
    let err = knit
        .deserialize::<ImmutableSortedSet<i32>>(&bytes)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
}
