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

use knit_core::buffer::Writer;
use knit_core::{ImmutableList, Knit};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

#[test]
fn list_size_classes_round_trip() {
    let knit = Knit::default();
    for len in [0usize, 1, 127, 128, 300, 20_000] {
        let list: Vec<i64> = (0..len as i64).map(|i| i * 31 - 500).collect();
        let bytes = knit.serialize(&list).unwrap();
        let decoded: Vec<i64> = knit.deserialize(&bytes).unwrap();
        assert_eq!(decoded, list, "len {len}");
    }
}

#[test]
fn strings_and_nested_lists() {
    let knit = Knit::default();
    let nested: Vec<Vec<String>> = vec![
        vec![],
        vec!["a".to_string()],
        (0..200).map(|i| format!("item-{i}")).collect(),
    ];
    let bytes = knit.serialize(&nested).unwrap();
    let decoded: Vec<Vec<String>> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded, nested);
}

#[test]
fn sets_and_deques() {
    let knit = Knit::default();
    let set: HashSet<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
    let bytes = knit.serialize(&set).unwrap();
    assert_eq!(knit.deserialize::<HashSet<String>>(&bytes).unwrap(), set);
    let as_btree: BTreeSet<String> = knit.deserialize(&bytes).unwrap();
    assert_eq!(as_btree.len(), 3);
    assert!(as_btree.contains("y"));

    let deque: VecDeque<u16> = (0..10).collect();
    let bytes = knit.serialize(&deque).unwrap();
    assert_eq!(knit.deserialize::<VecDeque<u16>>(&bytes).unwrap(), deque);
    let as_vec: Vec<u16> = knit.deserialize(&bytes).unwrap();
    assert_eq!(as_vec, (0..10).collect::<Vec<u16>>());
}

#[test]
fn maps_round_trip() {
    let knit = Knit::default();
    let mut map: HashMap<String, Vec<f64>> = HashMap::new();
    map.insert("halves".to_string(), vec![2.5, -0.125]);
    map.insert("empty".to_string(), vec![]);
    let bytes = knit.serialize(&map).unwrap();
    assert_eq!(knit.deserialize::<HashMap<String, Vec<f64>>>(&bytes).unwrap(), map);

    let tree: BTreeMap<i32, BTreeSet<i8>> = (0..50)
        .map(|i| (i, (0..(i % 5) as i8).collect()))
        .collect();
    let bytes = knit.serialize(&tree).unwrap();
    assert_eq!(knit.deserialize::<BTreeMap<i32, BTreeSet<i8>>>(&bytes).unwrap(), tree);

    let empty: HashMap<u8, String> = HashMap::new();
    let bytes = knit.serialize(&empty).unwrap();
    assert!(knit.deserialize::<HashMap<u8, String>>(&bytes).unwrap().is_empty());
}

#[test]
fn null_elements_round_trip() {
    let knit = Knit::default();
    let list = vec![Some("a".to_string()), None, Some("c".to_string()), None];
    let bytes = knit.serialize(&list).unwrap();
    assert_eq!(knit.deserialize::<Vec<Option<String>>>(&bytes).unwrap(), list);

    let mut map: HashMap<String, Option<i32>> = HashMap::new();
    map.insert("some".to_string(), Some(1));
    map.insert("none".to_string(), None);
    let bytes = knit.serialize(&map).unwrap();
    assert_eq!(
        knit.deserialize::<HashMap<String, Option<i32>>>(&bytes).unwrap(),
        map
    );

    let without_nulls: Vec<Option<i32>> = vec![Some(1), Some(2)];
    let bytes = knit.serialize(&without_nulls).unwrap();
    assert_eq!(
        knit.deserialize::<Vec<Option<i32>>>(&bytes).unwrap(),
        without_nulls
    );
}

fn count_prefix_len(n: usize) -> usize {
    let mut writer = Writer::default();
    writer.write_varuint36_small(n as u64).unwrap();
    writer.len()
}

fn payload_len(values: &[i32]) -> usize {
    let mut writer = Writer::default();
    for v in values {
        writer.write_varint32(*v);
    }
    writer.len()
}

#[test]
fn list_framing_does_not_depend_on_length() {
    let knit = Knit::default();
    let empty: Vec<i32> = vec![];
    let single: ImmutableList<i32> = ImmutableList::from(vec![7]);
    let large: ImmutableList<i32> = (0..1000).collect();

    let empty_bytes = knit.serialize(&empty).unwrap();
    let single_bytes = knit.serialize(&single).unwrap();
    let large_bytes = knit.serialize(&large).unwrap();

    assert!(knit.deserialize::<Vec<i32>>(&empty_bytes).unwrap().is_empty());
    assert_eq!(knit.deserialize::<ImmutableList<i32>>(&single_bytes).unwrap(), single);
    assert_eq!(knit.deserialize::<ImmutableList<i32>>(&large_bytes).unwrap(), large);

    let framing = |bytes: &[u8], values: &[i32]| {
        bytes.len() - count_prefix_len(values.len()) - payload_len(values)
    };
    let empty_framing = framing(&empty_bytes, &empty);
    assert_eq!(empty_framing, framing(&single_bytes, single.as_slice()));
    assert_eq!(empty_framing, framing(&large_bytes, large.as_slice()));
}

#[test]
fn deep_copy_collections() {
    let knit = Knit::default();
    let mut map: BTreeMap<String, Vec<Option<u64>>> = BTreeMap::new();
    map.insert("k".to_string(), vec![Some(1), None, Some(u64::MAX)]);
    let copy = knit.deep_copy(&map).unwrap();
    assert_eq!(copy, map);
}
