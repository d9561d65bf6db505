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
use knit_core::{
    AccessorLookup, DeclaredAccessors, ErrorKind, InternalAccessor, Knit, Synchronized,
    SynchronizedList, SynchronizedMap,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// A lookup that cannot reach any wrapper internals.
struct Inaccessible;

impl AccessorLookup for Inaccessible {
    fn find<W: Synchronized>(&self) -> Result<InternalAccessor<W>, Error> {
        Err(Error::platform_access(format!(
            "internals of {} are not reachable",
            std::any::type_name::<W>()
        )))
    }
}

/// A lookup that fails for a reason other than access.
struct Broken;

impl AccessorLookup for Broken {
    fn find<W: Synchronized>(&self) -> Result<InternalAccessor<W>, Error> {
        Err(Error::invalid_data("lookup table is corrupt"))
    }
}

fn knit() -> Knit {
    let mut knit = Knit::default();
    assert!(knit
        .register_synchronized::<SynchronizedList<i32>, _>(&DeclaredAccessors)
        .unwrap());
    assert!(knit
        .register_synchronized::<SynchronizedMap<String, i64>, _>(&DeclaredAccessors)
        .unwrap());
    knit
}

#[test]
fn list_round_trip() {
    let knit = knit();
    let list = SynchronizedList::new(vec![3, 1, 4, 1, 5]);
    let bytes = knit.serialize(&list).unwrap();
    let decoded: SynchronizedList<i32> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.snapshot().unwrap(), vec![3, 1, 4, 1, 5]);
    assert!(!decoded.ptr_eq(&list));

    let empty = SynchronizedList::<i32>::default();
    let bytes = knit.serialize(&empty).unwrap();
    let decoded: SynchronizedList<i32> = knit.deserialize(&bytes).unwrap();
    assert!(decoded.is_empty().unwrap());
}

#[test]
fn map_round_trip() {
    let knit = knit();
    let map = SynchronizedMap::new(HashMap::new());
    map.insert("a".to_string(), 1).unwrap();
    map.insert("b".to_string(), -2).unwrap();
    let bytes = knit.serialize(&map).unwrap();
    let decoded: SynchronizedMap<String, i64> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.len().unwrap(), 2);
    assert_eq!(decoded.snapshot().unwrap(), map.snapshot().unwrap());
}

#[test]
fn wrappers_sharing_a_handle_stay_shared() {
    let knit = knit();
    let list = SynchronizedList::new(vec![7]);
    let values = vec![list.clone(), list.clone(), SynchronizedList::new(vec![8])];
    let bytes = knit.serialize(&values).unwrap();
    let decoded: Vec<SynchronizedList<i32>> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.len(), 3);
    assert!(decoded[0].ptr_eq(&decoded[1]));
    assert!(!decoded[0].ptr_eq(&decoded[2]));
    decoded[0].push(9).unwrap();
    assert_eq!(decoded[1].snapshot().unwrap(), vec![7, 9]);
    assert_eq!(decoded[2].snapshot().unwrap(), vec![8]);
}

#[test]
fn deep_copy_keeps_sharing() {
    let knit = knit();
    let list = SynchronizedList::new(vec![1, 2]);
    let values = vec![list.clone(), list.clone()];
    let copy = knit.deep_copy(&values).unwrap();
    assert!(copy[0].ptr_eq(&copy[1]));
    assert!(!copy[0].ptr_eq(&list));
    copy[0].push(3).unwrap();
    assert_eq!(list.snapshot().unwrap(), vec![1, 2]);
}

#[test]
fn snapshot_is_consistent_under_concurrent_mutation() {
    let knit = knit();
    let list = SynchronizedList::<i32>::new(vec![]);
    let stop = Arc::new(AtomicBool::new(false));

    let mutator = {
        let list = list.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let mut x = 0;
            while !stop.load(Ordering::Relaxed) && x < 50_000 {
                let mut guard = list.lock().unwrap();
                guard.push(x);
                guard.push(x);
                drop(guard);
                x += 1;
            }
        })
    };

    for _ in 0..200 {
        let bytes = knit.serialize(&list).unwrap();
        let snapshot: SynchronizedList<i32> = knit.deserialize(&bytes).unwrap();
        let values = snapshot.snapshot().unwrap();
        assert_eq!(values.len() % 2, 0);
        for pair in values.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }
    stop.store(true, Ordering::Relaxed);
    mutator.join().unwrap();
}

#[test]
fn inaccessible_internals_skip_the_adapter() {
    let mut knit = Knit::default();
    let registered = knit
        .register_synchronized::<SynchronizedList<i32>, _>(&Inaccessible)
        .unwrap();
    assert!(!registered);

    let err = knit
        .serialize(&SynchronizedList::new(vec![1, 2]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);

    // the rest of the engine is unaffected
    let bytes = knit.serialize(&vec![1, 2]).unwrap();
    assert_eq!(knit.deserialize::<Vec<i32>>(&bytes).unwrap(), vec![1, 2]);
    let err = knit.deserialize::<SynchronizedList<i32>>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
}

#[test]
fn other_lookup_failures_propagate() {
    let mut knit = Knit::default();
    let err = knit
        .register_synchronized::<SynchronizedList<i32>, _>(&Broken)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}

#[test]
fn wrapper_bytes_decode_as_plain_containers() {
    let knit = knit();
    let bytes = knit.serialize(&SynchronizedList::new(vec![5, 6, 7])).unwrap();
    assert_eq!(knit.deserialize::<Vec<i32>>(&bytes).unwrap(), vec![5, 6, 7]);
    assert!(knit
        .deserialize::<SynchronizedMap<String, i64>>(&bytes)
        .is_err());

    let map = SynchronizedMap::new(HashMap::from([("k".to_string(), 3i64)]));
    let bytes = knit.serialize(&map).unwrap();
    let plain: HashMap<String, i64> = knit.deserialize(&bytes).unwrap();
    assert_eq!(plain, map.snapshot().unwrap());

    let distinct = vec![SynchronizedList::new(vec![1]), SynchronizedList::new(vec![2])];
    let bytes = knit.serialize(&distinct).unwrap();
    let plain: Vec<Vec<i32>> = knit.deserialize(&bytes).unwrap();
    assert_eq!(plain, vec![vec![1], vec![2]]);
}

#[test]
fn plain_container_bytes_decode_as_wrappers() {
    let knit = knit();
    let bytes = knit.serialize(&vec![1, 2, 3]).unwrap();
    let list: SynchronizedList<i32> = knit.deserialize(&bytes).unwrap();
    assert_eq!(list.snapshot().unwrap(), vec![1, 2, 3]);

    let bytes = knit
        .serialize(&HashMap::from([("x".to_string(), 9i64)]))
        .unwrap();
    let map: SynchronizedMap<String, i64> = knit.deserialize(&bytes).unwrap();
    assert_eq!(map.lock().unwrap().get("x"), Some(&9));
}

#[test]
fn shared_handles_are_rejected_by_plain_readers() {
    let knit = knit();
    let list = SynchronizedList::new(vec![4]);
    let bytes = knit.serialize(&vec![list.clone(), list]).unwrap();
    let err = knit.deserialize::<Vec<Vec<i32>>>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}

#[test]
fn wrappers_behind_dyn_any_read_back_as_containers() {
    let knit = knit();
    let map = SynchronizedMap::new(HashMap::from([("m".to_string(), -1i64)]));
    let values: Vec<Box<dyn Any>> = vec![
        Box::new(SynchronizedList::new(vec![5, 6, 7])),
        Box::new(map),
        Box::new(8i32),
    ];
    let bytes = knit.serialize(&values).unwrap();
    let decoded: Vec<Box<dyn Any>> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.len(), 3);

    let list = decoded[0].downcast_ref::<Vec<Box<dyn Any>>>().unwrap();
    let list: Vec<i32> = list
        .iter()
        .map(|e| *e.downcast_ref::<i32>().unwrap())
        .collect();
    assert_eq!(list, vec![5, 6, 7]);

    let map = decoded[1]
        .downcast_ref::<HashMap<String, Box<dyn Any>>>()
        .unwrap();
    assert_eq!(map["m"].downcast_ref::<i64>(), Some(&-1));
    assert_eq!(decoded[2].downcast_ref::<i32>(), Some(&8));

    let copy = knit.deep_copy(&values).unwrap();
    let list = copy[0].downcast_ref::<SynchronizedList<i32>>().unwrap();
    assert_eq!(list.snapshot().unwrap(), vec![5, 6, 7]);
}
