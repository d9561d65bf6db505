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

use knit_core::{DeclaredAccessors, ImmutableSortedSet, Knit, ReverseOrder, SynchronizedList};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;

fn shared_knit() -> Arc<Knit> {
    let mut knit = Knit::default();
    knit.register_comparator::<ReverseOrder, i64>(10).unwrap();
    assert!(knit
        .register_synchronized::<SynchronizedList<String>, _>(&DeclaredAccessors)
        .unwrap());
    Arc::new(knit)
}

#[test]
fn one_engine_many_threads() {
    let knit = shared_knit();
    let handles: Vec<_> = (0..8i64)
        .map(|t| {
            let knit = knit.clone();
            thread::spawn(move || {
                for i in 0..200i64 {
                    let mut map = HashMap::new();
                    map.insert(format!("thread-{t}"), vec![t, i, t * i]);
                    let bytes = knit.serialize(&map).unwrap();
                    let decoded: HashMap<String, Vec<i64>> = knit.deserialize(&bytes).unwrap();
                    assert_eq!(decoded, map);

                    let set = ImmutableSortedSet::with_comparator(
                        vec![t, i, -i],
                        Arc::new(ReverseOrder),
                    );
                    let bytes = knit.serialize(&set).unwrap();
                    let decoded: ImmutableSortedSet<i64> = knit.deserialize(&bytes).unwrap();
                    assert_eq!(decoded, set);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn messages_are_independent_of_the_thread() {
    let knit = shared_knit();
    let value = vec!["same".to_string(); 16];
    let expected = knit.serialize(&value).unwrap();
    let results = Arc::new(Mutex::new(Vec::new()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let knit = knit.clone();
            let value = value.clone();
            let results = results.clone();
            thread::spawn(move || {
                let bytes = knit.serialize(&value).unwrap();
                results.lock().unwrap().push(bytes);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    let results = results.lock().unwrap();
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|bytes| *bytes == expected));
}

#[test]
fn synchronized_list_shared_with_writers() {
    let knit = shared_knit();
    let list = SynchronizedList::new(Vec::new());
    let writers: Vec<_> = (0..4)
        .map(|t| {
            let list = list.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    list.push(format!("{t}:{i}")).unwrap();
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..2)
        .map(|_| {
            let knit = knit.clone();
            let list = list.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let bytes = knit.serialize(&list).unwrap();
                    let decoded: SynchronizedList<String> = knit.deserialize(&bytes).unwrap();
                    assert!(decoded.len().unwrap() <= 200);
                }
            })
        })
        .collect();
    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
    let bytes = knit.serialize(&list).unwrap();
    let decoded: SynchronizedList<String> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.len().unwrap(), 200);
}
