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
use knit_core::{ErrorKind, Knit, Serializer};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default, Debug)]
struct Link {
    value: i32,
    next: Option<Rc<RefCell<Link>>>,
}

impl Serializer for Link {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        self.value.knit_write_data(context)?;
        self.next.knit_write(context, true, false)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        Ok(Link {
            value: i32::knit_read_data(context)?,
            next: Option::knit_read(context, true, false)?,
        })
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        Ok(Link {
            value: self.value,
            next: self.next.knit_copy(context)?,
        })
    }
}

fn with_links(knit: Knit) -> Knit {
    let mut knit = knit;
    knit.register::<Link>(1).unwrap();
    knit
}

fn chain(len: i32) -> Rc<RefCell<Link>> {
    let mut head: Option<Rc<RefCell<Link>>> = None;
    for value in (0..len).rev() {
        head = Some(Rc::new(RefCell::new(Link { value, next: head })));
    }
    head.unwrap()
}

fn values(head: &Rc<RefCell<Link>>) -> Vec<i32> {
    let mut out = vec![head.borrow().value];
    let mut next = head.borrow().next.clone();
    while let Some(link) = next {
        out.push(link.borrow().value);
        next = link.borrow().next.clone();
    }
    out
}

#[test]
fn defaults() {
    let knit = Knit::default();
    let config = knit.get_config();
    assert!(config.is_xlang());
    assert!(config.is_compress_string());
    assert!(config.is_track_ref());
    assert_eq!(config.max_depth(), 64);

    let knit = Knit::default()
        .xlang(false)
        .compress_string(false)
        .track_ref(false)
        .max_depth(8);
    let config = knit.get_config();
    assert!(!config.is_xlang());
    assert!(!config.is_compress_string());
    assert!(!config.is_track_ref());
    assert_eq!(config.max_depth(), 8);
}

#[test]
fn untracked_shared_values_are_duplicated() {
    let shared = Rc::new("shared".to_string());
    let list = vec![shared.clone(), shared];

    let tracked = Knit::default();
    let bytes = tracked.serialize(&list).unwrap();
    let decoded: Vec<Rc<String>> = tracked.deserialize(&bytes).unwrap();
    assert!(Rc::ptr_eq(&decoded[0], &decoded[1]));

    let untracked = Knit::default().track_ref(false);
    let untracked_bytes = untracked.serialize(&list).unwrap();
    assert!(untracked_bytes.len() > bytes.len());
    let decoded: Vec<Rc<String>> = untracked.deserialize(&untracked_bytes).unwrap();
    assert!(!Rc::ptr_eq(&decoded[0], &decoded[1]));
    assert_eq!(*decoded[0], "shared");
    assert_eq!(*decoded[1], "shared");

    // a tracking reader accepts untracked messages
    let decoded: Vec<Rc<String>> = tracked.deserialize(&untracked_bytes).unwrap();
    assert_eq!(decoded.len(), 2);
}

#[test]
fn untracked_cycle_fails_with_depth_error() {
    let knit = with_links(Knit::default().track_ref(false));
    let head = chain(2);
    let tail = head.borrow().next.clone().unwrap();
    tail.borrow_mut().next = Some(head.clone());

    let err = knit.serialize(&head).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)));
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);

    // the same cycle round-trips once tracking is on
    let tracked = with_links(Knit::default());
    let bytes = tracked.serialize(&head).unwrap();
    let decoded: Rc<RefCell<Link>> = tracked.deserialize(&bytes).unwrap();
    let decoded_tail = decoded.borrow().next.clone().unwrap();
    let back = decoded_tail.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&back, &decoded));

    tail.borrow_mut().next = None;
    decoded_tail.borrow_mut().next = None;
}

#[test]
fn untracked_chain_round_trips() {
    let knit = with_links(Knit::default().track_ref(false));
    let head = chain(10);
    let bytes = knit.serialize(&head).unwrap();
    let decoded: Rc<RefCell<Link>> = knit.deserialize(&bytes).unwrap();
    assert_eq!(values(&decoded), (0..10).collect::<Vec<i32>>());
}

#[test]
fn max_depth_bounds_writes_and_reads() {
    let nested = vec![vec![vec![1i32, 2], vec![3]], vec![]];
    let shallow = Knit::default().max_depth(2);
    let err = shallow.serialize(&nested).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)));

    let deep = Knit::default().max_depth(8);
    let bytes = deep.serialize(&nested).unwrap();
    assert_eq!(deep.deserialize::<Vec<Vec<Vec<i32>>>>(&bytes).unwrap(), nested);
    let err = shallow
        .deserialize::<Vec<Vec<Vec<i32>>>>(&bytes)
        .unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)));

    let links = with_links(Knit::default().max_depth(5));
    assert!(links.serialize(&chain(20)).is_err());
    assert!(links.deep_copy(&chain(20)).is_err());
    assert!(with_links(Knit::default()).deep_copy(&chain(20)).is_ok());
}

#[test]
fn deep_copy_ignores_tracking_setting() {
    let knit = with_links(Knit::default().track_ref(false));
    let shared = Rc::new(RefCell::new(Link::default()));
    let pair = vec![shared.clone(), shared];
    let copy = knit.deep_copy(&pair).unwrap();
    assert!(Rc::ptr_eq(&copy[0], &copy[1]));
}
