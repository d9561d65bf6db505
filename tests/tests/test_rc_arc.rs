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
use knit_core::{Knit, Serializer};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

#[derive(Default, Debug)]
struct Node {
    name: String,
    children: Vec<Rc<RefCell<Node>>>,
    parent: Option<Rc<RefCell<Node>>>,
}

impl Serializer for Node {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        self.name.knit_write_data(context)?;
        self.children.knit_write_data(context)?;
        self.parent.knit_write(context, true, false)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        Ok(Node {
            name: String::knit_read_data(context)?,
            children: Vec::knit_read_data(context)?,
            parent: Option::knit_read(context, true, false)?,
        })
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        Ok(Node {
            name: self.name.clone(),
            children: self.children.knit_copy(context)?,
            parent: self.parent.knit_copy(context)?,
        })
    }
}

fn knit() -> Knit {
    let mut knit = Knit::default();
    knit.register::<Node>(1).unwrap();
    knit
}

fn tree() -> Rc<RefCell<Node>> {
    let root = Rc::new(RefCell::new(Node {
        name: "root".to_string(),
        ..Default::default()
    }));
    for name in ["left", "right"] {
        let child = Rc::new(RefCell::new(Node {
            name: name.to_string(),
            children: vec![],
            parent: Some(root.clone()),
        }));
        root.borrow_mut().children.push(child);
    }
    root
}

fn break_cycles(node: &Rc<RefCell<Node>>) {
    let children = std::mem::take(&mut node.borrow_mut().children);
    for child in &children {
        child.borrow_mut().parent = None;
        break_cycles(child);
    }
}

#[test]
fn parent_child_cycle_round_trips() {
    let knit = knit();
    let root = tree();
    let bytes = knit.serialize(&root).unwrap();
    let decoded: Rc<RefCell<Node>> = knit.deserialize(&bytes).unwrap();

    {
        let decoded_root = decoded.borrow();
        assert_eq!(decoded_root.name, "root");
        assert!(decoded_root.parent.is_none());
        assert_eq!(decoded_root.children.len(), 2);
        for (child, name) in decoded_root.children.iter().zip(["left", "right"]) {
            let child = child.borrow();
            assert_eq!(child.name, name);
            let parent = child.parent.as_ref().unwrap();
            assert!(Rc::ptr_eq(parent, &decoded));
        }
    }
    break_cycles(&root);
    break_cycles(&decoded);
}

#[test]
fn self_reference_round_trips() {
    let knit = knit();
    let node = Rc::new(RefCell::new(Node {
        name: "loop".to_string(),
        ..Default::default()
    }));
    node.borrow_mut().parent = Some(node.clone());
    let bytes = knit.serialize(&node).unwrap();
    let decoded: Rc<RefCell<Node>> = knit.deserialize(&bytes).unwrap();
    let parent = decoded.borrow().parent.clone().unwrap();
    assert!(Rc::ptr_eq(&parent, &decoded));
    node.borrow_mut().parent = None;
    decoded.borrow_mut().parent = None;
}

#[test]
fn shared_references_keep_identity() {
    let knit = Knit::default();
    let shared = Rc::new("shared".to_string());
    let other = Rc::new("shared".to_string());
    let list = vec![shared.clone(), other, shared];
    let bytes = knit.serialize(&list).unwrap();
    let decoded: Vec<Rc<String>> = knit.deserialize(&bytes).unwrap();
    assert_eq!(decoded.len(), 3);
    assert!(Rc::ptr_eq(&decoded[0], &decoded[2]));
    assert!(!Rc::ptr_eq(&decoded[0], &decoded[1]));
    assert_eq!(*decoded[1], "shared");
}

#[test]
fn shared_arc_in_map_values() {
    let knit = Knit::default();
    let shared = Arc::new(vec![1i64, 2, 3]);
    let mut map = HashMap::new();
    map.insert("a".to_string(), shared.clone());
    map.insert("b".to_string(), shared);
    let bytes = knit.serialize(&map).unwrap();
    let decoded: HashMap<String, Arc<Vec<i64>>> = knit.deserialize(&bytes).unwrap();
    assert_eq!(*decoded["a"], vec![1, 2, 3]);
    assert!(Arc::ptr_eq(&decoded["a"], &decoded["b"]));
}

#[test]
fn arc_mutex_shared_between_containers() {
    let knit = Knit::default();
    let counter = Arc::new(Mutex::new(41i32));
    let pair = (vec![counter.clone()], vec![counter]);
    let bytes = knit.serialize(&vec![pair.0, pair.1]).unwrap();
    let decoded: Vec<Vec<Arc<Mutex<i32>>>> = knit.deserialize(&bytes).unwrap();
    assert!(Arc::ptr_eq(&decoded[0][0], &decoded[1][0]));
    *decoded[0][0].lock().unwrap() += 1;
    assert_eq!(*decoded[1][0].lock().unwrap(), 42);
}

#[test]
fn deep_copy_preserves_cycle_and_sharing() {
    let knit = knit();
    let root = tree();
    let copy = knit.deep_copy(&root).unwrap();
    assert!(!Rc::ptr_eq(&root, &copy));
    {
        let copy_root = copy.borrow();
        assert_eq!(copy_root.children.len(), 2);
        for child in &copy_root.children {
            let parent = child.borrow().parent.clone().unwrap();
            assert!(Rc::ptr_eq(&parent, &copy));
        }
    }
    break_cycles(&root);
    break_cycles(&copy);

    let shared = Rc::new(3u32);
    let copied = knit.deep_copy(&vec![shared.clone(), shared.clone()]).unwrap();
    assert!(Rc::ptr_eq(&copied[0], &copied[1]));
    assert!(!Rc::ptr_eq(&copied[0], &shared));
}

#[test]
fn unregistered_node_is_unsupported() {
    let knit = Knit::default();
    let root = tree();
    let err = knit.serialize(&root).unwrap_err();
    assert_eq!(err.kind(), knit_core::ErrorKind::UnsupportedType);
    break_cycles(&root);
}

#[test]
fn shared_pointers_behind_dyn_any_keep_identity() {
    let mut knit = Knit::default();
    knit.register::<Rc<String>>(2).unwrap();
    knit.register::<Arc<Mutex<i64>>>(3).unwrap();

    let text = Rc::new("shared".to_string());
    let counter = Arc::new(Mutex::new(5i64));
    let values: Vec<Box<dyn Any>> = vec![
        Box::new(text.clone()),
        Box::new(counter.clone()),
        Box::new(text.clone()),
        Box::new(counter.clone()),
    ];
    let bytes = knit.serialize(&values).unwrap();
    let decoded: Vec<Box<dyn Any>> = knit.deserialize(&bytes).unwrap();
    let first = decoded[0].downcast_ref::<Rc<String>>().unwrap();
    let second = decoded[2].downcast_ref::<Rc<String>>().unwrap();
    assert_eq!(first.as_str(), "shared");
    assert!(Rc::ptr_eq(first, second));
    let first = decoded[1].downcast_ref::<Arc<Mutex<i64>>>().unwrap();
    let second = decoded[3].downcast_ref::<Arc<Mutex<i64>>>().unwrap();
    assert!(Arc::ptr_eq(first, second));
    assert_eq!(*first.lock().unwrap(), 5);

    let copy = knit.deep_copy(&values).unwrap();
    let first = copy[0].downcast_ref::<Rc<String>>().unwrap();
    let second = copy[2].downcast_ref::<Rc<String>>().unwrap();
    assert!(Rc::ptr_eq(first, second));
    assert!(!Rc::ptr_eq(first, &text));
}

#[test]
fn untracked_shared_pointers_behind_dyn_any_are_duplicated() {
    let mut knit = Knit::default().track_ref(false);
    knit.register::<Rc<String>>(2).unwrap();
    let text = Rc::new("copy".to_string());
    let values: Vec<Box<dyn Any>> = vec![Box::new(text.clone()), Box::new(text)];
    let bytes = knit.serialize(&values).unwrap();
    let decoded: Vec<Box<dyn Any>> = knit.deserialize(&bytes).unwrap();
    let first = decoded[0].downcast_ref::<Rc<String>>().unwrap();
    let second = decoded[1].downcast_ref::<Rc<String>>().unwrap();
    assert_eq!(first, second);
    assert!(!Rc::ptr_eq(first, second));
}
