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

use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::types::RefFlag;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// Tracks shared references while writing.
///
/// Every shared pointer written with [`RefFlag::RefValue`] gets the next id, keyed by
/// the address of its pointee. Seeing the same address again writes
/// [`RefFlag::Ref`] followed by that id, which is how both sharing and cycles survive
/// a round trip.
///
/// ```rust
/// use knit_core::buffer::Writer;
/// use knit_core::resolver::ref_resolver::RefWriter;
/// use std::rc::Rc;
///
/// let mut ref_writer = RefWriter::new();
/// let mut writer = Writer::default();
/// let rc = Rc::new(42);
///
/// assert!(!ref_writer.try_write_rc_ref(&mut writer, &rc));
/// assert!(ref_writer.try_write_rc_ref(&mut writer, &rc.clone()));
/// ```
#[derive(Default)]
pub struct RefWriter {
    refs: HashMap<usize, u32>,
    next_ref_id: u32,
}

impl RefWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the ref header for the object at `addr`. Returns `true` when a back
    /// reference was written and the payload must be skipped.
    pub fn try_write_ref(&mut self, writer: &mut Writer, addr: usize) -> bool {
        if let Some(&ref_id) = self.refs.get(&addr) {
            writer.write_i8(RefFlag::Ref as i8);
            writer.write_u32(ref_id);
            true
        } else {
            self.refs.insert(addr, self.next_ref_id);
            self.next_ref_id += 1;
            writer.write_i8(RefFlag::RefValue as i8);
            false
        }
    }

    pub fn try_write_rc_ref<T: ?Sized>(&mut self, writer: &mut Writer, rc: &Rc<T>) -> bool {
        self.try_write_ref(writer, Rc::as_ptr(rc) as *const () as usize)
    }

    pub fn try_write_arc_ref<T: ?Sized>(&mut self, writer: &mut Writer, arc: &Arc<T>) -> bool {
        self.try_write_ref(writer, Arc::as_ptr(arc) as *const () as usize)
    }

    pub fn reset(&mut self) {
        self.refs.clear();
        self.next_ref_id = 0;
    }
}

/// Resolves reference ids while reading.
///
/// Ids are assigned in stream order. A slot can be reserved before the object it
/// stands for is complete, so that cycles through interior-mutable containers can be
/// rebuilt: the container is stored as an empty shell, the payload is read (and may
/// point back at the shell), then the shell is filled. A back reference to a slot that
/// is still empty means the stream is corrupt.
#[derive(Default)]
pub struct RefReader {
    refs: Vec<Option<Box<dyn Any>>>,
}

impl RefReader {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn reserve_ref_id(&mut self) -> u32 {
        let ref_id = self.refs.len() as u32;
        self.refs.push(None);
        ref_id
    }

    pub fn store_at(&mut self, ref_id: u32, value: Box<dyn Any>) -> Result<(), Error> {
        match self.refs.get_mut(ref_id as usize) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(Error::invalid_ref(format!(
                "ref id {ref_id} was never reserved"
            ))),
        }
    }

    pub fn store_rc_ref<T: 'static>(&mut self, rc: Rc<T>) -> u32 {
        let ref_id = self.refs.len() as u32;
        self.refs.push(Some(Box::new(rc)));
        ref_id
    }

    pub fn store_arc_ref<T: 'static>(&mut self, arc: Arc<T>) -> u32 {
        let ref_id = self.refs.len() as u32;
        self.refs.push(Some(Box::new(arc)));
        ref_id
    }

    /// Returns the object stored under `ref_id`, downcast to `P`.
    pub fn get<P: Any + Clone>(&self, ref_id: u32) -> Result<P, Error> {
        let slot = self.refs.get(ref_id as usize).ok_or_else(|| {
            Error::invalid_ref(format!(
                "ref id {ref_id} out of range, only {} refs read",
                self.refs.len()
            ))
        })?;
        let value = slot.as_ref().ok_or_else(|| {
            Error::invalid_ref(format!("ref id {ref_id} is not populated yet"))
        })?;
        value.downcast_ref::<P>().cloned().ok_or_else(|| {
            Error::invalid_ref(format!(
                "ref id {ref_id} does not hold a {}",
                std::any::type_name::<P>()
            ))
        })
    }

    pub fn get_rc_ref<T: 'static>(&self, ref_id: u32) -> Result<Rc<T>, Error> {
        self.get::<Rc<T>>(ref_id)
    }

    pub fn get_arc_ref<T: 'static>(&self, ref_id: u32) -> Result<Arc<T>, Error> {
        self.get::<Arc<T>>(ref_id)
    }

    #[inline(always)]
    pub fn read_ref_flag(&self, reader: &mut Reader) -> Result<RefFlag, Error> {
        RefFlag::from_byte(reader.read_i8()?)
    }

    #[inline(always)]
    pub fn read_ref_id(&self, reader: &mut Reader) -> Result<u32, Error> {
        reader.read_u32()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn reset(&mut self) {
        self.refs.clear();
    }
}
