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

//! `Mutex<T>` is transparent on the wire. The lock is held for the whole write of the
//! inner value, so a concurrently mutated value is captured as one consistent snapshot.

use crate::error::Error;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::type_resolver::TypeResolver;
use crate::serializer::Serializer;
use std::sync::{Mutex, MutexGuard};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error> {
    mutex.lock().map_err(|_| {
        Error::unsupported_operation(format!(
            "Mutex<{}> is poisoned",
            std::any::type_name::<T>()
        ))
    })
}

impl<T: Serializer + Default> Serializer for Mutex<T> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        let guard = lock(self)?;
        T::knit_write_data(&*guard, context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        Ok(Mutex::new(T::knit_read_data(context)?))
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        let guard = lock(self)?;
        Ok(Mutex::new(T::knit_copy(&*guard, context)?))
    }

    fn knit_write_type_info(context: &mut WriteContext) -> Result<(), Error> {
        T::knit_write_type_info(context)
    }

    fn knit_read_type_info(context: &mut ReadContext) -> Result<(), Error> {
        T::knit_read_type_info(context)
    }

    fn knit_get_type_id(type_resolver: &TypeResolver) -> Result<u32, Error> {
        T::knit_get_type_id(type_resolver)
    }

    fn knit_is_fillable() -> bool {
        true
    }

    fn knit_new_shell() -> Result<Self, Error> {
        Ok(Mutex::new(T::default()))
    }

    fn knit_fill(&self, value: Self) -> Result<(), Error> {
        let inner = value
            .into_inner()
            .map_err(|_| Error::unsupported_operation("cannot fill from a poisoned Mutex"))?;
        *lock(self)? = inner;
        Ok(())
    }
}
