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

//! Polymorphic values. A `Box<dyn Any>` carries its own type info in front of its
//! data and is dispatched through the serializer registered for the concrete type.

use crate::error::Error;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::type_resolver::{TypeInfo, TypeResolver};
use crate::serializer::Serializer;
use crate::types;
use std::any::Any;
use std::sync::Arc;

/// Writes the runtime type info of `value` followed by its data.
pub(crate) fn write_any(value: &dyn Any, context: &mut WriteContext) -> Result<(), Error> {
    let type_info = context.write_any_type_info(value.type_id())?;
    context.inc_depth()?;
    type_info.get_serializer().write_data(value, context)?;
    context.dec_depth();
    Ok(())
}

/// Reads a value written by [`write_any`], returning the resolved type as well.
pub(crate) fn read_any<'a>(
    context: &mut ReadContext<'a>,
) -> Result<(&'a Arc<TypeInfo>, Box<dyn Any>), Error> {
    let type_info = context.read_any_type_info()?;
    context.inc_depth()?;
    let value = type_info.get_serializer().read_data(context)?;
    context.dec_depth();
    Ok((type_info, value))
}

impl Serializer for Box<dyn Any> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_any(&**self, context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        Ok(read_any(context)?.1)
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        let value: &dyn Any = &**self;
        let type_info = context.get_type_resolver().get_type_info(&value.type_id())?;
        type_info.get_serializer().copy(value, context)
    }

    /// Type info travels with the data, see `knit_write_data`.
    fn knit_write_type_info(_: &mut WriteContext) -> Result<(), Error> {
        Ok(())
    }

    fn knit_read_type_info(_: &mut ReadContext) -> Result<(), Error> {
        Ok(())
    }

    fn knit_get_type_id(_: &TypeResolver) -> Result<u32, Error> {
        Ok(types::UNKNOWN)
    }

    fn knit_type_id_dyn(&self, type_resolver: &TypeResolver) -> Result<u32, Error> {
        let value: &dyn Any = &**self;
        type_resolver.get_type_id(&value.type_id())
    }

    fn knit_is_polymorphic() -> bool {
        true
    }
}
