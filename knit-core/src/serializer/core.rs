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

use crate::error::Error;
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::type_resolver::TypeResolver;
use crate::types::RefFlag;
use std::any::Any;

/// Per-type strategy for writing, reading and deep-copying values.
///
/// Only [`knit_write_data`](Serializer::knit_write_data),
/// [`knit_read_data`](Serializer::knit_read_data) and
/// [`knit_copy`](Serializer::knit_copy) must be implemented. User types additionally
/// have to be registered on the engine so that their type id can be resolved.
pub trait Serializer: Sized + 'static {
    /// Entry point of the serialization.
    ///
    /// * `write_ref_info` - write the reference/null flag before the value.
    /// * `write_type_info` - write the type info before the value.
    ///
    /// Serializers for `Option`, shared pointers and polymorphic values override this.
    fn knit_write(
        &self,
        context: &mut WriteContext,
        write_ref_info: bool,
        write_type_info: bool,
    ) -> Result<(), Error> {
        if write_ref_info {
            context.writer.write_i8(RefFlag::NotNullValue as i8);
        }
        if write_type_info {
            Self::knit_write_type_info(context)?;
        }
        self.knit_write_data(context)
    }

    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error>;

    #[inline(always)]
    fn knit_write_type_info(context: &mut WriteContext) -> Result<(), Error> {
        context.write_any_type_info(std::any::TypeId::of::<Self>())?;
        Ok(())
    }

    /// Entry point of deserialization, mirroring [`knit_write`](Serializer::knit_write).
    fn knit_read(
        context: &mut ReadContext,
        read_ref_info: bool,
        read_type_info: bool,
    ) -> Result<Self, Error> {
        if read_ref_info {
            match context.ref_reader.read_ref_flag(&mut context.reader)? {
                RefFlag::NotNullValue => {}
                RefFlag::RefValue => {
                    // keeps ids aligned with writers that track every value
                    context.ref_reader.reserve_ref_id();
                }
                RefFlag::Null => {
                    return Err(Error::invalid_data(format!(
                        "null found for non-nullable {}",
                        std::any::type_name::<Self>()
                    )))
                }
                RefFlag::Ref => {
                    return Err(Error::invalid_ref(format!(
                        "back reference found for non-shared {}",
                        std::any::type_name::<Self>()
                    )))
                }
            }
        }
        if read_type_info {
            Self::knit_read_type_info(context)?;
        }
        Self::knit_read_data(context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error>;

    #[inline(always)]
    fn knit_read_type_info(context: &mut ReadContext) -> Result<(), Error> {
        context.read_type_info_of(std::any::TypeId::of::<Self>())
    }

    /// Structural deep copy. Shared pointers inside the value are copied once and
    /// shared the same way in the result.
    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error>;

    /// Wire type id. Built-in types return a constant, user types look themselves up.
    #[inline(always)]
    fn knit_get_type_id(type_resolver: &TypeResolver) -> Result<u32, Error> {
        type_resolver
            .get_type_id(&std::any::TypeId::of::<Self>())
            .map_err(Error::with_type_name::<Self>)
    }

    #[inline(always)]
    fn knit_type_id_dyn(&self, type_resolver: &TypeResolver) -> Result<u32, Error> {
        Self::knit_get_type_id(type_resolver)
    }

    #[inline(always)]
    fn knit_is_option() -> bool {
        false
    }

    #[inline(always)]
    fn knit_is_none(&self) -> bool {
        false
    }

    /// Values whose concrete type is only known at runtime write their own type info
    /// per value instead of once per container.
    #[inline(always)]
    fn knit_is_polymorphic() -> bool {
        false
    }

    #[inline(always)]
    fn knit_is_shared_ref() -> bool {
        false
    }

    /// Whether an empty shell can be built first and filled later, which is what lets
    /// a back reference resolve while the value is still being read.
    #[inline(always)]
    fn knit_is_fillable() -> bool {
        false
    }

    fn knit_new_shell() -> Result<Self, Error> {
        Err(Error::unsupported_operation(format!(
            "{} cannot be created as an empty shell",
            std::any::type_name::<Self>()
        )))
    }

    #[allow(unused_variables)]
    fn knit_fill(&self, value: Self) -> Result<(), Error> {
        Err(Error::unsupported_operation(format!(
            "{} cannot be filled in place",
            std::any::type_name::<Self>()
        )))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
