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
use crate::serializer::Serializer;

impl<T: Serializer> Serializer for Box<T> {
    fn knit_write(
        &self,
        context: &mut WriteContext,
        write_ref_info: bool,
        write_type_info: bool,
    ) -> Result<(), Error> {
        T::knit_write(&**self, context, write_ref_info, write_type_info)
    }

    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        T::knit_write_data(&**self, context)
    }

    fn knit_read(
        context: &mut ReadContext,
        read_ref_info: bool,
        read_type_info: bool,
    ) -> Result<Self, Error> {
        Ok(Box::new(T::knit_read(context, read_ref_info, read_type_info)?))
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        Ok(Box::new(T::knit_read_data(context)?))
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        Ok(Box::new(T::knit_copy(&**self, context)?))
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

    fn knit_is_polymorphic() -> bool {
        T::knit_is_polymorphic()
    }

    fn knit_is_shared_ref() -> bool {
        T::knit_is_shared_ref()
    }
}
