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

/// Type-info methods of a built-in type with a fixed wire id.
macro_rules! builtin_type_info {
    ($type_id:expr) => {
        #[inline(always)]
        fn knit_get_type_id(
            _: &$crate::resolver::type_resolver::TypeResolver,
        ) -> Result<u32, $crate::error::Error> {
            Ok($type_id)
        }

        #[inline(always)]
        fn knit_write_type_info(
            context: &mut $crate::resolver::context::WriteContext,
        ) -> Result<(), $crate::error::Error> {
            context.writer.write_varuint32($type_id);
            Ok(())
        }

        #[inline(always)]
        fn knit_read_type_info(
            context: &mut $crate::resolver::context::ReadContext,
        ) -> Result<(), $crate::error::Error> {
            context.check_type_id($type_id)
        }
    };
}

/// `Serializer` for a reference-counted pointer (`Rc` or `Arc`).
///
/// The first occurrence of a pointee is written as `RefValue` plus its data and later
/// ones as `Ref` plus the id. Reading a `RefValue` reserves the id before the data is
/// read; fillable pointees are published as an empty shell first so back references
/// met while reading their data resolve to the same allocation.
macro_rules! shared_ptr_serializer {
    ($ptr:ident) => {
        impl<T: Serializer> Serializer for $ptr<T> {
            fn knit_write(
                &self,
                context: &mut WriteContext,
                write_ref_info: bool,
                write_type_info: bool,
            ) -> Result<(), Error> {
                let addr = $ptr::as_ptr(self) as *const () as usize;
                let tracked = write_ref_info && context.is_track_ref();
                if tracked {
                    if context.ref_writer.try_write_ref(context.writer, addr) {
                        return Ok(());
                    }
                } else if write_ref_info {
                    context.writer.write_i8(RefFlag::NotNullValue as i8);
                }
                if write_type_info {
                    T::knit_write_type_info(context)?;
                }
                if !tracked {
                    context.enter_untracked(addr)?;
                }
                context.inc_depth()?;
                T::knit_write_data(&**self, context)?;
                context.dec_depth();
                if !tracked {
                    context.leave_untracked();
                }
                Ok(())
            }

            fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
                T::knit_write_data(&**self, context)
            }

            fn knit_read(
                context: &mut ReadContext,
                read_ref_info: bool,
                read_type_info: bool,
            ) -> Result<Self, Error> {
                let ref_flag = if read_ref_info {
                    context.ref_reader.read_ref_flag(&mut context.reader)?
                } else {
                    RefFlag::NotNullValue
                };
                match ref_flag {
                    RefFlag::Null => Err(Error::invalid_data(format!(
                        "null found for non-nullable {}",
                        std::any::type_name::<Self>()
                    ))),
                    RefFlag::Ref => {
                        let ref_id = context.ref_reader.read_ref_id(&mut context.reader)?;
                        context.ref_reader.get::<$ptr<T>>(ref_id)
                    }
                    RefFlag::NotNullValue => {
                        if read_type_info {
                            T::knit_read_type_info(context)?;
                        }
                        context.inc_depth()?;
                        let value = T::knit_read_data(context)?;
                        context.dec_depth();
                        Ok($ptr::new(value))
                    }
                    RefFlag::RefValue => {
                        let ref_id = context.ref_reader.reserve_ref_id();
                        if read_type_info {
                            T::knit_read_type_info(context)?;
                        }
                        context.inc_depth()?;
                        let ptr = if T::knit_is_fillable() {
                            let ptr = $ptr::new(T::knit_new_shell()?);
                            context.ref_reader.store_at(ref_id, Box::new(ptr.clone()))?;
                            let value = T::knit_read_data(context)?;
                            T::knit_fill(&ptr, value)?;
                            ptr
                        } else {
                            let ptr = $ptr::new(T::knit_read_data(context)?);
                            context.ref_reader.store_at(ref_id, Box::new(ptr.clone()))?;
                            ptr
                        };
                        context.dec_depth();
                        Ok(ptr)
                    }
                }
            }

            fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
                Ok($ptr::new(T::knit_read_data(context)?))
            }

            fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
                let addr = $ptr::as_ptr(self) as *const () as usize;
                if let Some(copied) = context.get_copied::<$ptr<T>>(addr) {
                    return Ok(copied);
                }
                context.inc_depth()?;
                let copied = if T::knit_is_fillable() {
                    let copied = $ptr::new(T::knit_new_shell()?);
                    context.store_copied(addr, Box::new(copied.clone()));
                    let value = T::knit_copy(&**self, context)?;
                    T::knit_fill(&copied, value)?;
                    copied
                } else {
                    let copied = $ptr::new(T::knit_copy(&**self, context)?);
                    context.store_copied(addr, Box::new(copied.clone()));
                    copied
                };
                context.dec_depth();
                Ok(copied)
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

            fn knit_type_id_dyn(&self, type_resolver: &TypeResolver) -> Result<u32, Error> {
                T::knit_type_id_dyn(&**self, type_resolver)
            }

            fn knit_is_polymorphic() -> bool {
                T::knit_is_polymorphic()
            }

            fn knit_is_shared_ref() -> bool {
                true
            }
        }
    };
}

pub(crate) mod any;
mod arc;
mod box_;
pub mod byte_buffer;
pub mod collection;
mod core;
mod datetime;
pub mod immutable;
mod list;
mod map;
pub(crate) mod mutex;
mod number;
mod option;
mod rc;
mod refcell;
mod set;
pub mod sorted;
mod string;
pub mod synchronized;

pub use core::Serializer;
