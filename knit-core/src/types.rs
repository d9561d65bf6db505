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
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i8)]
pub enum RefFlag {
    Null = -3,
    // Back-reference: the value was written earlier, an id follows.
    Ref = -2,
    // A non-null value that is not tracked for identity.
    NotNullValue = -1,
    // First occurrence of a tracked value; the payload follows.
    RefValue = 0,
}

impl RefFlag {
    #[inline]
    pub fn from_byte(flag: i8) -> Result<RefFlag, Error> {
        RefFlag::try_from(flag).map_err(|_| Error::invalid_ref(format!("Invalid ref flag: {flag}")))
    }
}

/// Built-in type ids. These values are shared by every language binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u32)]
pub enum TypeId {
    BOOL = 1,
    INT8 = 2,
    INT16 = 3,
    INT32 = 4,
    VAR_INT32 = 5,
    INT64 = 6,
    VAR_INT64 = 7,
    FLOAT32 = 10,
    FLOAT64 = 11,
    STRING = 12,
    EXT = 19,
    NAMED_EXT = 20,
    LIST = 21,
    SET = 22,
    MAP = 23,
    TIMESTAMP = 25,
    LOCAL_DATE = 26,
    BINARY = 28,
    U8 = 64,
    U16 = 65,
    U32 = 66,
    U64 = 67,
    UNKNOWN = 74,
    // A set carrying its comparator between the count and the elements.
    SORTED_SET = 75,
}

pub const BOOL: u32 = TypeId::BOOL as u32;
pub const INT8: u32 = TypeId::INT8 as u32;
pub const INT16: u32 = TypeId::INT16 as u32;
pub const VAR_INT32: u32 = TypeId::VAR_INT32 as u32;
pub const VAR_INT64: u32 = TypeId::VAR_INT64 as u32;
pub const FLOAT32: u32 = TypeId::FLOAT32 as u32;
pub const FLOAT64: u32 = TypeId::FLOAT64 as u32;
pub const STRING: u32 = TypeId::STRING as u32;
pub const EXT: u32 = TypeId::EXT as u32;
pub const NAMED_EXT: u32 = TypeId::NAMED_EXT as u32;
pub const LIST: u32 = TypeId::LIST as u32;
pub const SET: u32 = TypeId::SET as u32;
pub const MAP: u32 = TypeId::MAP as u32;
pub const TIMESTAMP: u32 = TypeId::TIMESTAMP as u32;
pub const LOCAL_DATE: u32 = TypeId::LOCAL_DATE as u32;
pub const BINARY: u32 = TypeId::BINARY as u32;
pub const U8: u32 = TypeId::U8 as u32;
pub const U16: u32 = TypeId::U16 as u32;
pub const U32: u32 = TypeId::U32 as u32;
pub const U64: u32 = TypeId::U64 as u32;
pub const UNKNOWN: u32 = TypeId::UNKNOWN as u32;
pub const SORTED_SET: u32 = TypeId::SORTED_SET as u32;

/// Ids below this bound are reserved for built-in types.
pub const MAX_INTERNAL_TYPE_ID: u32 = 0xff;

/// Composes the wire id of a user type registered under `user_id`.
#[inline]
pub const fn user_type_id(user_id: u32) -> u32 {
    (user_id << 8) | EXT
}

#[inline]
pub const fn internal_type_id(type_id: u32) -> u32 {
    type_id & 0xff
}

#[inline]
pub const fn is_named_type(type_id: u32) -> bool {
    internal_type_id(type_id) == NAMED_EXT
}

pub mod config_flags {
    pub const IS_LITTLE_ENDIAN_FLAG: u8 = 1 << 1;
    pub const IS_CROSS_LANGUAGE_FLAG: u8 = 1 << 2;
}

/// Bits of the header byte written in front of collection elements and map entries.
pub mod collection_flags {
    /// Elements are shared pointers that carry their own ref flags.
    pub const TRACKING_REF: u8 = 0b1;
    /// Some elements are null; each element is prefixed with a null flag.
    pub const HAS_NULL: u8 = 0b10;
    /// The element type info is written once, before the elements.
    pub const DECL_ELEMENT_TYPE: u8 = 0b100;
}

pub const MAGIC_NUMBER: u16 = 0x6b6e;
