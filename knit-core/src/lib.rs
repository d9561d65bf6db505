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

//! # Knit Core
//!
//! Cross-language object graph serialization, plus a zero-copy row format.
//!
//! ## Architecture
//!
//! - **`knit`**: the engine facade: configuration, registration, serialize,
//!   deserialize and deep copy
//! - **`buffer`**: growable `Writer` and bounds-checked `Reader` with varint encodings
//! - **`meta`**: meta-string encodings for namespaces and type names
//! - **`resolver`**: type registry, reference tables, meta-string tables and the
//!   per-session contexts
//! - **`serializer`**: the `Serializer` trait, built-in serializers, the container
//!   protocol and the immutable, sorted, synchronized and byte-buffer adapters
//! - **`row`**: writers and zero-copy views for binary rows, arrays and maps
//! - **`types`**: wire type ids and flags
//! - **`error`**: the error type and its taxonomy
//!
//! ## Wire format
//!
//! A message is the magic number, a flag byte, then the root value. Every value is
//! written as a reference flag, its type info and its payload. Shared pointers are
//! written once and referenced by id afterwards, so shared and cyclic graphs keep
//! their shape. Type names of name-registered types are written once per message
//! and referenced by a small id afterwards.
//!
//! ```rust
//! use knit_core::Knit;
//! use std::rc::Rc;
//!
//! # fn main() -> Result<(), knit_core::Error> {
//! let knit = Knit::default();
//! let shared = Rc::new("shared".to_string());
//! let bytes = knit.serialize(&vec![shared.clone(), shared])?;
//! let decoded: Vec<Rc<String>> = knit.deserialize(&bytes)?;
//! assert!(Rc::ptr_eq(&decoded[0], &decoded[1]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Row format
//!
//! ```rust
//! use knit_core::buffer::Writer;
//! use knit_core::row::{BinaryRow, RowWriter};
//!
//! # fn main() -> Result<(), knit_core::Error> {
//! let mut writer = Writer::default();
//! let mut row = RowWriter::new(2, &mut writer);
//! row.write_i32(0, 7)?;
//! row.write_str(1, "seven")?;
//! let bytes = writer.dump();
//!
//! let view = BinaryRow::from_bytes(&bytes, 2)?;
//! assert_eq!(view.get_i32(0)?, 7);
//! assert_eq!(view.get_str(1)?, "seven");
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod knit;
pub mod meta;
pub mod resolver;
pub mod row;
pub mod serializer;
pub mod types;

pub use buffer::{Reader, Writer};
pub use config::Config;
pub use error::{Error, ErrorKind};
pub use knit::Knit;
pub use serializer::byte_buffer::{ByteBuffer, Endian};
pub use serializer::immutable::{ImmutableList, ImmutableMap, ImmutableSet};
pub use serializer::sorted::{Comparator, ImmutableSortedSet, ReverseOrder};
pub use serializer::synchronized::{
    AccessorLookup, DeclaredAccessors, InternalAccessor, Synchronized, SynchronizedList,
    SynchronizedMap,
};
pub use serializer::Serializer;
