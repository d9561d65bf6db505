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

//! Error type shared by every layer of the engine.
//!
//! Error constructors sit on the error path of every buffer read and type check, so
//! they are `#[cold]` and `#[track_caller]`: the hot paths stay small and, with
//! `KNIT_PANIC_ON_ERROR` set at compile time, the panic points at the exact creation
//! site.

use std::borrow::Cow;

use thiserror::Error;

/// Set `KNIT_PANIC_ON_ERROR=1` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("KNIT_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Coarse classification of an [`Error`], used by callers that decide how to react
/// (drop the message, report a bug, skip an adapter) without matching every variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No serializer can be resolved for a value's type.
    UnsupportedType,
    /// A decoded structural invariant does not hold. Fatal to the current read.
    CorruptStream,
    /// The value cannot support the requested operation.
    UnsupportedOperation,
    /// A low-level handle needed by an adapter serializer is unavailable.
    PlatformAccessFailure,
    /// Errors raised by user code plugged into the engine.
    Other,
}

/// Error type for serialization, deserialization and deep copy.
///
/// Always build errors through the static constructor functions
/// (`Error::invalid_data(..)`, `Error::unsupported_type(..)`, ...) rather than the
/// variants directly: the constructors convert messages into `Cow<'static, str>` and
/// honor `KNIT_PANIC_ON_ERROR`.
///
/// ```rust
/// use knit_core::error::{Error, ErrorKind};
///
/// let err = Error::invalid_ref("ref id 3 is not populated yet");
/// assert_eq!(err.kind(), ErrorKind::CorruptStream);
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Local and remote type ids differ.
    #[error("Type mismatch: local = {0}, remote = {1}")]
    TypeMismatch(u32, u32),

    /// A read would run past the end of the buffer.
    #[error("Buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    #[error("{0}")]
    EncodeError(Cow<'static, str>),

    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    #[error("{0}")]
    EncodingError(Cow<'static, str>),

    #[error("{0}")]
    UnsupportedType(Cow<'static, str>),

    #[error("{0}")]
    UnsupportedOperation(Cow<'static, str>),

    #[error("{0}")]
    PlatformAccess(Cow<'static, str>),

    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

macro_rules! cold_constructor {
    ($(#[$meta:meta])* $name:ident => $variant:ident) => {
        $(#[$meta])*
        #[inline(always)]
        #[cold]
        #[track_caller]
        pub fn $name<S: Into<Cow<'static, str>>>(s: S) -> Self {
            let err = Error::$variant(s.into());
            if PANIC_ON_ERROR {
                panic!("KNIT_PANIC_ON_ERROR: {}", err);
            }
            err
        }
    };
}

impl Error {
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_mismatch(local: u32, remote: u32) -> Self {
        let err = Error::TypeMismatch(local, remote);
        if PANIC_ON_ERROR {
            panic!("KNIT_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::BufferOutOfBound(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("KNIT_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    cold_constructor!(
        /// Failure while producing bytes, e.g. a meta string with unsupported characters.
        encode_error => EncodeError
    );
    cold_constructor!(
        /// Malformed or corrupted input.
        invalid_data => InvalidData
    );
    cold_constructor!(
        /// A reference flag or reference id that cannot be resolved.
        invalid_ref => InvalidRef
    );
    cold_constructor!(encoding_error => EncodingError);
    cold_constructor!(
        /// No serializer is registered for the type.
        unsupported_type => UnsupportedType
    );
    cold_constructor!(unsupported_operation => UnsupportedOperation);
    cold_constructor!(
        /// An internal accessor required by an adapter could not be obtained.
        platform_access => PlatformAccess
    );
    cold_constructor!(depth_exceed => DepthExceed);

    /// Projects this error onto the engine's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TypeMismatch(..) | Error::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Error::BufferOutOfBound(..)
            | Error::InvalidData(_)
            | Error::InvalidRef(_)
            | Error::EncodingError(_) => ErrorKind::CorruptStream,
            Error::EncodeError(_) | Error::UnsupportedOperation(_) | Error::DepthExceed(_) => {
                ErrorKind::UnsupportedOperation
            }
            Error::PlatformAccess(_) => ErrorKind::PlatformAccessFailure,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Appends the Rust type name to a type error, to make unsupported types easy to spot.
    #[inline(never)]
    pub fn with_type_name<T: ?Sized + 'static>(err: Error) -> Error {
        match err {
            Error::UnsupportedType(s) => Error::UnsupportedType(
                format!("{s} (type: {})", std::any::type_name::<T>()).into(),
            ),
            other => other,
        }
    }
}

/// Returns early with the given error when the condition does not hold.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an `InvalidData` error.
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}
