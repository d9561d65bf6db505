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

/// Engine configuration, shared read-only by every write, read and copy session.
#[derive(Clone, Debug)]
pub struct Config {
    /// Whether the message is flagged as cross-language in the header.
    pub xlang: bool,
    /// Write Latin-1 or UTF-8 strings; `false` falls back to UTF-16 for non Latin-1 text.
    pub compress_string: bool,
    /// Whether shared pointers are tracked by identity.
    /// When disabled every occurrence is written by value, so cycles fail with a
    /// depth error instead of round-tripping.
    pub track_ref: bool,
    /// Maximum nesting depth of values in one session.
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            xlang: true,
            compress_string: true,
            track_ref: true,
            max_depth: 64,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn is_xlang(&self) -> bool {
        self.xlang
    }

    #[inline(always)]
    pub fn is_compress_string(&self) -> bool {
        self.compress_string
    }

    #[inline(always)]
    pub fn is_track_ref(&self) -> bool {
        self.track_ref
    }

    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}
