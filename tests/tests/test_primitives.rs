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

use chrono::{NaiveDate, NaiveDateTime};
use knit_core::{ErrorKind, Knit, Serializer};
use std::fmt::Debug;

fn round_trip<T: Serializer + PartialEq + Debug>(knit: &Knit, value: T) {
    let bytes = knit.serialize(&value).unwrap();
    assert_eq!(knit.deserialize::<T>(&bytes).unwrap(), value);
}

#[test]
fn numbers() {
    let knit = Knit::default();
    round_trip(&knit, true);
    round_trip(&knit, false);
    for v in [i8::MIN, -1, 0, 1, i8::MAX] {
        round_trip(&knit, v);
    }
    for v in [i16::MIN, -300, 0, 300, i16::MAX] {
        round_trip(&knit, v);
    }
    for v in [i32::MIN, -64, 63, 64, i32::MAX] {
        round_trip(&knit, v);
    }
    for v in [i64::MIN, -(1 << 40), 1 << 40, i64::MAX] {
        round_trip(&knit, v);
    }
    for v in [0u8, 200, u8::MAX] {
        round_trip(&knit, v);
    }
    round_trip(&knit, u16::MAX);
    round_trip(&knit, u32::MAX);
    round_trip(&knit, u64::MAX);
    round_trip(&knit, 2.5f32);
    round_trip(&knit, -0.125f64);
    round_trip(&knit, f64::INFINITY);

    let bytes = knit.serialize(&f64::NAN).unwrap();
    assert!(knit.deserialize::<f64>(&bytes).unwrap().is_nan());
}

#[test]
fn small_ints_are_compact() {
    let knit = Knit::default();
    // header, flag, type id, one varint byte
    assert_eq!(knit.serialize(&1i32).unwrap().len(), 6);
    assert_eq!(knit.serialize(&-1i64).unwrap().len(), 6);
    assert!(knit.serialize(&i64::MAX).unwrap().len() > 6);
}

#[test]
fn strings() {
    let knit = Knit::default();
    let long = "x".repeat(10_000);
    for s in ["", "hello", "café", "日本語", "emoji 🦀", long.as_str()] {
        round_trip(&knit, s.to_string());
    }
}

#[test]
fn utf16_strings_without_compression() {
    let knit = Knit::default().compress_string(false);
    for s in ["plain", "日本語", "emoji 🦀", "mixed é and ж"] {
        round_trip(&knit, s.to_string());
    }
    let compressed = Knit::default().serialize(&"日本語".to_string()).unwrap();
    let utf16 = knit.serialize(&"日本語".to_string()).unwrap();
    // three bytes per char in UTF-8, two in UTF-16
    assert_eq!(compressed.len() - utf16.len(), 3);
    // either side decodes the other's strings
    assert_eq!(
        Knit::default().deserialize::<String>(&utf16).unwrap(),
        "日本語"
    );
}

#[test]
fn latin1_strings_use_one_byte_per_char() {
    let knit = Knit::default();
    let latin = knit.serialize(&"é".repeat(10)).unwrap();
    let ascii = knit.serialize(&"e".repeat(10)).unwrap();
    assert_eq!(latin.len(), ascii.len());
}

#[test]
fn invalid_utf8_is_rejected() {
    let knit = Knit::default();
    let mut bytes = knit.serialize(&"日本".to_string()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] = 0xff;
    let err = knit.deserialize::<String>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}

#[test]
fn dates_and_timestamps() {
    let knit = Knit::default();
    for (y, m, d) in [(1970, 1, 1), (1969, 12, 31), (2024, 2, 29), (1, 1, 1)] {
        round_trip(&knit, NaiveDate::from_ymd_opt(y, m, d).unwrap());
    }
    let ts: NaiveDateTime = NaiveDate::from_ymd_opt(2021, 11, 23)
        .unwrap()
        .and_hms_micro_opt(8, 30, 15, 123_456)
        .unwrap();
    round_trip(&knit, ts);
    let before_epoch = NaiveDate::from_ymd_opt(1950, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 1)
        .unwrap();
    round_trip(&knit, before_epoch);
}

#[test]
fn option_roots() {
    let knit = Knit::default();
    let none: Option<String> = None;
    let bytes = knit.serialize(&none).unwrap();
    assert_eq!(bytes.len(), 4);
    assert_eq!(knit.deserialize::<Option<String>>(&bytes).unwrap(), None);
    assert_eq!(
        knit.deserialize::<String>(&bytes).unwrap_err().kind(),
        ErrorKind::CorruptStream
    );

    round_trip(&knit, Some(7u16));
    let some = knit.serialize(&Some("x".to_string())).unwrap();
    assert_eq!(knit.deserialize::<String>(&some).unwrap(), "x");
}

#[test]
fn deep_copy_primitives() {
    let knit = Knit::default();
    assert_eq!(knit.deep_copy(&"copy".to_string()).unwrap(), "copy");
    assert_eq!(knit.deep_copy(&Some(3i8)).unwrap(), Some(3));
}
