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

use knit_core::error::Error;
use knit_core::{ErrorKind, ImmutableSortedSet, Knit, ReverseOrder, Writer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

fn sample() -> HashMap<String, Vec<i64>> {
    let mut map = HashMap::new();
    map.insert("primes".to_string(), vec![2, 3, 5, 7, 11]);
    map.insert("large".to_string(), vec![i64::MAX, i64::MIN]);
    map.insert("none".to_string(), vec![]);
    map
}

#[test]
fn error_kinds() {
    assert_eq!(
        Error::type_mismatch(1, 2).kind(),
        ErrorKind::UnsupportedType
    );
    assert_eq!(
        Error::unsupported_type("x").kind(),
        ErrorKind::UnsupportedType
    );
    assert_eq!(
        Error::buffer_out_of_bound(0, 4, 2).kind(),
        ErrorKind::CorruptStream
    );
    assert_eq!(Error::invalid_data("x").kind(), ErrorKind::CorruptStream);
    assert_eq!(Error::invalid_ref("x").kind(), ErrorKind::CorruptStream);
    assert_eq!(Error::encoding_error("x").kind(), ErrorKind::CorruptStream);
    assert_eq!(
        Error::unsupported_operation("x").kind(),
        ErrorKind::UnsupportedOperation
    );
    assert_eq!(
        Error::depth_exceed("x").kind(),
        ErrorKind::UnsupportedOperation
    );
    assert_eq!(
        Error::platform_access("x").kind(),
        ErrorKind::PlatformAccessFailure
    );
    let other: Error = anyhow::anyhow!("plugged in code failed").into();
    assert_eq!(other.kind(), ErrorKind::Other);
}

#[test]
fn error_messages() {
    assert_eq!(
        Error::type_mismatch(5, 12).to_string(),
        "Type mismatch: local = 5, remote = 12"
    );
    assert_eq!(
        Error::buffer_out_of_bound(8, 4, 10).to_string(),
        "Buffer out of bound: 8 + 4 > 10"
    );
    assert_eq!(Error::invalid_data("broken").to_string(), "broken");
    let named = Error::with_type_name::<Vec<u8>>(Error::unsupported_type("missing"));
    assert!(named.to_string().contains("Vec<u8>"));
    let untouched = Error::with_type_name::<u8>(Error::invalid_data("bad"));
    assert_eq!(untouched.to_string(), "bad");
}

#[test]
fn bad_magic_number() {
    let knit = Knit::default();
    let mut bytes = knit.serialize(&sample()).unwrap();
    bytes[0] ^= 0xff;
    let err = knit.deserialize::<HashMap<String, Vec<i64>>>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}

#[test]
fn big_endian_producer_is_unsupported() {
    let knit = Knit::default();
    let mut bytes = knit.serialize(&1i32).unwrap();
    bytes[2] &= !0b10;
    let err = knit.deserialize::<i32>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}

#[test]
fn cross_language_bit_must_match() {
    let xlang = Knit::default();
    let native = Knit::default().xlang(false);
    let bytes = xlang.serialize(&7i32).unwrap();
    assert_eq!(
        native.deserialize::<i32>(&bytes).unwrap_err().kind(),
        ErrorKind::CorruptStream
    );
    let bytes = native.serialize(&7i32).unwrap();
    assert_eq!(native.deserialize::<i32>(&bytes).unwrap(), 7);
    assert!(xlang.deserialize::<i32>(&bytes).is_err());
}

#[test]
fn trailing_bytes_are_rejected() {
    let knit = Knit::default();
    let mut bytes = knit.serialize(&sample()).unwrap();
    bytes.push(0);
    let err = knit.deserialize::<HashMap<String, Vec<i64>>>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}

#[test]
fn every_truncation_fails() {
    let knit = Knit::default();
    let bytes = knit.serialize(&sample()).unwrap();
    for len in 0..bytes.len() {
        let err = knit
            .deserialize::<HashMap<String, Vec<i64>>>(&bytes[..len])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream, "prefix of {len} bytes");
    }
}

#[test]
fn type_mismatch_at_root() {
    let knit = Knit::default();
    let bytes = knit.serialize(&1i32).unwrap();
    let err = knit.deserialize::<String>(&bytes).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(..)));
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);

    let bytes = knit.serialize(&vec![1i32]).unwrap();
    assert!(knit.deserialize::<Vec<String>>(&bytes).is_err());
    assert!(knit.deserialize::<HashMap<i32, i32>>(&bytes).is_err());
}

#[test]
fn invalid_ref_flag() {
    let knit = Knit::default();
    let mut bytes = knit.serialize(&"x".to_string()).unwrap();
    bytes[3] = 5;
    let err = knit.deserialize::<String>(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}

#[test]
fn dangling_back_reference() {
    let knit = Knit::default();
    let mut bytes = knit.serialize(&Rc::new("x".to_string())).unwrap();
    bytes.truncate(3);
    bytes.push(-2i8 as u8);
    bytes.extend_from_slice(&5u32.to_le_bytes());
    let err = knit.deserialize::<Rc<String>>(&bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidRef(_)));
}

#[test]
fn random_payloads_never_panic() {
    let knit = Knit::default();
    let valid = knit.serialize(&sample()).unwrap();
    let mut rng = StdRng::seed_from_u64(0x6b6e);
    for _ in 0..2000 {
        let mut bytes = valid.clone();
        let flips = rng.gen_range(1..4);
        for _ in 0..flips {
            let at = rng.gen_range(3..bytes.len());
            bytes[at] = rng.gen();
        }
        let _ = knit.deserialize::<HashMap<String, Vec<i64>>>(&bytes);
    }
}

#[test]
fn failed_serialize_to_leaves_writer_untouched() {
    let knit = Knit::default();
    let mut writer = Writer::default();
    let first = knit.serialize_to(&vec![1, 2, 3], &mut writer).unwrap();
    assert_eq!(writer.len(), first);

    // the comparator fails after the header and the count are written
    let set = ImmutableSortedSet::with_comparator(vec![4, 5], Arc::new(ReverseOrder));
    let err = knit.serialize_to(&set, &mut writer).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    assert_eq!(writer.len(), first);

    let second = knit.serialize_to(&vec![4], &mut writer).unwrap();
    let bytes = writer.dump();
    assert_eq!(bytes.len(), first + second);
    assert_eq!(
        knit.deserialize::<Vec<i32>>(&bytes[..first]).unwrap(),
        vec![1, 2, 3]
    );
    assert_eq!(knit.deserialize::<Vec<i32>>(&bytes[first..]).unwrap(), vec![4]);
}
