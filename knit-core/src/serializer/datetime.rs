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
use crate::serializer::Serializer;
use crate::types;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};

pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    None => panic!("Unreachable code"),
    Some(epoch) => epoch,
};

/// Microseconds since the unix epoch, as a fixed-width i64.
impl Serializer for NaiveDateTime {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        context.writer.write_i64(self.and_utc().timestamp_micros());
        Ok(())
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        let micros = context.reader.read_i64()?;
        DateTime::from_timestamp_micros(micros)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::invalid_data(format!("timestamp {micros} is out of range")))
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(*self)
    }

    builtin_type_info!(types::TIMESTAMP);
}

/// Days since the unix epoch, as a fixed-width i32.
impl Serializer for NaiveDate {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        let days = self.signed_duration_since(EPOCH).num_days();
        let days = i32::try_from(days)
            .map_err(|_| Error::encode_error(format!("date {self} is out of range")))?;
        context.writer.write_i32(days);
        Ok(())
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        let days = context.reader.read_i32()?;
        EPOCH
            .checked_add_signed(TimeDelta::days(days as i64))
            .ok_or_else(|| Error::invalid_data(format!("date {days} days from epoch is out of range")))
    }

    fn knit_copy(&self, _: &mut CopyContext) -> Result<Self, Error> {
        Ok(*self)
    }

    builtin_type_info!(types::LOCAL_DATE);
}
