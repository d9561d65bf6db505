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
use crate::serializer::collection::{read_map_data, write_map_data, FromMapContainer};
use crate::serializer::Serializer;
use crate::types;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

impl<K: Serializer + Eq + Hash, V: Serializer> Serializer for HashMap<K, V> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_map_data(self.iter(), self.len(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        HashMap::from_container(read_map_data(context)?)
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        self.iter()
            .map(|(k, v)| -> Result<(K, V), Error> {
                Ok((k.knit_copy(context)?, v.knit_copy(context)?))
            })
            .collect()
    }

    builtin_type_info!(types::MAP);
}

impl<K: Serializer + Ord, V: Serializer> Serializer for BTreeMap<K, V> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_map_data(self.iter(), self.len(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        BTreeMap::from_container(read_map_data(context)?)
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        self.iter()
            .map(|(k, v)| -> Result<(K, V), Error> {
                Ok((k.knit_copy(context)?, v.knit_copy(context)?))
            })
            .collect()
    }

    builtin_type_info!(types::MAP);
}
