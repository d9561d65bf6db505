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
use crate::serializer::collection::{
    read_collection_data, write_collection_data, FromCollectionContainer,
};
use crate::serializer::Serializer;
use crate::types;
use std::collections::VecDeque;

impl<T: Serializer> Serializer for Vec<T> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_collection_data(self.iter(), self.len(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        Vec::from_container(read_collection_data(context)?)
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        self.iter().map(|e| e.knit_copy(context)).collect()
    }

    builtin_type_info!(types::LIST);
}

impl<T: Serializer> Serializer for VecDeque<T> {
    fn knit_write_data(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_collection_data(self.iter(), self.len(), context)
    }

    fn knit_read_data(context: &mut ReadContext) -> Result<Self, Error> {
        VecDeque::from_container(read_collection_data(context)?)
    }

    fn knit_copy(&self, context: &mut CopyContext) -> Result<Self, Error> {
        self.iter().map(|e| e.knit_copy(context)).collect()
    }

    builtin_type_info!(types::LIST);
}
