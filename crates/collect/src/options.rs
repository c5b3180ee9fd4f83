// Copyright (C) 2024-present The FlowSift Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// How to move `macAddress` and `ipv6Address` octets into their
/// slots.
///
/// RFC 5101's wording reads as if addresses were integers and thus
/// subject to byte swapping; deployed exporters emit them as plain
/// octet sequences. The default follows deployed practice.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum AddressByteOrder {
    /// Copy the octets as they appear on the wire.
    #[default]
    Verbatim,
    /// Treat the address as a big-endian integer and byte-reverse it
    /// on little-endian hosts (the RFC-literal reading).
    SwappedAsInteger,
}

/// Which placement template wins when several match a wire template.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// The earliest registered matching template.
    #[default]
    FirstRegistered,
    /// The matching template binding the most elements; registration
    /// order breaks ties.
    MostFieldsMatched,
}

/// Decoder configuration.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DecodeOptions {
    pub address_byte_order: AddressByteOrder,
    pub match_policy: MatchPolicy,
    /// Keep `(wire template, placement)` match results (and their
    /// compiled plans) across data sets. Disable to re-evaluate the
    /// match on every data set, e.g. when diagnosing match policy.
    pub cache_matches: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            address_byte_order: AddressByteOrder::default(),
            match_policy: MatchPolicy::default(),
            cache_matches: true,
        }
    }
}
