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

use crate::VARLEN;

/// Abstract data type of an information element
/// ([RFC 7011](https://datatracker.ietf.org/doc/html/rfc7011),
/// [RFC 5610](https://datatracker.ietf.org/doc/html/rfc5610)).
///
/// The `Display`/`FromStr` forms are the registry names used in
/// IESpec strings, e.g. `unsigned64` or `dateTimeSeconds`.
#[repr(u8)]
#[derive(
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::FromRepr,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
pub enum IEType {
    OctetArray = 0,
    Unsigned8 = 1,
    Unsigned16 = 2,
    Unsigned32 = 3,
    Unsigned64 = 4,
    Signed8 = 5,
    Signed16 = 6,
    Signed32 = 7,
    Signed64 = 8,
    Float32 = 9,
    Float64 = 10,
    Boolean = 11,
    MacAddress = 12,
    String = 13,
    DateTimeSeconds = 14,
    DateTimeMilliseconds = 15,
    DateTimeMicroseconds = 16,
    DateTimeNanoseconds = 17,
    Ipv4Address = 18,
    Ipv6Address = 19,
}

impl IEType {
    /// Size in octets of the native (unreduced) representation, or
    /// `None` for types without a fixed native size (`octetArray`,
    /// `string`).
    pub const fn native_size(&self) -> Option<usize> {
        match self {
            IEType::OctetArray | IEType::String => None,
            IEType::Unsigned8 | IEType::Signed8 | IEType::Boolean => Some(1),
            IEType::Unsigned16 | IEType::Signed16 => Some(2),
            IEType::Unsigned32
            | IEType::Signed32
            | IEType::Float32
            | IEType::DateTimeSeconds
            | IEType::Ipv4Address => Some(4),
            IEType::Unsigned64
            | IEType::Signed64
            | IEType::Float64
            | IEType::DateTimeMilliseconds
            | IEType::DateTimeMicroseconds
            | IEType::DateTimeNanoseconds => Some(8),
            IEType::MacAddress => Some(6),
            IEType::Ipv6Address => Some(16),
        }
    }

    /// Whether `length` is an acceptable on-the-wire length for this
    /// type. Integer types admit reduced-length encodings down to one
    /// octet; address, datetime and float types are fixed; the octet
    /// types take anything including [`VARLEN`].
    pub fn valid_wire_length(&self, length: u16) -> bool {
        match self {
            IEType::OctetArray | IEType::String => length > 0,
            IEType::Unsigned8 | IEType::Signed8 | IEType::Boolean => length == 1,
            IEType::Unsigned16 | IEType::Signed16 => (1..=2).contains(&length),
            IEType::Unsigned32 | IEType::Signed32 => (1..=4).contains(&length),
            IEType::Unsigned64 | IEType::Signed64 => (1..=8).contains(&length),
            IEType::Float32 => length == 4,
            IEType::Float64 => length == 4 || length == 8,
            IEType::MacAddress => length == 6,
            IEType::DateTimeSeconds => length == 4,
            // Milliseconds allow reduced-length encoding like the
            // unsigned64 they are carried as; micro/nano are pinned
            // to 8 octets by RFC 7011.
            IEType::DateTimeMilliseconds => (1..=8).contains(&length),
            IEType::DateTimeMicroseconds | IEType::DateTimeNanoseconds => length == 8,
            IEType::Ipv4Address => length == 4,
            IEType::Ipv6Address => length == 16,
        }
    }

    /// Whether values of this type are integers subject to
    /// reduced-length encoding.
    pub const fn is_reducible(&self) -> bool {
        matches!(
            self,
            IEType::Unsigned16
                | IEType::Unsigned32
                | IEType::Unsigned64
                | IEType::Signed16
                | IEType::Signed32
                | IEType::Signed64
                | IEType::DateTimeMilliseconds
        )
    }

    /// The wire length a template would carry for this type when the
    /// exporter does not reduce it: the native size, or [`VARLEN`]
    /// for the octet types.
    pub fn default_wire_length(&self) -> u16 {
        match self.native_size() {
            Some(n) => n as u16,
            None => VARLEN,
        }
    }
}
