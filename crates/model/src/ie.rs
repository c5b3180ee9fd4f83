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

use crate::{IEType, VARLEN};

/// An information element descriptor.
///
/// Within one information model, elements are uniquely identified by
/// `(pen, id)`; `pen` 0 is the IANA registry. `length` is the length
/// this descriptor declares on the wire, which for reduced-length
/// views differs from the canonical element's length. Two descriptors
/// with the same identity but different lengths refer to the same
/// element ([`matches`](InfoElement::matches) is the identity
/// comparison).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfoElement {
    name: String,
    pen: u32,
    id: u16,
    ie_type: IEType,
    length: u16,
}

impl InfoElement {
    pub fn new(name: impl Into<String>, pen: u32, id: u16, ie_type: IEType, length: u16) -> Self {
        Self {
            name: name.into(),
            pen,
            id,
            ie_type,
            length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Private enterprise number, 0 for IANA elements.
    pub const fn pen(&self) -> u32 {
        self.pen
    }

    /// Element identifier (15 bits on the wire).
    pub const fn id(&self) -> u16 {
        self.id
    }

    pub const fn ie_type(&self) -> IEType {
        self.ie_type
    }

    /// Declared wire length in octets, or [`VARLEN`].
    pub const fn length(&self) -> u16 {
        self.length
    }

    pub const fn is_varlen(&self) -> bool {
        self.length == VARLEN
    }

    /// Identity comparison: same element regardless of declared
    /// length. Placement matching and template containment use this,
    /// never full equality.
    pub fn matches(&self, other: &InfoElement) -> bool {
        self.pen == other.pen && self.id == other.id
    }

    /// A view of this element with a different declared length
    /// (reduced-length encoding, or the wire-declared length of an
    /// octet-array element). `length` 0 keeps the canonical length.
    pub fn for_length(&self, length: u16) -> InfoElement {
        if length == 0 || length == self.length {
            self.clone()
        } else {
            InfoElement {
                length,
                ..self.clone()
            }
        }
    }
}

/// Formats as an IESpec: `name(pen/id)<type>[len]`.
impl std::fmt::Display for InfoElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.pen != 0 {
            write!(f, "{}/", self.pen)?;
        }
        write!(f, "{})<{}>[", self.id, self.ie_type)?;
        if self.is_varlen() {
            write!(f, "v]")
        } else {
            write!(f, "{}]", self.length)
        }
    }
}
