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

use flowsift_model::InfoElement;

/// The registry key scoping template ids: a 32-bit observation
/// domain shifted over the 16-bit template id.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TemplateKey(u64);

impl TemplateKey {
    pub const fn new(observation_domain: u32, template_id: u16) -> Self {
        Self(((observation_domain as u64) << 16) | template_id as u64)
    }

    pub const fn observation_domain(&self) -> u32 {
        (self.0 >> 16) as u32
    }

    pub const fn template_id(&self) -> u16 {
        self.0 as u16
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.observation_domain(), self.template_id())
    }
}

/// A record layout announced by the exporter: the ordered elements
/// of one template record, each carrying its declared wire length.
///
/// Two wire templates are equal iff they list the same elements at
/// the same lengths in the same order; the registry uses this to
/// tell a re-announcement from a supersedure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireTemplate {
    ies: Vec<InfoElement>,
    min_length: usize,
    scope_field_count: u16,
}

impl WireTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// For options templates: how many leading elements are scope
    /// fields. Plain templates keep 0.
    pub fn with_scope_field_count(scope_field_count: u16) -> Self {
        Self {
            scope_field_count,
            ..Self::default()
        }
    }

    /// Appends an element, extending the minimum record length by
    /// its fixed length, or by the one mandatory prefix octet for a
    /// variable-length element.
    pub fn add(&mut self, ie: InfoElement) {
        self.min_length += if ie.is_varlen() { 1 } else { ie.length() as usize };
        self.ies.push(ie);
    }

    pub fn ies(&self) -> impl Iterator<Item = &InfoElement> {
        self.ies.iter()
    }

    pub fn len(&self) -> usize {
        self.ies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ies.is_empty()
    }

    /// The fewest octets one record of this layout can occupy. A
    /// data set with fewer octets remaining holds only padding.
    pub const fn min_length(&self) -> usize {
        self.min_length
    }

    pub const fn scope_field_count(&self) -> u16 {
        self.scope_field_count
    }

    /// Whether the template carries the element, compared by
    /// `(pen, id)` identity; the declared lengths play no part.
    pub fn contains(&self, ie: &InfoElement) -> bool {
        self.ies.iter().any(|mine| mine.matches(ie))
    }
}
