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

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{iana::IANA_ELEMENTS, IESpec, IEType, InfoElement};

/// A registry of information elements, keyed by `(pen, id)` and
/// indexed by name.
///
/// An `InfoModel` is a plain value owned by whoever decodes with it.
/// Independent streams may carry independent models with divergent
/// enterprise registries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfoModel {
    iana: FxHashMap<u16, InfoElement>,
    enterprise: FxHashMap<(u32, u16), InfoElement>,
    names: FxHashMap<String, (u32, u16)>,
}

impl InfoModel {
    /// An empty model. Useful for tests and for fully
    /// enterprise-specific deployments.
    pub fn new() -> Self {
        Self::default()
    }

    /// A model preloaded with the standard IANA elements.
    pub fn default_ipfix() -> Self {
        let mut model = Self::new();
        for &(id, name, ie_type, length) in IANA_ELEMENTS {
            model.add(InfoElement::new(name, 0, id, ie_type, length));
        }
        model
    }

    /// Adds (or replaces) an element. The canonical length recorded
    /// here is what [`lookup`](Self::lookup) derives reduced-length
    /// views from.
    pub fn add(&mut self, ie: InfoElement) {
        self.names
            .insert(ie.name().to_string(), (ie.pen(), ie.id()));
        if ie.pen() == 0 {
            self.iana.insert(ie.id(), ie);
        } else {
            self.enterprise.insert((ie.pen(), ie.id()), ie);
        }
    }

    /// Resolves `(pen, id)` to an element carrying the given wire
    /// length (0 keeps the canonical length).
    pub fn lookup(&self, pen: u32, id: u16, length: u16) -> Option<InfoElement> {
        let canonical = if pen == 0 {
            self.iana.get(&id)
        } else {
            self.enterprise.get(&(pen, id))
        };
        canonical.map(|ie| ie.for_length(length))
    }

    /// Resolves an element by registry name, at canonical length.
    pub fn lookup_name(&self, name: &str) -> Option<&InfoElement> {
        let &(pen, id) = self.names.get(name)?;
        if pen == 0 {
            self.iana.get(&id)
        } else {
            self.enterprise.get(&(pen, id))
        }
    }

    /// Resolves an IESpec string, e.g. `"octetDeltaCount"` or
    /// `"myCounter(9999/1)<unsigned32>[4]"`. A spec with a number is
    /// looked up by `(pen, id)`; one without falls back to the name
    /// index. A declared length selects the derived view.
    pub fn lookup_spec(&self, spec: &str) -> Option<InfoElement> {
        let spec: IESpec = spec.parse().ok()?;
        let length = spec.length.unwrap_or(0);
        match spec.id {
            Some(id) => self.lookup(spec.pen, id, length),
            None => self
                .lookup_name(&spec.name)
                .map(|ie| ie.for_length(length)),
        }
    }

    /// Inserts a placeholder for an element seen on the wire but
    /// absent from the model, typed as an opaque octet array of the
    /// declared length. This keeps templates carrying
    /// enterprise-specific elements usable for pass-through.
    pub fn add_unknown(&mut self, pen: u32, id: u16, length: u16) -> InfoElement {
        let ie = InfoElement::new(
            format!("__ipfix_{pen}_{id}"),
            pen,
            id,
            IEType::OctetArray,
            length,
        );
        self.add(ie.clone());
        ie
    }

    /// Number of registered elements, IANA and enterprise combined.
    pub fn len(&self) -> usize {
        self.iana.len() + self.enterprise.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iana.is_empty() && self.enterprise.is_empty()
    }
}
