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

//! Placement templates: the subset of elements a caller wants, each
//! paired with a typed destination slot.
//!
//! Slots are shared cells (`Rc<Cell<_>>`, `Rc<RefCell<OctetArray>>`):
//! the caller keeps one handle, the placement template the other.
//! Decoding is strictly single-threaded (one parser drives one
//! decoder), so plain cells suffice, and the slot types let the
//! registration step — not the hot decode loop — check that an
//! element's abstract type fits the memory it will land in.

use std::{cell::Cell, cell::RefCell, rc::Rc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use flowsift_model::{IEType, InfoElement, InfoModel};

use crate::octets::OctetArray;

/// A typed destination slot.
///
/// The variant decides which abstract element types may be bound to
/// it; see [`Destination::accepts`]. Timestamps land in the integer
/// slot of their carrier type (`dateTimeSeconds` → `U32`, the
/// millisecond/microsecond/nanosecond types → `U64`), IPv4 addresses
/// in `U32` in host order.
#[derive(Debug, Clone)]
pub enum Destination {
    U8(Rc<Cell<u8>>),
    U16(Rc<Cell<u16>>),
    U32(Rc<Cell<u32>>),
    U64(Rc<Cell<u64>>),
    I8(Rc<Cell<i8>>),
    I16(Rc<Cell<i16>>),
    I32(Rc<Cell<i32>>),
    I64(Rc<Cell<i64>>),
    F32(Rc<Cell<f32>>),
    F64(Rc<Cell<f64>>),
    Bool(Rc<Cell<bool>>),
    Mac(Rc<Cell<[u8; 6]>>),
    Ipv6(Rc<Cell<[u8; 16]>>),
    Octets(Rc<RefCell<OctetArray>>),
}

impl Destination {
    /// Whether an element of `ie_type` may be decoded into this
    /// slot.
    pub fn accepts(&self, ie_type: IEType) -> bool {
        match self {
            Destination::U8(_) => ie_type == IEType::Unsigned8,
            Destination::U16(_) => ie_type == IEType::Unsigned16,
            Destination::U32(_) => matches!(
                ie_type,
                IEType::Unsigned32 | IEType::DateTimeSeconds | IEType::Ipv4Address
            ),
            Destination::U64(_) => matches!(
                ie_type,
                IEType::Unsigned64
                    | IEType::DateTimeMilliseconds
                    | IEType::DateTimeMicroseconds
                    | IEType::DateTimeNanoseconds
            ),
            Destination::I8(_) => ie_type == IEType::Signed8,
            Destination::I16(_) => ie_type == IEType::Signed16,
            Destination::I32(_) => ie_type == IEType::Signed32,
            Destination::I64(_) => ie_type == IEType::Signed64,
            Destination::F32(_) => ie_type == IEType::Float32,
            Destination::F64(_) => ie_type == IEType::Float64,
            Destination::Bool(_) => ie_type == IEType::Boolean,
            Destination::Mac(_) => ie_type == IEType::MacAddress,
            Destination::Ipv6(_) => ie_type == IEType::Ipv6Address,
            Destination::Octets(_) => matches!(ie_type, IEType::OctetArray | IEType::String),
        }
    }

    /// The slot's name for error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Destination::U8(_) => "u8",
            Destination::U16(_) => "u16",
            Destination::U32(_) => "u32",
            Destination::U64(_) => "u64",
            Destination::I8(_) => "i8",
            Destination::I16(_) => "i16",
            Destination::I32(_) => "i32",
            Destination::I64(_) => "i64",
            Destination::F32(_) => "f32",
            Destination::F64(_) => "f64",
            Destination::Bool(_) => "bool",
            Destination::Mac(_) => "mac",
            Destination::Ipv6(_) => "ipv6",
            Destination::Octets(_) => "octets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementError {
    /// The IESpec did not resolve against the information model.
    UnknownElement(String),
    /// The slot's type does not fit the element's abstract type.
    TypeMismatch {
        ie: String,
        ie_type: String,
        slot: &'static str,
    },
    /// The element is already bound in this template.
    DuplicateElement(String),
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownElement(spec) => write!(f, "unknown information element {spec:?}"),
            Self::TypeMismatch { ie, ie_type, slot } => {
                write!(f, "element {ie} of type {ie_type} cannot be placed in a {slot} slot")
            }
            Self::DuplicateElement(ie) => write!(f, "element {ie} bound twice"),
        }
    }
}

impl std::error::Error for PlacementError {}

/// An ordered set of elements the caller is interested in, each
/// bound to a destination slot.
///
/// Register the template with a
/// [`PlacementDecoder`](crate::PlacementDecoder) before parsing
/// begins; it must not change while a session runs. A placement
/// template matches a wire template when every bound element appears
/// in it — the wire template's extra elements are skipped over.
#[derive(Debug, Default)]
pub struct PlacementTemplate {
    placements: IndexMap<(u32, u16), (InfoElement, Destination)>,
}

impl PlacementTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an element to a slot, checking the types fit.
    pub fn register(&mut self, ie: &InfoElement, dst: Destination) -> Result<(), PlacementError> {
        if !dst.accepts(ie.ie_type()) {
            return Err(PlacementError::TypeMismatch {
                ie: ie.to_string(),
                ie_type: ie.ie_type().to_string(),
                slot: dst.kind(),
            });
        }
        let key = (ie.pen(), ie.id());
        if self.placements.contains_key(&key) {
            return Err(PlacementError::DuplicateElement(ie.to_string()));
        }
        self.placements.insert(key, (ie.clone(), dst));
        Ok(())
    }

    fn resolve(model: &InfoModel, spec: &str) -> Result<InfoElement, PlacementError> {
        model
            .lookup_spec(spec)
            .ok_or_else(|| PlacementError::UnknownElement(spec.to_string()))
    }

    /// Looks up the slot bound to an element, by `(pen, id)`
    /// identity.
    pub fn lookup(&self, ie: &InfoElement) -> Option<&Destination> {
        self.placements
            .get(&(ie.pen(), ie.id()))
            .map(|(_, dst)| dst)
    }

    /// The bound elements, in registration order.
    pub fn ies(&self) -> impl Iterator<Item = &InfoElement> {
        self.placements.values().map(|(ie, _)| ie)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Whether every bound element appears in `wire` (by identity —
    /// lengths are reconciled at plan compilation). Returns the
    /// number of bound elements on a match, 0 otherwise.
    pub fn is_match(&self, wire: &crate::template::WireTemplate) -> usize {
        for (ie, _) in self.placements.values() {
            if !wire.contains(ie) {
                return 0;
            }
        }
        self.placements.len()
    }
}

macro_rules! bind_cell {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $variant:ident) => {
        $(#[$doc])*
        pub fn $name(
            &mut self,
            spec: &str,
            model: &InfoModel,
        ) -> Result<Rc<Cell<$ty>>, PlacementError> {
            let ie = Self::resolve(model, spec)?;
            let slot = Rc::new(Cell::new(<$ty>::default()));
            self.register(&ie, Destination::$variant(slot.clone()))?;
            Ok(slot)
        }
    };
}

impl PlacementTemplate {
    bind_cell!(
        /// Binds an `unsigned8` element.
        bind_u8, u8, U8
    );
    bind_cell!(
        /// Binds an `unsigned16` element.
        bind_u16, u16, U16
    );
    bind_cell!(
        /// Binds an `unsigned32`, `dateTimeSeconds` or `ipv4Address`
        /// element. IPv4 addresses arrive in host order, so
        /// `Ipv4Addr::from(slot.get())` reconstructs the address.
        bind_u32, u32, U32
    );
    bind_cell!(
        /// Binds an `unsigned64` or millisecond/microsecond/
        /// nanosecond timestamp element.
        bind_u64, u64, U64
    );
    bind_cell!(
        /// Binds a `signed8` element.
        bind_i8, i8, I8
    );
    bind_cell!(
        /// Binds a `signed16` element.
        bind_i16, i16, I16
    );
    bind_cell!(
        /// Binds a `signed32` element.
        bind_i32, i32, I32
    );
    bind_cell!(
        /// Binds a `signed64` element.
        bind_i64, i64, I64
    );
    bind_cell!(
        /// Binds a `float32` element.
        bind_f32, f32, F32
    );
    bind_cell!(
        /// Binds a `float64` element. A 4-octet reduced encoding is
        /// widened on transfer.
        bind_f64, f64, F64
    );
    bind_cell!(
        /// Binds a `boolean` element.
        bind_bool, bool, Bool
    );

    /// Binds a `macAddress` element.
    pub fn bind_mac(
        &mut self,
        spec: &str,
        model: &InfoModel,
    ) -> Result<Rc<Cell<[u8; 6]>>, PlacementError> {
        let ie = Self::resolve(model, spec)?;
        let slot = Rc::new(Cell::new([0u8; 6]));
        self.register(&ie, Destination::Mac(slot.clone()))?;
        Ok(slot)
    }

    /// Binds an `ipv6Address` element.
    pub fn bind_ipv6(
        &mut self,
        spec: &str,
        model: &InfoModel,
    ) -> Result<Rc<Cell<[u8; 16]>>, PlacementError> {
        let ie = Self::resolve(model, spec)?;
        let slot = Rc::new(Cell::new([0u8; 16]));
        self.register(&ie, Destination::Ipv6(slot.clone()))?;
        Ok(slot)
    }

    /// Binds a `string` or `octetArray` element, fixed-length or
    /// varlen.
    pub fn bind_octets(
        &mut self,
        spec: &str,
        model: &InfoModel,
    ) -> Result<Rc<RefCell<OctetArray>>, PlacementError> {
        let ie = Self::resolve(model, spec)?;
        let slot = Rc::new(RefCell::new(OctetArray::new()));
        self.register(&ie, Destination::Octets(slot.clone()))?;
        Ok(slot)
    }
}
