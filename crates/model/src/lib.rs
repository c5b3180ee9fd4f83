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

//! The IPFIX information model: element type tags, element
//! descriptors, IESpec strings and the registries that resolve wire
//! field specifiers to canonical elements.
//!
//! An [`InfoModel`] is an explicit value. Construct one per decoding
//! session (usually via [`InfoModel::default_ipfix`]) and hand it to
//! whatever consumes it; there is no process-wide instance.

pub mod iana;
pub mod ie;
pub mod model;
pub mod spec;
pub mod types;

pub use ie::InfoElement;
pub use model::InfoModel;
pub use spec::{IESpec, IESpecError};
pub use types::IEType;

/// The reserved field length signalling a variable-length element
/// ([RFC 7011](https://datatracker.ietf.org/doc/html/rfc7011#section-7)).
pub const VARLEN: u16 = 0xffff;
