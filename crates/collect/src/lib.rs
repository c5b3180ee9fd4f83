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

//! Streaming IPFIX (RFC 7011) collection with placement decoding.
//!
//! The collection pipeline has three stages:
//!
//! 1. [`MessageStreamParser`] frames messages from an
//!    [`OctetSource`] and separates template sets from data sets;
//! 2. [`PlacementDecoder`] learns wire templates as they arrive and
//!    matches them against registered [`PlacementTemplate`]s;
//! 3. for every matched data record, a compiled [`DecodePlan`] moves
//!    the selected field values straight into the caller's typed
//!    slots, correcting endianness and undoing reduced-length and
//!    variable-length encodings on the way.
//!
//! ```no_run
//! use std::{cell::RefCell, rc::Rc};
//! use flowsift_collect::{
//!     BufferSource, MessageStreamParser, PlacementDecoder, PlacementSink,
//!     PlacementTemplate,
//! };
//! use flowsift_model::InfoModel;
//!
//! struct FlowPrinter;
//!
//! impl PlacementSink for FlowPrinter {
//!     fn end_placement(
//!         &mut self,
//!         _template: &Rc<PlacementTemplate>,
//!     ) -> Result<(), flowsift_collect::ErrorContext> {
//!         // fresh values are now in the bound slots
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = InfoModel::default_ipfix();
//! let mut template = PlacementTemplate::new();
//! let source_ip = template.bind_u32("sourceIPv4Address", &model)?;
//! let packets = template.bind_u64("packetDeltaCount", &model)?;
//!
//! let mut decoder = PlacementDecoder::new(model);
//! decoder.register_placement(Rc::new(template), Rc::new(RefCell::new(FlowPrinter)));
//!
//! let wire: Vec<u8> = std::fs::read("flows.ipfix")?;
//! let mut parser = MessageStreamParser::new();
//! parser.parse(&mut BufferSource::new(&wire), &mut decoder)?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "codec")]
pub mod codec;
pub mod decoder;
pub mod error;
pub mod octets;
pub mod options;
pub mod parser;
pub mod placement;
pub mod plan;
pub mod sink;
pub mod source;
pub mod template;
pub mod wire;

#[cfg(feature = "codec")]
pub use codec::{MessageCodec, MessageCodecError};
pub use decoder::{DecoderStats, PlacementDecoder};
pub use error::{ErrorContext, ErrorKind, Severity};
pub use octets::OctetArray;
pub use options::{AddressByteOrder, DecodeOptions, MatchPolicy};
pub use parser::{ContentHandler, MessageHeader, MessageStreamParser};
pub use placement::{Destination, PlacementError, PlacementTemplate};
pub use plan::{DecodeError, DecodePlan, PlanError};
pub use sink::{MessageInfo, PlacementSink};
pub use source::{BufferSource, OctetSource, ReadSource};
pub use template::{TemplateKey, WireTemplate};

/// IPFIX message header version field value.
pub const IPFIX_VERSION: u16 = 0x000a;

/// Message header: version, length, export time, sequence number,
/// observation domain id.
pub const MESSAGE_HEADER_LEN: usize = 16;

/// An IPFIX message carries its length in a 16-bit field, so this is
/// also the parser's buffer size.
pub const MAX_MESSAGE_LEN: usize = 65535;

/// Minimum length of a useful message: the header plus one set
/// header.
pub const MIN_MESSAGE_LEN: u16 = 20;

/// Set header: set id and set length.
pub const SET_HEADER_LEN: usize = 4;

/// Set id reserved for template sets.
pub const TEMPLATE_SET_ID: u16 = 2;

/// Set id reserved for options template sets.
pub const OPTIONS_TEMPLATE_SET_ID: u16 = 3;

/// Smallest set id denoting a data set; 4..255 are reserved.
pub const DATA_SET_MIN_ID: u16 = 256;

/// Template record header: template id and field count.
pub const TEMPLATE_RECORD_HEADER_LEN: usize = 4;

/// Options template record header: template id, field count and
/// scope field count.
pub const OPTIONS_TEMPLATE_RECORD_HEADER_LEN: usize = 6;

/// Field specifier without the enterprise number word.
pub const FIELD_SPECIFIER_LEN: usize = 4;

/// The enterprise bit in a field specifier's element id.
pub const ENTERPRISE_BIT: u16 = 0x8000;
