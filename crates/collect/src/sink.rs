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

use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::{error::ErrorContext, placement::PlacementTemplate};

/// The message header, digested for sinks: export time as a real
/// timestamp, everything else verbatim. `base_time` exists because
/// the same callbacks serve NetFlow-style headers; for IPFIX it is
/// always 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub version: u16,
    pub length: u16,
    pub export_time: DateTime<Utc>,
    pub sequence_number: u32,
    pub observation_domain: u32,
    pub base_time: u64,
}

/// What the caller implements to receive decoded records.
///
/// Callbacks run strictly in wire order on the thread driving the
/// parser. Between `start_placement` and `end_placement` the decoder
/// writes into the bound slots of the named template; the fresh
/// values are ready to read when `end_placement` runs.
///
/// Decoding is not transactional: a record abandoned over a format
/// error never reaches `end_placement`, but transfers executed
/// before the failure have already overwritten their slots. Treat
/// slot contents as valid only inside `end_placement`.
///
/// Any callback may end the session by returning an error
/// ([`ErrorContext::aborted`] fits most cases). The
/// `unhandled_data_set` hook may instead return
/// [`ErrorContext::again`] to make the decoder retry the template
/// lookup once.
pub trait PlacementSink {
    fn start_session(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_message(&mut self, _message: &MessageInfo) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_placement(&mut self, _template: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn end_placement(&mut self, template: &Rc<PlacementTemplate>) -> Result<(), ErrorContext>;

    /// Called for data sets whose template id has no learned wire
    /// template, if this sink was registered via
    /// [`PlacementDecoder::set_unhandled_sink`](crate::PlacementDecoder::set_unhandled_sink).
    /// `body` is the raw set payload after the set header.
    fn unhandled_data_set(
        &mut self,
        _observation_domain: u32,
        _set_id: u16,
        _body: &[u8],
    ) -> Result<(), ErrorContext> {
        Ok(())
    }
}
