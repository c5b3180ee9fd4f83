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

//! Frame-level parsing: messages out of an octet stream, sets out of
//! messages. Everything below the set level is the content handler's
//! business.

use tracing::trace;

use crate::{
    error::{ErrorContext, ErrorKind},
    source::OctetSource,
    DATA_SET_MIN_ID, IPFIX_VERSION, MAX_MESSAGE_LEN, MESSAGE_HEADER_LEN,
    OPTIONS_TEMPLATE_SET_ID, SET_HEADER_LEN, TEMPLATE_SET_ID,
};

/// A decoded message header, fields verbatim from the wire.
/// `base_time` is always 0 for IPFIX; the field exists so the same
/// content-handler interface can serve NetFlow-style framings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u16,
    pub length: u16,
    pub export_time: u32,
    pub sequence_number: u32,
    pub observation_domain: u32,
    pub base_time: u64,
}

/// What the parser drives. `offset` arguments are absolute stream
/// offsets of the passed content, for error reporting.
///
/// Set-level callbacks come in `start_*`/`end_*` pairs; the `end_*`
/// defaults are no-ops.
pub trait ContentHandler {
    fn start_session(&mut self) -> Result<(), ErrorContext>;

    fn end_session(&mut self) -> Result<(), ErrorContext>;

    fn start_message(&mut self, header: &MessageHeader, offset: u64) -> Result<(), ErrorContext>;

    fn end_message(&mut self) -> Result<(), ErrorContext>;

    fn start_template_set(
        &mut self,
        set_id: u16,
        body: &[u8],
        offset: u64,
    ) -> Result<(), ErrorContext>;

    fn end_template_set(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_options_template_set(
        &mut self,
        set_id: u16,
        body: &[u8],
        offset: u64,
    ) -> Result<(), ErrorContext>;

    fn end_options_template_set(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_data_set(&mut self, set_id: u16, body: &[u8], offset: u64)
        -> Result<(), ErrorContext>;

    fn end_data_set(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }
}

/// Reads messages off an [`OctetSource`] and walks their sets,
/// calling into a [`ContentHandler`].
///
/// The parser owns a message-sized buffer and reuses it across
/// messages and sessions; body slices handed to the content handler
/// are only valid for the duration of the callback.
pub struct MessageStreamParser {
    message: Box<[u8]>,
    offset: u64,
}

impl Default for MessageStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStreamParser {
    pub fn new() -> Self {
        Self {
            message: vec![0u8; MAX_MESSAGE_LEN].into_boxed_slice(),
            offset: 0,
        }
    }

    /// Parses messages until the source's clean end, driving
    /// `handler`. A short read at a message boundary ends the
    /// session; anywhere else it is an error. The first error,
    /// from framing or from the handler, ends the parse.
    pub fn parse(
        &mut self,
        source: &mut dyn OctetSource,
        handler: &mut dyn ContentHandler,
    ) -> Result<(), ErrorContext> {
        self.offset = 0;
        handler.start_session()?;

        loop {
            let n = source
                .read(&mut self.message[..MESSAGE_HEADER_LEN])
                .map_err(|e| ErrorContext::read_error(self.offset, &e))?;
            if n == 0 {
                break;
            }
            if n < MESSAGE_HEADER_LEN {
                return Err(ErrorContext::fatal(
                    ErrorKind::ShortHeader,
                    self.offset,
                    format!("wanted {MESSAGE_HEADER_LEN} octets of message header, got {n}"),
                ));
            }

            let version = read_u16(&self.message, 0);
            if version != IPFIX_VERSION {
                return Err(ErrorContext::fatal(
                    ErrorKind::MessageVersionNumber,
                    self.offset,
                    format!("expected message version {IPFIX_VERSION:#06x}, got {version:#06x}"),
                ));
            }

            let header = MessageHeader {
                version,
                length: read_u16(&self.message, 2),
                export_time: read_u32(&self.message, 4),
                sequence_number: read_u32(&self.message, 8),
                observation_domain: read_u32(&self.message, 12),
                base_time: 0,
            };
            let message_len = header.length as usize;
            if message_len < MESSAGE_HEADER_LEN {
                return Err(ErrorContext::fatal(
                    ErrorKind::ShortMessage,
                    self.offset,
                    format!("message length {message_len} below header size"),
                ));
            }

            handler.start_message(&header, self.offset)?;

            let body_len = message_len - MESSAGE_HEADER_LEN;
            if body_len > 0 {
                let n = source
                    .read(&mut self.message[MESSAGE_HEADER_LEN..message_len])
                    .map_err(|e| {
                        ErrorContext::read_error(self.offset + MESSAGE_HEADER_LEN as u64, &e)
                    })?;
                if n < body_len {
                    return Err(ErrorContext::fatal(
                        ErrorKind::ShortBody,
                        self.offset + MESSAGE_HEADER_LEN as u64,
                        format!("wanted {body_len} octets of message body, got {n}"),
                    ));
                }
            }

            self.walk_sets(message_len, handler)?;

            handler.end_message()?;
            self.offset += message_len as u64;
        }

        handler.end_session()?;
        Ok(())
    }

    fn walk_sets(
        &self,
        message_len: usize,
        handler: &mut dyn ContentHandler,
    ) -> Result<(), ErrorContext> {
        let mut cur = MESSAGE_HEADER_LEN;

        while cur + SET_HEADER_LEN <= message_len {
            let set_id = read_u16(&self.message, cur);
            let set_length = read_u16(&self.message, cur + 2) as usize;

            if set_length < SET_HEADER_LEN {
                return Err(ErrorContext::fatal(
                    ErrorKind::FormatError,
                    self.offset + cur as u64,
                    format!("set length {set_length} below set header size"),
                ));
            }
            if cur + set_length > message_len {
                return Err(ErrorContext::fatal(
                    ErrorKind::LongSet,
                    self.offset + cur as u64,
                    format!(
                        "set of {set_length} octets at message offset {cur} overruns message of {message_len}"
                    ),
                ));
            }

            let body = &self.message[cur + SET_HEADER_LEN..cur + set_length];
            let body_offset = self.offset + (cur + SET_HEADER_LEN) as u64;

            match set_id {
                TEMPLATE_SET_ID => {
                    handler.start_template_set(set_id, body, body_offset)?;
                    handler.end_template_set()?;
                }
                OPTIONS_TEMPLATE_SET_ID => {
                    handler.start_options_template_set(set_id, body, body_offset)?;
                    handler.end_options_template_set()?;
                }
                id if id >= DATA_SET_MIN_ID => {
                    handler.start_data_set(set_id, body, body_offset)?;
                    handler.end_data_set()?;
                }
                id => {
                    // 0, 1 and 4..255 are reserved; nothing to do.
                    trace!(set_id = id, "skipping reserved set");
                }
            }

            cur += set_length;
        }

        Ok(())
    }
}

#[inline]
fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

#[inline]
fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::BufferSource;

    #[derive(Debug, PartialEq, Eq)]
    enum Event {
        StartSession,
        EndSession,
        StartMessage(u32, u32),
        EndMessage,
        TemplateSet(u16, usize),
        OptionsTemplateSet(u16, usize),
        DataSet(u16, Vec<u8>, u64),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl ContentHandler for Recorder {
        fn start_session(&mut self) -> Result<(), ErrorContext> {
            self.events.push(Event::StartSession);
            Ok(())
        }

        fn end_session(&mut self) -> Result<(), ErrorContext> {
            self.events.push(Event::EndSession);
            Ok(())
        }

        fn start_message(
            &mut self,
            header: &MessageHeader,
            _offset: u64,
        ) -> Result<(), ErrorContext> {
            self.events.push(Event::StartMessage(
                header.sequence_number,
                header.observation_domain,
            ));
            Ok(())
        }

        fn end_message(&mut self) -> Result<(), ErrorContext> {
            self.events.push(Event::EndMessage);
            Ok(())
        }

        fn start_template_set(
            &mut self,
            set_id: u16,
            body: &[u8],
            _offset: u64,
        ) -> Result<(), ErrorContext> {
            self.events.push(Event::TemplateSet(set_id, body.len()));
            Ok(())
        }

        fn start_options_template_set(
            &mut self,
            set_id: u16,
            body: &[u8],
            _offset: u64,
        ) -> Result<(), ErrorContext> {
            self.events
                .push(Event::OptionsTemplateSet(set_id, body.len()));
            Ok(())
        }

        fn start_data_set(
            &mut self,
            set_id: u16,
            body: &[u8],
            offset: u64,
        ) -> Result<(), ErrorContext> {
            self.events
                .push(Event::DataSet(set_id, body.to_vec(), offset));
            Ok(())
        }
    }

    fn message(sets: &[(u16, &[u8])]) -> Vec<u8> {
        let body_len: usize = sets.iter().map(|(_, b)| b.len() + 4).sum();
        let mut out = Vec::new();
        out.extend_from_slice(&0x000au16.to_be_bytes());
        out.extend_from_slice(&((16 + body_len) as u16).to_be_bytes());
        out.extend_from_slice(&0x5f5e_1000u32.to_be_bytes()); // export time
        out.extend_from_slice(&7u32.to_be_bytes()); // sequence
        out.extend_from_slice(&42u32.to_be_bytes()); // domain
        for (id, body) in sets {
            out.extend_from_slice(&id.to_be_bytes());
            out.extend_from_slice(&((body.len() + 4) as u16).to_be_bytes());
            out.extend_from_slice(body);
        }
        out
    }

    fn parse(wire: &[u8]) -> (Vec<Event>, Result<(), ErrorContext>) {
        let mut recorder = Recorder::default();
        let mut parser = MessageStreamParser::new();
        let result = parser.parse(&mut BufferSource::new(wire), &mut recorder);
        (recorder.events, result)
    }

    #[test]
    fn test_empty_stream_is_clean_session() {
        let (events, result) = parse(&[]);
        result.unwrap();
        assert_eq!(events, vec![Event::StartSession, Event::EndSession]);
    }

    #[test]
    fn test_sets_dispatched_in_order() {
        let wire = message(&[
            (2, &[0u8; 8][..]),
            (999, &[1u8, 2, 3, 4][..]),
            (3, &[0u8; 10][..]),
        ]);
        let (events, result) = parse(&wire);
        result.unwrap();
        assert_eq!(
            events,
            vec![
                Event::StartSession,
                Event::StartMessage(7, 42),
                Event::TemplateSet(2, 8),
                Event::DataSet(999, vec![1, 2, 3, 4], 16 + 4 + 8 + 4),
                Event::OptionsTemplateSet(3, 10),
                Event::EndMessage,
                Event::EndSession,
            ]
        );
    }

    #[test]
    fn test_reserved_sets_skipped_silently() {
        let wire = message(&[(4, &[0u8; 4][..]), (255, &[0u8; 2][..])]);
        let (events, result) = parse(&wire);
        result.unwrap();
        assert_eq!(
            events,
            vec![
                Event::StartSession,
                Event::StartMessage(7, 42),
                Event::EndMessage,
                Event::EndSession,
            ]
        );
    }

    #[test]
    fn test_two_messages_advance_offset() {
        let mut wire = message(&[(999, &[1u8][..])]);
        let first_len = wire.len();
        wire.extend(message(&[(999, &[2u8][..])]));
        let (events, result) = parse(&wire);
        result.unwrap();
        let offsets: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Event::DataSet(_, _, offset) => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![20, first_len as u64 + 20]);
    }

    #[test]
    fn test_short_header() {
        let (_, result) = parse(&[0x00, 0x0a, 0x00]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShortHeader);
    }

    #[test]
    fn test_bad_version() {
        let mut wire = message(&[]);
        wire[0] = 0;
        wire[1] = 9;
        let (_, result) = parse(&wire);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::MessageVersionNumber);
    }

    #[test]
    fn test_short_body() {
        let wire = message(&[(999, &[1u8, 2, 3, 4][..])]);
        let (_, result) = parse(&wire[..wire.len() - 2]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShortBody);
        assert_eq!(err.offset(), 16);
    }

    #[test]
    fn test_long_set() {
        let mut wire = message(&[(999, &[1u8, 2, 3, 4][..])]);
        // Inflate the set length beyond the message.
        let set_len_at = 16 + 2;
        wire[set_len_at] = 0x00;
        wire[set_len_at + 1] = 0xff;
        let (_, result) = parse(&wire);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LongSet);
        assert_eq!(err.offset(), 16);
    }

    #[test]
    fn test_every_truncation_is_detected() {
        let wire = message(&[(2, &[0u8; 8][..]), (999, &[1u8, 2, 3, 4][..])]);
        for cut in 1..wire.len() {
            let (_, result) = parse(&wire[..cut]);
            let err = result.unwrap_err();
            assert!(
                matches!(
                    err.kind(),
                    ErrorKind::ShortHeader | ErrorKind::ShortBody
                ),
                "cut at {cut} gave {}",
                err
            );
        }
    }
}
