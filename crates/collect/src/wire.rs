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

//! Wire-level parsing of template records and field specifiers.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |E|  Information Element ident. |        Field Length           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      Enterprise Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use nom::{
    error::ErrorKind,
    number::complete::{be_u16, be_u32},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::{
    DATA_SET_MIN_ID, ENTERPRISE_BIT, OPTIONS_TEMPLATE_RECORD_HEADER_LEN,
    TEMPLATE_RECORD_HEADER_LEN,
};

pub type Span<'a> = nom_locate::LocatedSpan<&'a [u8]>;

/// One field specifier as it appears in a template record: element
/// id with the enterprise bit stripped, declared length (0xffff for
/// varlen) and private enterprise number (0 when the bit was clear).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldSpecifier {
    pub pen: u32,
    pub id: u16,
    pub length: u16,
}

/// One template record: header plus `field_count` specifiers. For
/// options templates the first `scope_field_count` specifiers are
/// scope fields; plain templates carry 0 there.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub template_id: u16,
    pub scope_field_count: u16,
    pub fields: Vec<FieldSpecifier>,
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub enum TemplateRecordParsingError {
    /// Ran out of octets (or another combinator-level failure).
    NomError(ErrorKind),
    /// Template ids live in the data-set id range, 256..=65535.
    InvalidTemplateId(u16),
    /// More scope fields than fields altogether.
    InvalidScopeFieldCount { field_count: u16, scope_field_count: u16 },
}

impl std::fmt::Display for TemplateRecordParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NomError(e) => write!(f, "{}", nom::Err::Error(e)),
            Self::InvalidTemplateId(id) => write!(f, "invalid template id {id}"),
            Self::InvalidScopeFieldCount {
                field_count,
                scope_field_count,
            } => write!(
                f,
                "scope field count {scope_field_count} exceeds field count {field_count}"
            ),
        }
    }
}

impl std::error::Error for TemplateRecordParsingError {}

/// [`TemplateRecordParsingError`] plus the span it occurred at.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct LocatedTemplateRecordParsingError<'a> {
    span: Span<'a>,
    error: TemplateRecordParsingError,
}

impl<'a> LocatedTemplateRecordParsingError<'a> {
    pub const fn new(span: Span<'a>, error: TemplateRecordParsingError) -> Self {
        Self { span, error }
    }

    pub const fn span(&self) -> &Span<'a> {
        &self.span
    }

    pub const fn error(&self) -> &TemplateRecordParsingError {
        &self.error
    }

    pub fn into_error(self) -> TemplateRecordParsingError {
        self.error
    }
}

impl<'a> nom::error::ParseError<Span<'a>> for LocatedTemplateRecordParsingError<'a> {
    fn from_error_kind(input: Span<'a>, kind: ErrorKind) -> Self {
        Self::new(input, TemplateRecordParsingError::NomError(kind))
    }

    fn append(_input: Span<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl FieldSpecifier {
    pub const fn is_varlen(&self) -> bool {
        self.length == 0xffff
    }

    pub fn from_wire(
        buf: Span<'_>,
    ) -> IResult<Span<'_>, FieldSpecifier, LocatedTemplateRecordParsingError<'_>> {
        let (buf, raw_id) = be_u16(buf)?;
        let (buf, length) = be_u16(buf)?;
        let (buf, pen) = if raw_id & ENTERPRISE_BIT != 0 {
            be_u32(buf)?
        } else {
            (buf, 0)
        };
        Ok((
            buf,
            FieldSpecifier {
                pen,
                id: raw_id & !ENTERPRISE_BIT,
                length,
            },
        ))
    }
}

impl TemplateRecord {
    pub fn from_wire(
        buf: Span<'_>,
        is_options: bool,
    ) -> IResult<Span<'_>, TemplateRecord, LocatedTemplateRecordParsingError<'_>> {
        let input = buf;
        let (buf, template_id) = be_u16(buf)?;
        // RFC 7011: template ids share the data-set id space.
        if template_id < DATA_SET_MIN_ID {
            return Err(nom::Err::Error(LocatedTemplateRecordParsingError::new(
                input,
                TemplateRecordParsingError::InvalidTemplateId(template_id),
            )));
        }
        let (buf, field_count) = be_u16(buf)?;
        let input = buf;
        let (mut buf, scope_field_count) = if is_options {
            be_u16(buf)?
        } else {
            (buf, 0)
        };
        if scope_field_count > field_count {
            return Err(nom::Err::Error(LocatedTemplateRecordParsingError::new(
                input,
                TemplateRecordParsingError::InvalidScopeFieldCount {
                    field_count,
                    scope_field_count,
                },
            )));
        }
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (t, field) = FieldSpecifier::from_wire(buf)?;
            fields.push(field);
            buf = t;
        }
        Ok((
            buf,
            TemplateRecord {
                template_id,
                scope_field_count,
                fields,
            },
        ))
    }
}

/// Walks a whole (options) template set body. Trailing padding
/// shorter than a record header is skipped silently. Errors come
/// back with the offset into `body` at which they occurred.
pub fn parse_template_set(
    body: &[u8],
    is_options: bool,
) -> Result<Vec<TemplateRecord>, (usize, TemplateRecordParsingError)> {
    let header_len = if is_options {
        OPTIONS_TEMPLATE_RECORD_HEADER_LEN
    } else {
        TEMPLATE_RECORD_HEADER_LEN
    };

    let mut records = Vec::new();
    let mut buf = Span::new(body);
    while buf.len() >= header_len {
        match TemplateRecord::from_wire(buf, is_options) {
            Ok((rest, record)) => {
                records.push(record);
                buf = rest;
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err((e.span().location_offset(), e.into_error()));
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err((
                    buf.location_offset(),
                    TemplateRecordParsingError::NomError(ErrorKind::Eof),
                ));
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_specifier() {
        let good_wire = [0x00, 0x08, 0x00, 0x04];
        let (rest, field) = FieldSpecifier::from_wire(Span::new(&good_wire)).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            field,
            FieldSpecifier {
                pen: 0,
                id: 8,
                length: 4
            }
        );
    }

    #[test]
    fn test_enterprise_field_specifier() {
        // enterprise bit set on id 42, pen 0x00010000
        let good_wire = [0x80, 0x2a, 0xff, 0xff, 0x00, 0x01, 0x00, 0x00];
        let (rest, field) = FieldSpecifier::from_wire(Span::new(&good_wire)).unwrap();
        assert!(rest.is_empty());
        assert_eq!(field.pen, 0x00010000);
        assert_eq!(field.id, 42);
        assert!(field.is_varlen());
    }

    #[test]
    fn test_template_record() {
        let good_wire = [
            0x01, 0x00, 0x00, 0x02, // id 256, 2 fields
            0x00, 0x08, 0x00, 0x04, // sourceIPv4Address[4]
            0x00, 0x02, 0x00, 0x02, // packetDeltaCount[2]
        ];
        let (rest, record) = TemplateRecord::from_wire(Span::new(&good_wire), false).unwrap();
        assert!(rest.is_empty());
        assert_eq!(record.template_id, 256);
        assert_eq!(record.scope_field_count, 0);
        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.fields[1].length, 2);
    }

    #[test]
    fn test_options_template_record() {
        let good_wire = [
            0x01, 0x01, 0x00, 0x02, 0x00, 0x01, // id 257, 2 fields, 1 scope
            0x00, 0x95, 0x00, 0x02, // templateId[2]
            0x00, 0x29, 0x00, 0x08, // exportedMessageTotalCount[8]
        ];
        let (rest, record) = TemplateRecord::from_wire(Span::new(&good_wire), true).unwrap();
        assert!(rest.is_empty());
        assert_eq!(record.template_id, 257);
        assert_eq!(record.scope_field_count, 1);
        assert_eq!(record.fields.len(), 2);
    }

    #[test]
    fn test_bad_template_id() {
        let bad_wire = [0x00, 0x00, 0x00, 0x01, 0x00, 0x08, 0x00, 0x04];
        let err = TemplateRecord::from_wire(Span::new(&bad_wire), false).unwrap_err();
        match err {
            nom::Err::Error(e) => assert_eq!(
                *e.error(),
                TemplateRecordParsingError::InvalidTemplateId(0)
            ),
            _ => panic!("expected error"),
        }
    }

    #[test]
    fn test_bad_scope_count() {
        let bad_wire = [0x01, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00, 0x08, 0x00, 0x04];
        let err = TemplateRecord::from_wire(Span::new(&bad_wire), true).unwrap_err();
        match err {
            nom::Err::Error(e) => assert_eq!(
                *e.error(),
                TemplateRecordParsingError::InvalidScopeFieldCount {
                    field_count: 1,
                    scope_field_count: 2
                }
            ),
            _ => panic!("expected error"),
        }
    }

    #[test]
    fn test_truncated_specifier_reports_offset() {
        let truncated = [
            0x01, 0x00, 0x00, 0x02, // promises 2 fields
            0x00, 0x08, 0x00, 0x04, // one delivered
            0x00, 0x02, // half a specifier
        ];
        let err = parse_template_set(&truncated, false).unwrap_err();
        assert!(matches!(err.1, TemplateRecordParsingError::NomError(_)));
        assert_eq!(err.0, 10);
    }

    #[test]
    fn test_trailing_padding_skipped() {
        let padded = [
            0x01, 0x00, 0x00, 0x01, // id 256, 1 field
            0x00, 0x08, 0x00, 0x04, // sourceIPv4Address[4]
            0x00, 0x00, // 2 octets of padding
        ];
        let records = parse_template_set(&padded, false).unwrap();
        assert_eq!(records.len(), 1);
    }
}
