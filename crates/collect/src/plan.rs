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

//! Decode plans: a wire template joined with a placement template
//! compiles into a straight-line decision list, one decision per
//! wire element (adjacent fixed skips coalesced), which then runs
//! once per data record.
//!
//! The decision list is a plain enum dispatched in a dense match.
//! This loop runs once per record field at line rate; there is no
//! per-field virtual dispatch and no lookup left at execution time.

use std::{cell::Cell, cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

use flowsift_model::{IEType, InfoElement};

use crate::{
    octets::OctetArray,
    options::{AddressByteOrder, DecodeOptions},
    placement::{Destination, PlacementTemplate},
    template::WireTemplate,
};

/// Integer-family slot of a big-endian transfer. The wire value is
/// right-justified and zero-filled, so reduced-length encodings
/// land as the natural unsigned extension of their bytes.
#[derive(Debug, Clone)]
enum IntSlot {
    U16(Rc<Cell<u16>>),
    U32(Rc<Cell<u32>>),
    U64(Rc<Cell<u64>>),
    I8(Rc<Cell<i8>>),
    I16(Rc<Cell<i16>>),
    I32(Rc<Cell<i32>>),
    I64(Rc<Cell<i64>>),
}

impl IntSlot {
    #[inline]
    fn store(&self, acc: u64) {
        match self {
            IntSlot::U16(c) => c.set(acc as u16),
            IntSlot::U32(c) => c.set(acc as u32),
            IntSlot::U64(c) => c.set(acc),
            IntSlot::I8(c) => c.set(acc as i8),
            IntSlot::I16(c) => c.set(acc as i16),
            IntSlot::I32(c) => c.set(acc as i32),
            IntSlot::I64(c) => c.set(acc as i64),
        }
    }

    const fn native_size(&self) -> usize {
        match self {
            IntSlot::I8(_) => 1,
            IntSlot::U16(_) | IntSlot::I16(_) => 2,
            IntSlot::U32(_) | IntSlot::I32(_) => 4,
            IntSlot::U64(_) | IntSlot::I64(_) => 8,
        }
    }
}

/// Raw-octet slot: copied without byte-order interpretation.
#[derive(Debug, Clone)]
enum RawSlot {
    U8(Rc<Cell<u8>>),
    Mac(Rc<Cell<[u8; 6]>>),
    Ipv6(Rc<Cell<[u8; 16]>>),
}

#[derive(Debug, Clone)]
enum Decision {
    SkipFixlen {
        length: usize,
    },
    SkipVarlen,
    /// Right-justified raw copy into a zeroed slot.
    TransferFixlen {
        length: usize,
        dst: RawSlot,
    },
    /// Byte-reversed copy, for the address-as-integer policy on
    /// little-endian hosts. Never compiled on big-endian hosts,
    /// where the policy resolves to the raw copy.
    TransferFixlenReversed {
        length: usize,
        dst: RawSlot,
    },
    /// Big-endian integer to native, right-justified for reduced
    /// lengths.
    TransferIntBe {
        length: usize,
        dst: IntSlot,
    },
    TransferBoolean {
        dst: Rc<Cell<bool>>,
    },
    TransferFloatBe {
        dst: Rc<Cell<f32>>,
    },
    TransferDoubleBe {
        dst: Rc<Cell<f64>>,
    },
    /// A float64 element carried as 4 wire octets: read a float32,
    /// widen, store.
    TransferFloatIntoDouble {
        dst: Rc<Cell<f64>>,
    },
    TransferFixlenOctets {
        length: usize,
        dst: Rc<RefCell<OctetArray>>,
    },
    TransferVarlen {
        dst: Rc<RefCell<OctetArray>>,
    },
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::SkipFixlen { length } => write!(f, "[skip_fixlen {length}]"),
            Decision::SkipVarlen => write!(f, "[skip_varlen]"),
            Decision::TransferFixlen { length, dst } => {
                write!(f, "[transfer_fixlen {length}/{}]", raw_size(dst))
            }
            Decision::TransferFixlenReversed { length, dst } => {
                write!(f, "[transfer_fixlen_reversed {length}/{}]", raw_size(dst))
            }
            Decision::TransferIntBe { length, dst } => {
                write!(f, "[transfer_fixlen_be {length}/{}]", dst.native_size())
            }
            Decision::TransferBoolean { .. } => write!(f, "[transfer_boolean]"),
            Decision::TransferFloatBe { .. } => write!(f, "[transfer_fixlen_be 4/4]"),
            Decision::TransferDoubleBe { .. } => write!(f, "[transfer_fixlen_be 8/8]"),
            Decision::TransferFloatIntoDouble { .. } => write!(f, "[transfer_float_into_double]"),
            Decision::TransferFixlenOctets { length, .. } => {
                write!(f, "[transfer_fixlen_octets {length}]")
            }
            Decision::TransferVarlen { .. } => write!(f, "[transfer_varlen]"),
        }
    }
}

const fn raw_size(dst: &RawSlot) -> usize {
    match dst {
        RawSlot::U8(_) => 1,
        RawSlot::Mac(_) => 6,
        RawSlot::Ipv6(_) => 16,
    }
}

/// Why a `(wire, placement)` pair would not compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanError {
    /// The declared wire length is not valid for the element's type
    /// (too long for a reduced-length integer, wrong size for an
    /// address or timestamp).
    InvalidWireLength { ie: String, length: u16 },
    /// The slot bound in the placement template does not fit the
    /// wire element's type.
    DestinationMismatch { ie: String, slot: &'static str },
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidWireLength { ie, length } => {
                write!(f, "wire length {length} is invalid for element {ie}")
            }
            Self::DestinationMismatch { ie, slot } => {
                write!(f, "element {ie} cannot be decoded into a {slot} slot")
            }
        }
    }
}

impl std::error::Error for PlanError {}

/// A structural violation found while decoding one record. Offsets
/// are relative to the record start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeError {
    RecordTruncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    VarlenPrefixTruncated {
        offset: usize,
    },
    VarlenBeyondRecord {
        offset: usize,
        length: usize,
        remaining: usize,
    },
    /// RFC 2579 encodes true as 1 and false as 2; everything else is
    /// an error.
    InvalidBoolean {
        offset: usize,
        value: u8,
    },
}

impl DecodeError {
    pub const fn offset(&self) -> usize {
        match self {
            Self::RecordTruncated { offset, .. }
            | Self::VarlenPrefixTruncated { offset }
            | Self::VarlenBeyondRecord { offset, .. }
            | Self::InvalidBoolean { offset, .. } => *offset,
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordTruncated {
                offset,
                needed,
                remaining,
            } => write!(
                f,
                "field at record offset {offset} needs {needed} octets, {remaining} left in set"
            ),
            Self::VarlenPrefixTruncated { offset } => {
                write!(f, "varlen length prefix at record offset {offset} beyond set end")
            }
            Self::VarlenBeyondRecord {
                offset,
                length,
                remaining,
            } => write!(
                f,
                "varlen content of {length} octets at record offset {offset} goes beyond set end ({remaining} left)"
            ),
            Self::InvalidBoolean { offset, value } => {
                write!(f, "boolean at record offset {offset} encoded as {value}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// The compiled decision list for one `(wire, placement)` pair.
#[derive(Debug, Clone)]
pub struct DecodePlan {
    decisions: Vec<Decision>,
}

impl DecodePlan {
    /// Walks the wire template in order, emitting one transfer
    /// decision per placed element and one skip per unplaced one,
    /// then coalescing runs of fixed skips. `placement` must match
    /// `wire` (every placed element present in it).
    pub fn compile(
        placement: &PlacementTemplate,
        wire: &WireTemplate,
        options: &DecodeOptions,
    ) -> Result<DecodePlan, PlanError> {
        let mut decisions: Vec<Decision> = Vec::with_capacity(wire.len());

        for ie in wire.ies() {
            let decision = match placement.lookup(ie) {
                Some(dst) => compile_transfer(ie, dst, options)?,
                None if ie.is_varlen() => Decision::SkipVarlen,
                None => Decision::SkipFixlen {
                    length: ie.length() as usize,
                },
            };

            // Fixed skips melt into their predecessor.
            if let (
                Decision::SkipFixlen { length },
                Some(Decision::SkipFixlen { length: previous }),
            ) = (&decision, decisions.last_mut())
            {
                *previous += length;
            } else {
                decisions.push(decision);
            }
        }

        Ok(DecodePlan { decisions })
    }

    /// Number of decisions after coalescing.
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// One line per decision, in the `[tag length/size]` form. For
    /// logs and tests.
    pub fn describe(&self) -> Vec<String> {
        self.decisions.iter().map(|d| d.to_string()).collect()
    }

    /// Runs the plan against one record starting at `record[0]` and
    /// bounded by the containing set's end. On success returns the
    /// octets consumed, i.e. the record's wire length. On error the
    /// destinations already written keep their values, the failing
    /// destination is untouched, and the caller abandons the set.
    pub fn execute(&self, record: &[u8]) -> Result<usize, DecodeError> {
        let end = record.len();
        let mut cur = 0usize;

        for decision in &self.decisions {
            match decision {
                Decision::SkipFixlen { length } => {
                    require(cur, *length, end)?;
                    cur += length;
                }

                Decision::SkipVarlen => {
                    let (content_len, prefix_len) = decode_varlen_length(record, cur)?;
                    cur += prefix_len + content_len;
                }

                Decision::TransferFixlen { length, dst } => {
                    require(cur, *length, end)?;
                    let bytes = &record[cur..cur + length];
                    match dst {
                        RawSlot::U8(c) => c.set(bytes[*length - 1]),
                        RawSlot::Mac(c) => {
                            let mut out = [0u8; 6];
                            out[6 - length..].copy_from_slice(bytes);
                            c.set(out);
                        }
                        RawSlot::Ipv6(c) => {
                            let mut out = [0u8; 16];
                            out[16 - length..].copy_from_slice(bytes);
                            c.set(out);
                        }
                    }
                    cur += length;
                }

                Decision::TransferFixlenReversed { length, dst } => {
                    require(cur, *length, end)?;
                    let bytes = &record[cur..cur + length];
                    match dst {
                        RawSlot::U8(c) => c.set(bytes[0]),
                        RawSlot::Mac(c) => {
                            let mut out = [0u8; 6];
                            for (k, b) in bytes.iter().rev().enumerate() {
                                out[k] = *b;
                            }
                            c.set(out);
                        }
                        RawSlot::Ipv6(c) => {
                            let mut out = [0u8; 16];
                            for (k, b) in bytes.iter().rev().enumerate() {
                                out[k] = *b;
                            }
                            c.set(out);
                        }
                    }
                    cur += length;
                }

                Decision::TransferIntBe { length, dst } => {
                    require(cur, *length, end)?;
                    let mut acc = 0u64;
                    for &b in &record[cur..cur + length] {
                        acc = (acc << 8) | b as u64;
                    }
                    dst.store(acc);
                    cur += length;
                }

                Decision::TransferBoolean { dst } => {
                    require(cur, 1, end)?;
                    match record[cur] {
                        1 => dst.set(true),
                        2 => dst.set(false),
                        value => {
                            return Err(DecodeError::InvalidBoolean { offset: cur, value });
                        }
                    }
                    cur += 1;
                }

                Decision::TransferFloatBe { dst } => {
                    require(cur, 4, end)?;
                    let bits = u32::from_be_bytes(four(record, cur));
                    dst.set(f32::from_bits(bits));
                    cur += 4;
                }

                Decision::TransferDoubleBe { dst } => {
                    require(cur, 8, end)?;
                    let mut bits = [0u8; 8];
                    bits.copy_from_slice(&record[cur..cur + 8]);
                    dst.set(f64::from_bits(u64::from_be_bytes(bits)));
                    cur += 8;
                }

                Decision::TransferFloatIntoDouble { dst } => {
                    require(cur, 4, end)?;
                    let bits = u32::from_be_bytes(four(record, cur));
                    dst.set(f32::from_bits(bits) as f64);
                    cur += 4;
                }

                Decision::TransferFixlenOctets { length, dst } => {
                    require(cur, *length, end)?;
                    dst.borrow_mut().copy_content(&record[cur..cur + length]);
                    cur += length;
                }

                Decision::TransferVarlen { dst } => {
                    let (content_len, prefix_len) = decode_varlen_length(record, cur)?;
                    cur += prefix_len;
                    dst.borrow_mut().copy_content(&record[cur..cur + content_len]);
                    cur += content_len;
                }
            }
        }

        Ok(cur)
    }
}

#[inline]
fn require(cur: usize, needed: usize, end: usize) -> Result<(), DecodeError> {
    if cur + needed <= end {
        Ok(())
    } else {
        Err(DecodeError::RecordTruncated {
            offset: cur,
            needed,
            remaining: end - cur,
        })
    }
}

#[inline]
fn four(record: &[u8], cur: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&record[cur..cur + 4]);
    out
}

/// The varlen length prefix: one octet below 255 is the length
/// itself; 255 announces a two-octet network-order length. Both
/// encodings of lengths below 255 are accepted. Returns
/// `(content length, prefix length)`.
fn decode_varlen_length(record: &[u8], cur: usize) -> Result<(usize, usize), DecodeError> {
    let first = *record
        .get(cur)
        .ok_or(DecodeError::VarlenPrefixTruncated { offset: cur })?;

    let (length, prefix_len) = if first < 255 {
        (first as usize, 1)
    } else {
        if cur + 3 > record.len() {
            return Err(DecodeError::VarlenPrefixTruncated { offset: cur });
        }
        (
            ((record[cur + 1] as usize) << 8) | record[cur + 2] as usize,
            3,
        )
    };

    if cur + prefix_len + length > record.len() {
        return Err(DecodeError::VarlenBeyondRecord {
            offset: cur,
            length,
            remaining: record.len() - cur - prefix_len,
        });
    }
    Ok((length, prefix_len))
}

fn compile_transfer(
    ie: &InfoElement,
    dst: &Destination,
    options: &DecodeOptions,
) -> Result<Decision, PlanError> {
    let mismatch = || PlanError::DestinationMismatch {
        ie: ie.to_string(),
        slot: dst.kind(),
    };
    let bad_length = || PlanError::InvalidWireLength {
        ie: ie.to_string(),
        length: ie.length(),
    };

    // The octet types take any length including varlen; everything
    // else must satisfy its type's fixed or reduced-length rule.
    let ty = ie.ie_type();
    let varlen_ok = matches!(ty, IEType::OctetArray | IEType::String);
    if !(varlen_ok && ie.is_varlen()) && !ty.valid_wire_length(ie.length()) {
        return Err(bad_length());
    }
    let length = ie.length() as usize;

    let decision = match ty {
        IEType::OctetArray | IEType::String => {
            let Destination::Octets(slot) = dst else {
                return Err(mismatch());
            };
            if ie.is_varlen() {
                Decision::TransferVarlen { dst: slot.clone() }
            } else {
                Decision::TransferFixlenOctets {
                    length,
                    dst: slot.clone(),
                }
            }
        }

        IEType::Unsigned8 => {
            let Destination::U8(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferFixlen {
                length,
                dst: RawSlot::U8(slot.clone()),
            }
        }

        // One arm per integer type: the pairs of wire type and slot
        // type stay visibly separate.
        IEType::Unsigned16 => {
            let Destination::U16(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferIntBe {
                length,
                dst: IntSlot::U16(slot.clone()),
            }
        }

        IEType::Unsigned32 | IEType::DateTimeSeconds | IEType::Ipv4Address => {
            let Destination::U32(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferIntBe {
                length,
                dst: IntSlot::U32(slot.clone()),
            }
        }

        IEType::Unsigned64
        | IEType::DateTimeMilliseconds
        | IEType::DateTimeMicroseconds
        | IEType::DateTimeNanoseconds => {
            let Destination::U64(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferIntBe {
                length,
                dst: IntSlot::U64(slot.clone()),
            }
        }

        IEType::Signed8 => {
            let Destination::I8(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferIntBe {
                length,
                dst: IntSlot::I8(slot.clone()),
            }
        }

        IEType::Signed16 => {
            let Destination::I16(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferIntBe {
                length,
                dst: IntSlot::I16(slot.clone()),
            }
        }

        IEType::Signed32 => {
            let Destination::I32(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferIntBe {
                length,
                dst: IntSlot::I32(slot.clone()),
            }
        }

        IEType::Signed64 => {
            let Destination::I64(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferIntBe {
                length,
                dst: IntSlot::I64(slot.clone()),
            }
        }

        IEType::Float32 => {
            let Destination::F32(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferFloatBe { dst: slot.clone() }
        }

        IEType::Float64 => {
            let Destination::F64(slot) = dst else {
                return Err(mismatch());
            };
            if length == 4 {
                Decision::TransferFloatIntoDouble { dst: slot.clone() }
            } else {
                Decision::TransferDoubleBe { dst: slot.clone() }
            }
        }

        IEType::Boolean => {
            let Destination::Bool(slot) = dst else {
                return Err(mismatch());
            };
            Decision::TransferBoolean { dst: slot.clone() }
        }

        IEType::MacAddress => {
            let Destination::Mac(slot) = dst else {
                return Err(mismatch());
            };
            address_transfer(length, RawSlot::Mac(slot.clone()), options)
        }

        IEType::Ipv6Address => {
            let Destination::Ipv6(slot) = dst else {
                return Err(mismatch());
            };
            address_transfer(length, RawSlot::Ipv6(slot.clone()), options)
        }
    };

    Ok(decision)
}

fn address_transfer(length: usize, dst: RawSlot, options: &DecodeOptions) -> Decision {
    match options.address_byte_order {
        AddressByteOrder::Verbatim => Decision::TransferFixlen { length, dst },
        // Reading the address as a big-endian integer only swaps on
        // little-endian hosts; on big-endian hosts the wire order is
        // already native and the swap degenerates to the raw copy.
        AddressByteOrder::SwappedAsInteger if cfg!(target_endian = "little") => {
            Decision::TransferFixlenReversed { length, dst }
        }
        AddressByteOrder::SwappedAsInteger => Decision::TransferFixlen { length, dst },
    }
}
