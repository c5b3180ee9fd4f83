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

//! IESpec strings: the compact textual form of an information
//! element, `name(pen/id)<type>[len]`, with `[v]` for variable
//! length. Every component after the name is optional, so
//! `sourceIPv4Address`, `octetDeltaCount(1)<unsigned64>[8]` and
//! `myCounter(9999/1)<unsigned32>[4]` are all valid.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{IEType, VARLEN};

/// Largest fixed length a spec may declare: one set's worth of
/// payload after message and set headers.
const MAX_FIXED_LENGTH: u16 = VARLEN - 16 - 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IESpecError {
    Empty,
    /// A `(…)`, `<…>` or `[…]` component appeared twice.
    DuplicateComponent(char),
    UnterminatedComponent(char),
    BadNumber(String),
    BadType(String),
    BadLength(String),
    TrailingGarbage(String),
}

impl std::fmt::Display for IESpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty IESpec"),
            Self::DuplicateComponent(c) => {
                write!(f, "IESpec contains '{c}' component more than once")
            }
            Self::UnterminatedComponent(c) => write!(f, "unterminated '{c}' component in IESpec"),
            Self::BadNumber(s) => write!(f, "badly formatted IE number / PEN: {s:?}"),
            Self::BadType(s) => write!(f, "unknown IE type: {s:?}"),
            Self::BadLength(s) => write!(f, "bad IE size: {s:?}"),
            Self::TrailingGarbage(s) => write!(f, "trailing garbage in IESpec: {s:?}"),
        }
    }
}

impl std::error::Error for IESpecError {}

/// A parsed IESpec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IESpec {
    pub name: String,
    /// Private enterprise number; 0 means IANA.
    pub pen: u32,
    pub id: Option<u16>,
    pub ie_type: Option<IEType>,
    pub length: Option<u16>,
}

impl FromStr for IESpec {
    type Err = IESpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IESpecError::Empty);
        }

        let name_end = s.find(['(', '<', '[']).unwrap_or(s.len());
        let name = s[..name_end].trim().to_string();

        let mut spec = IESpec {
            name,
            pen: 0,
            id: None,
            ie_type: None,
            length: None,
        };

        let mut rest = &s[name_end..];
        while let Some(open) = rest.chars().next() {
            let close = match open {
                '(' => ')',
                '<' => '>',
                '[' => ']',
                other => return Err(IESpecError::TrailingGarbage(other.to_string())),
            };
            let end = rest
                .find(close)
                .ok_or(IESpecError::UnterminatedComponent(open))?;
            let inner = &rest[1..end];
            match open {
                '(' => parse_num_pen(inner, &mut spec)?,
                '<' => {
                    if spec.ie_type.is_some() {
                        return Err(IESpecError::DuplicateComponent('<'));
                    }
                    spec.ie_type = Some(
                        inner
                            .parse::<IEType>()
                            .map_err(|_| IESpecError::BadType(inner.to_string()))?,
                    );
                }
                _ => parse_length(inner, &mut spec)?,
            }
            rest = &rest[end + 1..];
        }

        if spec.name.is_empty() && spec.id.is_none() {
            return Err(IESpecError::Empty);
        }
        Ok(spec)
    }
}

fn parse_num_pen(inner: &str, spec: &mut IESpec) -> Result<(), IESpecError> {
    if spec.id.is_some() {
        return Err(IESpecError::DuplicateComponent('('));
    }
    let bad = || IESpecError::BadNumber(inner.to_string());
    match inner.split_once('/') {
        Some((pen, id)) => {
            spec.pen = pen.trim().parse::<u32>().map_err(|_| bad())?;
            spec.id = Some(id.trim().parse::<u16>().map_err(|_| bad())?);
        }
        None => {
            spec.id = Some(inner.trim().parse::<u16>().map_err(|_| bad())?);
        }
    }
    // A 15-bit field on the wire.
    if spec.id.map(|id| id > 0x7fff).unwrap_or(false) {
        return Err(bad());
    }
    Ok(())
}

fn parse_length(inner: &str, spec: &mut IESpec) -> Result<(), IESpecError> {
    if spec.length.is_some() {
        return Err(IESpecError::DuplicateComponent('['));
    }
    let inner = inner.trim();
    if inner == "v" || inner == "V" {
        spec.length = Some(VARLEN);
        return Ok(());
    }
    let len = inner
        .parse::<u16>()
        .map_err(|_| IESpecError::BadLength(inner.to_string()))?;
    if len != VARLEN && len > MAX_FIXED_LENGTH {
        return Err(IESpecError::BadLength(format!("{len} (too large)")));
    }
    spec.length = Some(len);
    Ok(())
}

impl std::fmt::Display for IESpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(id) = self.id {
            if self.pen != 0 {
                write!(f, "({}/{id})", self.pen)?;
            } else {
                write!(f, "({id})")?;
            }
        }
        if let Some(ty) = self.ie_type {
            write!(f, "<{ty}>")?;
        }
        match self.length {
            Some(VARLEN) => write!(f, "[v]")?,
            Some(len) => write!(f, "[{len}]")?,
            None => {}
        }
        Ok(())
    }
}
