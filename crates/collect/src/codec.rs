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

//! Frame splitting for transports that deliver IPFIX as a byte
//! stream (TCP, files read in chunks). The codec carves complete
//! messages out of the stream; feed each frame to a
//! [`MessageStreamParser`](crate::MessageStreamParser) through a
//! [`BufferSource`](crate::BufferSource), or ship it elsewhere.

use byteorder::{ByteOrder, NetworkEndian};
use bytes::{Buf, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::Decoder;

use crate::{IPFIX_VERSION, MESSAGE_HEADER_LEN};

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub enum MessageCodecError {
    IoError(String),
    UnsupportedVersion(u16),
    InvalidLength(u16),
}

impl From<std::io::Error> for MessageCodecError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}

impl std::fmt::Display for MessageCodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "I/O error: {e}"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported message version: {version:#06x}")
            }
            Self::InvalidLength(len) => write!(f, "invalid message length: {len}"),
        }
    }
}

impl std::error::Error for MessageCodecError {}

/// Splits a byte stream into complete IPFIX messages.
///
/// Stateless between frames: each frame starts with a fresh header.
/// A wrong version or an impossible length poisons the stream (the
/// framing is lost for good), so both are errors rather than skips.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageCodec;

impl MessageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for MessageCodec {
    type Item = Bytes;
    type Error = MessageCodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, Self::Error> {
        if src.remaining() < 4 {
            // Not enough to see version and length yet.
            return Ok(None);
        }

        let version = NetworkEndian::read_u16(&src[0..2]);
        if version != IPFIX_VERSION {
            return Err(MessageCodecError::UnsupportedVersion(version));
        }

        let length = NetworkEndian::read_u16(&src[2..4]);
        if (length as usize) < MESSAGE_HEADER_LEN {
            return Err(MessageCodecError::InvalidLength(length));
        }

        let length = length as usize;
        if src.remaining() < length {
            src.reserve(length - src.remaining());
            return Ok(None);
        }

        Ok(Some(src.split_to(length).freeze()))
    }
}
