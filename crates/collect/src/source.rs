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

//! Where the octets come from.

use std::io::Read;

/// The read contract the message parser consumes.
///
/// `read` must fill the whole buffer unless the stream ends: a short
/// count (including 0) means end of stream, an `Err` means I/O
/// failure. For reliable transports implementations block until the
/// request is satisfied.
pub trait OctetSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Advisory: whether octets could be examined without consuming
    /// them. Currently unused by the parser.
    fn can_peek(&self) -> bool {
        false
    }

    /// Octets handed out so far, for diagnostics.
    fn offset(&self) -> u64;

    /// A human-readable name for error messages.
    fn name(&self) -> &str {
        "<octet source>"
    }
}

/// An in-memory octet source over a byte slice.
#[derive(Debug)]
pub struct BufferSource<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BufferSource<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }
}

impl OctetSource for BufferSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.buf.len() - self.pos);
        buf[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn can_peek(&self) -> bool {
        true
    }

    fn offset(&self) -> u64 {
        self.pos as u64
    }

    fn name(&self) -> &str {
        "<buffer>"
    }
}

/// Adapts any [`std::io::Read`] to the full-read contract. A file on
/// disk, a TCP stream or a decompressor all fit here.
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
    offset: u64,
    name: String,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self::named(inner, "<reader>")
    }

    pub fn named(inner: R, name: impl Into<String>) -> Self {
        Self {
            inner,
            offset: 0,
            name: name.into(),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> OctetSource for ReadSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.offset += filled as u64;
        Ok(filled)
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn name(&self) -> &str {
        &self.name
    }
}
