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

/// A caller-owned byte buffer for `string` and `octetArray` values.
///
/// Successive transfers into the same destination reuse the
/// allocation: capacity grows as needed and never shrinks, so a slot
/// receiving one value per record settles on the high-water mark
/// after a few records.
#[derive(Debug, Default, Clone)]
pub struct OctetArray {
    buf: Vec<u8>,
    len: usize,
}

impl OctetArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content, growing the buffer if needed.
    pub fn copy_content(&mut self, bytes: &[u8]) {
        if bytes.len() > self.buf.len() {
            self.buf.resize(bytes.len(), 0);
        }
        self.buf[..bytes.len()].copy_from_slice(bytes);
        self.len = bytes.len();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Current content length, not capacity.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Drops the content but keeps the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The content as UTF-8, replacing invalid sequences. Meant for
    /// `string`-typed elements and debug output.
    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl PartialEq for OctetArray {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for OctetArray {}

impl AsRef<[u8]> for OctetArray {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
