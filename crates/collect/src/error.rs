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

use serde::{Deserialize, Serialize};

/// What went wrong while parsing a message stream.
#[derive(
    strum_macros::Display,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// EOF struck with fewer than 16 octets of a message header.
    ShortHeader,
    /// EOF struck inside a message body.
    ShortBody,
    /// The message header's version field was not 0x000a.
    MessageVersionNumber,
    /// A message declared a length below the required minimum.
    ShortMessage,
    /// A set extends past the end of its message.
    LongSet,
    /// A field specifier extends past the end of its set.
    LongFieldspec,
    /// A non-zero base time was announced for an IPFIX message.
    IpfixBasetime,
    /// Structural violation inside a record or template.
    FormatError,
    /// The octet source reported an I/O error.
    ReadError,
    /// A sink learned something new and asks for the current set to
    /// be retried. Only meaningful from the unhandled-data-set hook.
    Again,
    /// A sink asked for the session to end.
    AbortedByUser,
}

/// Whether parsing can continue past this error.
#[derive(
    strum_macros::Display,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    /// The surrounding set is abandoned, parsing resumes at the next
    /// set boundary.
    Recoverable,
    /// The session ends.
    Fatal,
}

/// An error together with where in the stream it happened.
///
/// Carried by value through every handler and sink callback; the
/// parser decides control flow from `kind` and `severity`. `offset`
/// counts octets from the start of the stream.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ErrorContext {
    kind: ErrorKind,
    severity: Severity,
    offset: u64,
    message: String,
    observation_domain: Option<u32>,
    template_id: Option<u16>,
}

impl ErrorContext {
    pub fn new(
        kind: ErrorKind,
        severity: Severity,
        offset: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            offset,
            message: message.into(),
            observation_domain: None,
            template_id: None,
        }
    }

    pub fn fatal(kind: ErrorKind, offset: u64, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Fatal, offset, message)
    }

    pub fn recoverable(kind: ErrorKind, offset: u64, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Recoverable, offset, message)
    }

    /// The retry signal of the unhandled-data-set hook.
    pub fn again() -> Self {
        Self::new(ErrorKind::Again, Severity::Recoverable, 0, "retry requested")
    }

    /// For sinks that want the session to end.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AbortedByUser, Severity::Fatal, 0, message)
    }

    pub fn read_error(offset: u64, err: &std::io::Error) -> Self {
        Self::new(ErrorKind::ReadError, Severity::Fatal, offset, err.to_string())
    }

    /// Attaches the template coordinates the error refers to.
    pub fn with_template(mut self, observation_domain: u32, template_id: u16) -> Self {
        self.observation_domain = Some(observation_domain);
        self.template_id = Some(template_id);
        self
    }

    /// Rebases a relative offset as the error propagates outward.
    pub fn add_offset(mut self, base: u64) -> Self {
        self.offset += base;
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn severity(&self) -> Severity {
        self.severity
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn observation_domain(&self) -> Option<u32> {
        self.observation_domain
    }

    pub const fn template_id(&self) -> Option<u16> {
        self.template_id
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity == Severity::Recoverable
    }

    pub fn is_again(&self) -> bool {
        self.kind == ErrorKind::Again
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "@{}: {}: {}: {}",
            self.offset, self.severity, self.kind, self.message
        )?;
        if let (Some(domain), Some(id)) = (self.observation_domain, self.template_id) {
            write!(f, " (domain {domain}, template {id})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::ShortHeader.to_string(), "short_header");
        assert_eq!(ErrorKind::LongFieldspec.to_string(), "long_fieldspec");
        assert_eq!(ErrorKind::IpfixBasetime.to_string(), "ipfix_basetime");
        assert_eq!(ErrorKind::MessageVersionNumber.to_string(), "message_version_number");
    }

    #[test]
    fn test_display_and_augmentation() {
        let err = ErrorContext::recoverable(ErrorKind::LongSet, 20, "set of 99 octets left 4")
            .with_template(5, 256)
            .add_offset(16);
        assert_eq!(err.offset(), 36);
        assert_eq!(
            err.to_string(),
            "@36: recoverable: long_set: set of 99 octets left 4 (domain 5, template 256)"
        );
        assert!(err.is_recoverable());
        assert!(!err.is_again());
        assert!(ErrorContext::again().is_again());
    }

    #[test]
    fn test_serde_round_trip() {
        let err = ErrorContext::fatal(ErrorKind::ShortBody, 128, "wanted 20 octets, got 3");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(serde_json::from_str::<ErrorContext>(&json).unwrap(), err);
    }
}
