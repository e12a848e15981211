//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Number of decimal digits in a thread code.
pub const THREAD_ID_WIDTH: usize = 4;

/// Short decimal code addressing a live thread.
///
/// Always exactly four ASCII digits. Leading zeros are significant, so the
/// code is kept as text and never used as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId([u8; THREAD_ID_WIDTH]);

impl ThreadId {
    /// Parses a thread code, rejecting anything but four ASCII digits.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let bytes = code.as_bytes();
        if bytes.is_empty() {
            return Err(ValidationError::empty_field("threadId"));
        }
        if bytes.len() != THREAD_ID_WIDTH || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(ValidationError::invalid_format(
                "threadId",
                "expected 4 decimal digits",
            ));
        }
        let mut digits = [0u8; THREAD_ID_WIDTH];
        digits.copy_from_slice(bytes);
        Ok(Self(digits))
    }

    /// Builds the code for a value in `0..=9999`, zero padded.
    pub fn from_code(code: u16) -> Option<Self> {
        (code <= 9999).then(|| Self::from_code_wrapping(code))
    }

    /// Builds the code for `code % 10000`.
    pub(crate) fn from_code_wrapping(code: u16) -> Self {
        let mut rest = code % 10000;
        let mut digits = [b'0'; THREAD_ID_WIDTH];
        for slot in digits.iter_mut().rev() {
            *slot = b'0' + (rest % 10) as u8;
            rest /= 10;
        }
        Self(digits)
    }

    /// Position of this code in the code space, used only for scanning.
    pub(crate) fn code(&self) -> u16 {
        self.0
            .iter()
            .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'))
    }

    pub fn as_str(&self) -> &str {
        // Digits are validated ASCII on construction.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ThreadId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.as_str().to_string()
    }
}

/// Unique identifier for a transport connection.
///
/// Generated server-side when a client connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random ConnectionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable sort/dedup key of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(u64);

impl NoteId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
