//! Reply Values
//!
//! Every successful command produces exactly one [`Reply`]. The protocol
//! module turns it into wire bytes; nothing here knows about RESP framing.

use bytes::Bytes;
use std::fmt;

/// The value a handler hands back to the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A short status token such as `OK`
    Status(String),

    /// A signed 64-bit integer (counts, booleans, TTLs)
    Integer(i64),

    /// A single value, or `None` for a missing key
    Bulk(Option<Bytes>),

    /// An ordered list of replies
    Array(Vec<Reply>),
}

impl Reply {
    /// The `OK` status returned by write commands.
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Booleans are reported as `1` / `0`.
    pub fn from_bool(b: bool) -> Self {
        Reply::Integer(i64::from(b))
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(Some(data.into()))
    }

    /// The null bulk reply.
    pub fn null() -> Self {
        Reply::Bulk(None)
    }

    pub fn array(values: Vec<Reply>) -> Self {
        Reply::Array(values)
    }

    /// Builds an array of bulk replies, mapping `None` to null entries.
    pub fn bulk_array<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<Bytes>>,
    {
        Reply::Array(values.into_iter().map(Reply::Bulk).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Reply::Bulk(None))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Reply]> {
        match self {
            Reply::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the bytes of a non-null bulk reply.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(Some(b)) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(Some(data)) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "\"{}\"", s),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
            Reply::Bulk(None) => write!(f, "(nil)"),
            Reply::Array(values) if values.is_empty() => write!(f, "(empty array)"),
            Reply::Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, v)?;
                }
                Ok(())
            }
        }
    }
}
