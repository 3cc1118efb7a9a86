//! RESP Command Decoder
//!
//! Clients send commands as RESP arrays of bulk strings, or as a plain
//! "inline" text line. This decoder turns either form into a
//! [`CommandFrame`]. It never produces nested values: requests are flat.
//!
//! ## How the Decoder Works
//!
//! `parse()` looks at the front of a buffer and returns:
//! - `Ok(Some((frame, consumed)))` - one complete command, `consumed` bytes long
//! - `Ok(None)` - the command is incomplete, read more and retry
//! - `Err(ParseError)` - the bytes can never form a valid command
//!
//! ```text
//! *3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n
//! └┬─┘  └──┬──────┘  └───┬──────┘  └───┬──────┘
//!  │       │             │             │
//!  count   name          arg 0         arg 1
//! ```

use crate::protocol::{prefix, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while decoding a command.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Invalid integer in a length header
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Bulk string length is negative
    #[error("invalid bulk length: {0}")]
    InvalidBulkLength(i64),

    /// Array length is negative, zero, or too large
    #[error("invalid multibulk length: {0}")]
    InvalidArrayLength(i64),

    /// An array element was not a bulk string
    #[error("expected '$', got '{0}'")]
    ExpectedBulk(char),

    /// Inline line with nothing but whitespace
    #[error("empty inline command")]
    EmptyInline,

    /// Protocol violation (missing CRLF, etc.)
    #[error("{0}")]
    ProtocolError(String),

    /// The bulk string exceeds the maximum allowed size
    #[error("bulk too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for decoding operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements in a command array
pub const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// One decoded command: its name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub name: Bytes,
    pub args: Vec<Bytes>,
}

impl CommandFrame {
    pub fn new(name: impl Into<Bytes>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Splits a non-empty part list into name and arguments.
    pub fn from_parts(mut parts: Vec<Bytes>) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        let name = parts.remove(0);
        Some(Self { name, args: parts })
    }

    /// The command name as lossy text, for logging.
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

/// An incremental decoder for client commands.
///
/// # Example
///
/// ```
/// use ordkv::protocol::FrameParser;
///
/// let mut parser = FrameParser::new();
/// let buf = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
///
/// let (frame, consumed) = parser.parse(buf).unwrap().unwrap();
/// assert_eq!(&frame.name[..], b"GET");
/// assert_eq!(consumed, buf.len());
/// ```
#[derive(Debug, Default)]
pub struct FrameParser {
    /// Parts of the command being decoded
    parts: Vec<Bytes>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to decode one command from the front of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(CommandFrame, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }
        self.parts.clear();

        let consumed = match buf[0] {
            prefix::ARRAY => self.parse_array(buf)?,
            _ => self.parse_inline(buf)?,
        };

        Ok(consumed.and_then(|consumed| {
            CommandFrame::from_parts(std::mem::take(&mut self.parts)).map(|f| (f, consumed))
        }))
    }

    /// Parses `*<count>\r\n` followed by `count` bulk strings.
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<usize>> {
        debug_assert!(buf[0] == prefix::ARRAY);

        let Some((count, mut consumed)) = parse_header(buf)? else {
            return Ok(None);
        };
        if count <= 0 || count as usize > MAX_ARRAY_LEN {
            return Err(ParseError::InvalidArrayLength(count));
        }

        self.parts.reserve(count as usize);
        for _ in 0..count {
            match parse_bulk(&buf[consumed..])? {
                Some((data, element_consumed)) => {
                    self.parts.push(data);
                    consumed += element_consumed;
                }
                None => return Ok(None),
            }
        }

        Ok(Some(consumed))
    }

    /// Parses a whitespace-separated command line.
    fn parse_inline(&mut self, buf: &[u8]) -> ParseResult<Option<usize>> {
        let Some(end) = find_crlf(buf) else {
            return Ok(None);
        };

        self.parts.extend(
            buf[..end]
                .split(|b| b.is_ascii_whitespace())
                .filter(|word| !word.is_empty())
                .map(Bytes::copy_from_slice),
        );
        if self.parts.is_empty() {
            return Err(ParseError::EmptyInline);
        }

        Ok(Some(end + 2))
    }
}

/// Parses a `<prefix><integer>\r\n` header, returning the integer and the
/// header length.
fn parse_header(buf: &[u8]) -> ParseResult<Option<(i64, usize)>> {
    let Some(end) = find_crlf(&buf[1..]) else {
        return Ok(None);
    };

    let text = std::str::from_utf8(&buf[1..1 + end])
        .map_err(|e| ParseError::InvalidInteger(e.to_string()))?;
    let n = text
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidInteger(text.to_string()))?;

    Ok(Some((n, 1 + end + 2)))
}

/// Parses one bulk string: `$<length>\r\n<data>\r\n`
fn parse_bulk(buf: &[u8]) -> ParseResult<Option<(Bytes, usize)>> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    if first != prefix::BULK_STRING {
        return Err(ParseError::ExpectedBulk(char::from(first)));
    }

    let Some((length, data_start)) = parse_header(buf)? else {
        return Ok(None);
    };
    if length < 0 {
        return Err(ParseError::InvalidBulkLength(length));
    }

    let length = length as usize;
    if length > MAX_BULK_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let total = data_start + length + 2;
    if buf.len() < total {
        return Ok(None);
    }
    if &buf[data_start + length..total] != CRLF {
        return Err(ParseError::ProtocolError(
            "bulk string missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&buf[data_start..data_start + length]);
    Ok(Some((data, total)))
}

/// Finds the position of CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Decodes a single command from `buf` with a fresh parser.
pub fn parse_command(buf: &[u8]) -> ParseResult<Option<(CommandFrame, usize)>> {
    FrameParser::new().parse(buf)
}
