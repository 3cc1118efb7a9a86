//! RESP Protocol Implementation
//!
//! The wire edge of the server. Requests arrive as RESP arrays of bulk
//! strings (or inline text lines) and replies leave in the RESP types that
//! match [`Reply`](crate::commands::Reply).
//!
//! ## Modules
//!
//! - `parser`: incremental decoder from bytes to [`CommandFrame`]
//! - `encoder`: writes a command outcome into a `BytesMut`
//!
//! ## Example
//!
//! ```
//! use ordkv::commands::Reply;
//! use ordkv::protocol::{encode, parse_command};
//! use bytes::Bytes;
//!
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (frame, consumed) = parse_command(data).unwrap().unwrap();
//! assert_eq!(frame.args, vec![Bytes::from("name")]);
//! assert_eq!(consumed, data.len());
//!
//! let bytes = encode(&Ok(Reply::bulk(Bytes::from("Ariz"))));
//! assert_eq!(&bytes[..], b"$4\r\nAriz\r\n");
//! ```

pub mod encoder;
pub mod parser;

pub use encoder::{encode, encode_error, encode_reply, encode_result};
pub use parser::{parse_command, CommandFrame, FrameParser, ParseError, ParseResult};

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}
