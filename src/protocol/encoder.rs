//! RESP Reply Encoder
//!
//! Writes the outcome of one command in wire format:
//!
//! | Outcome | Wire |
//! |---|---|
//! | `Reply::Status("OK")` | `+OK\r\n` |
//! | `Reply::Integer(5)` | `:5\r\n` |
//! | `Reply::Bulk(Some("hi"))` | `$2\r\nhi\r\n` |
//! | `Reply::Bulk(None)` | `$-1\r\n` |
//! | `Reply::Array([..])` | `*<n>\r\n` then each element |
//! | `Err(e)` | `-ERR <message>\r\n` |

use crate::commands::{CommandResult, Reply};
use crate::protocol::{prefix, CRLF};
use bytes::{BufMut, BytesMut};

/// Appends one encoded command outcome to `buf`.
pub fn encode_result(result: &CommandResult, buf: &mut BytesMut) {
    match result {
        Ok(reply) => encode_reply(reply, buf),
        Err(e) => encode_error(&e.reply_message(), buf),
    }
}

/// Appends an encoded reply to `buf`.
pub fn encode_reply(reply: &Reply, buf: &mut BytesMut) {
    match reply {
        Reply::Status(s) => {
            buf.put_u8(prefix::SIMPLE_STRING);
            put_line(s.as_bytes(), buf);
        }
        Reply::Integer(n) => {
            buf.put_u8(prefix::INTEGER);
            put_line(n.to_string().as_bytes(), buf);
        }
        Reply::Bulk(Some(data)) => {
            buf.put_u8(prefix::BULK_STRING);
            put_line(data.len().to_string().as_bytes(), buf);
            put_line(data, buf);
        }
        Reply::Bulk(None) => {
            buf.put_u8(prefix::BULK_STRING);
            put_line(b"-1", buf);
        }
        Reply::Array(values) => {
            buf.put_u8(prefix::ARRAY);
            put_line(values.len().to_string().as_bytes(), buf);
            for value in values {
                encode_reply(value, buf);
            }
        }
    }
}

/// Appends an error line. CR and LF are replaced so the line stays intact.
pub fn encode_error(message: &str, buf: &mut BytesMut) {
    buf.put_u8(prefix::ERROR);
    let clean: Vec<u8> = message
        .bytes()
        .map(|b| if b == b'\r' || b == b'\n' { b' ' } else { b })
        .collect();
    put_line(&clean, buf);
}

#[inline]
fn put_line(data: &[u8], buf: &mut BytesMut) {
    buf.put_slice(data);
    buf.put_slice(CRLF);
}

/// Encodes a single outcome into a fresh buffer.
pub fn encode(result: &CommandResult) -> BytesMut {
    let mut buf = BytesMut::new();
    encode_result(result, &mut buf);
    buf
}
