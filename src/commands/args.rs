//! Argument parsing helpers shared by the handlers.

use crate::commands::CommandError;
use bytes::Bytes;

/// Views `args` as exactly `N` arguments.
///
/// The table checks arity before a handler runs, so this only fails when a
/// handler is registered with an arity that does not fit it.
pub fn fixed<'a, const N: usize>(
    args: &'a [Bytes],
    command: &str,
) -> Result<&'a [Bytes; N], CommandError> {
    args.try_into()
        .map_err(|_| CommandError::wrong_arity(command))
}

/// Parses a signed 64-bit decimal integer argument.
///
/// Anything else, including surrounding whitespace or a leading `+`, is a
/// value error rather than an arity error.
pub fn parse_i64(arg: &[u8]) -> Result<i64, CommandError> {
    let s = std::str::from_utf8(arg).map_err(|_| CommandError::not_an_integer())?;
    if s.starts_with('+') {
        return Err(CommandError::not_an_integer());
    }
    s.parse().map_err(|_| CommandError::not_an_integer())
}

/// Case-insensitive comparison of an argument against an ASCII keyword.
#[inline]
pub fn is_keyword(arg: &[u8], keyword: &str) -> bool {
    arg.eq_ignore_ascii_case(keyword.as_bytes())
}

/// Lossy text form of an argument, for log fields and error messages.
pub fn lossy(arg: &[u8]) -> String {
    String::from_utf8_lossy(arg).into_owned()
}
