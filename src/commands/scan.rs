//! SCAN Cursor Protocol
//!
//! Resumable, bounded iteration over the ordered key space with no state kept
//! on the server. The cursor a client sends back is simply the last key it
//! has already seen.
//!
//! ## Grammar
//!
//! ```text
//! SCAN
//! SCAN [cursor] [MATCH pattern] [COUNT n] [INCLUSIVE]
//! ```
//!
//! `MATCH` must come before `COUNT` when both are present. Keywords are
//! case-insensitive. An empty or omitted cursor starts from the lowest key.
//! A first token spelling `MATCH` or `COUNT` always starts the options, so a
//! key with one of those names cannot be passed as a cursor.
//!
//! ## Paging
//!
//! ```text
//!   keys:   a  b  c  d  e
//!
//!   SCAN "" COUNT 2   ──>  ["b", [a, b]]     page full, more may follow
//!   SCAN b  COUNT 2   ──>  ["d", [c, d]]
//!   SCAN d  COUNT 2   ──>  ["",  [e]]        short page: exhausted
//! ```
//!
//! A page shorter than `COUNT` always ends the iteration. A page of exactly
//! `COUNT` keys returns its last key, even if nothing follows it; the next
//! call then returns an empty page with an empty cursor.
//!
//! Writes between calls can make a scan see a key twice or miss one.

use crate::commands::args::{is_keyword, parse_i64};
use crate::commands::{Arity, CommandError, CommandResult, Reply};
use crate::storage::Store;
use bytes::Bytes;
use tracing::trace;

/// Page size when `COUNT` is omitted.
pub const DEFAULT_COUNT: usize = 10;

/// Longest form: `cursor MATCH p COUNT n INCLUSIVE`.
pub const ARITY: Arity = Arity::AtMost(6);

const NAME: &str = "scan";

/// Parsed SCAN arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanArgs {
    /// Where to resume; `None` starts at the lowest key
    pub cursor: Option<Bytes>,
    /// Whether the cursor key itself may be returned
    pub inclusive: bool,
    /// Raw pattern handed to the store
    pub pattern: Option<Bytes>,
    /// Maximum number of keys per page, at least 1
    pub count: usize,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            cursor: None,
            inclusive: false,
            pattern: None,
            count: DEFAULT_COUNT,
        }
    }
}

impl ScanArgs {
    /// Parses the argument vector of a SCAN command.
    pub fn parse(args: &[Bytes]) -> Result<Self, CommandError> {
        let mut parsed = ScanArgs::default();
        if args.is_empty() {
            return Ok(parsed);
        }

        // A leading option keyword means the cursor was omitted.
        let options = if is_option_keyword(&args[0]) {
            args
        } else {
            if !args[0].is_empty() {
                parsed.cursor = Some(args[0].clone());
            }
            &args[1..]
        };

        // Option pairs always have even length, so an odd tail must end in
        // the boundary flag.
        let options = match options.split_last() {
            Some((last, rest)) if options.len() % 2 == 1 => {
                if !is_keyword(last, "inclusive") {
                    return Err(wrong_arity());
                }
                parsed.inclusive = true;
                rest
            }
            _ => options,
        };

        match options {
            [] => {}
            [keyword, pattern] if is_keyword(keyword, "match") => {
                parsed.pattern = Some(pattern.clone());
            }
            [keyword, n] if is_keyword(keyword, "count") => {
                parsed.count = parse_count(n)?;
            }
            [match_kw, pattern, count_kw, n]
                if is_keyword(match_kw, "match") && is_keyword(count_kw, "count") =>
            {
                parsed.pattern = Some(pattern.clone());
                parsed.count = parse_count(n)?;
            }
            _ => return Err(wrong_arity()),
        }

        Ok(parsed)
    }
}

fn is_option_keyword(token: &[u8]) -> bool {
    is_keyword(token, "match") || is_keyword(token, "count")
}

fn wrong_arity() -> CommandError {
    CommandError::wrong_arity(NAME)
}

/// Non-positive counts are rejected here instead of being left to the store.
fn parse_count(arg: &[u8]) -> Result<usize, CommandError> {
    let n = parse_i64(arg)?;
    if n <= 0 {
        return Err(CommandError::InvalidValue(
            "count must be positive".to_string(),
        ));
    }
    usize::try_from(n).map_err(|_| CommandError::not_an_integer())
}

/// The continuation cursor for a page fetched with `count`.
///
/// Empty once the page comes back short; otherwise the page's last key.
pub fn next_cursor(page: &[Bytes], count: usize) -> Bytes {
    if page.len() < count {
        return Bytes::new();
    }
    page.last().cloned().unwrap_or_default()
}

/// SCAN [cursor [MATCH pattern] [COUNT n] [INCLUSIVE]]
pub fn scan(args: &[Bytes], store: &dyn Store) -> CommandResult {
    let parsed = ScanArgs::parse(args)?;

    let page = store.scan(
        parsed.cursor.as_deref(),
        parsed.count,
        parsed.inclusive,
        parsed.pattern.as_deref(),
    )?;

    let cursor = next_cursor(&page, parsed.count);
    trace!(
        returned = page.len(),
        count = parsed.count,
        exhausted = cursor.is_empty(),
        "Scan page"
    );

    Ok(Reply::array(vec![
        Reply::bulk(cursor),
        Reply::array(page.into_iter().map(Reply::bulk).collect()),
    ]))
}
