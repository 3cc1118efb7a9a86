//! Glob Matching for SCAN Patterns
//!
//! Redis-style glob syntax over raw bytes:
//!
//! - `*` matches any run of bytes, including none
//! - `?` matches exactly one byte
//! - `[abc]`, `[a-z]`, `[^a-z]` match one byte from (or outside) a class
//! - `\x` matches `x` literally
//!
//! Keys are binary-safe, so matching never requires UTF-8.

/// A compiled glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPattern {
    pattern: Vec<u8>,
}

impl GlobPattern {
    pub fn new(pattern: impl AsRef<[u8]>) -> Self {
        Self {
            pattern: pattern.as_ref().to_vec(),
        }
    }

    /// Returns true if `text` matches the whole pattern.
    pub fn matches(&self, text: &[u8]) -> bool {
        match_bytes(&self.pattern, text)
    }

    /// Returns true if the pattern matches every key.
    pub fn is_match_all(&self) -> bool {
        !self.pattern.is_empty() && self.pattern.iter().all(|&b| b == b'*')
    }
}

/// Single pass with one backtrack point: on a mismatch, retry from the most
/// recent `*` with it absorbing one more byte. Runs in O(pattern * text).
fn match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // (pattern index after the last '*', text index it currently absorbs up to)
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() {
            if pattern[p] == b'*' {
                p += 1;
                star = Some((p, t));
                continue;
            }
            if let Some(width) = match_one(&pattern[p..], text[t]) {
                p += width;
                t += 1;
                continue;
            }
        }

        let Some((resume, absorbed)) = star else {
            return false;
        };
        p = resume;
        t = absorbed + 1;
        star = Some((resume, t));
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

/// Matches the non-star token at the front of `pattern` against one byte,
/// returning the token's width in the pattern.
fn match_one(pattern: &[u8], byte: u8) -> Option<usize> {
    match pattern[0] {
        b'?' => Some(1),
        b'[' => match match_class(&pattern[1..], byte) {
            Some((true, consumed)) => Some(1 + consumed),
            Some((false, _)) => None,
            // Unterminated class: treat '[' literally
            None => (byte == b'[').then_some(1),
        },
        b'\\' if pattern.len() > 1 => (pattern[1] == byte).then_some(2),
        c => (c == byte).then_some(1),
    }
}

/// Matches `byte` against a class body starting just after `[`.
///
/// Returns `(matched, bytes consumed including the closing ']')`, or `None`
/// if the class is never closed.
fn match_class(class: &[u8], byte: u8) -> Option<(bool, usize)> {
    let mut i = 0;
    let negate = class.first() == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < class.len() && class[i] != b']' {
        if class[i] == b'\\' && i + 1 < class.len() {
            matched |= class[i + 1] == byte;
            i += 2;
            continue;
        }
        if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            matched |= (lo..=hi).contains(&byte);
            i += 3;
            continue;
        }
        matched |= class[i] == byte;
        i += 1;
    }

    if i >= class.len() {
        return None;
    }

    Some((matched != negate, i + 1))
}
