//! Decoder for the JCAMP-DX ASCII Squeezed Difference Form (ASDF).
//!
//! ASDF is a mini language over five token forms layered onto a single line
//! of text: AFFN/PAC (ordinary signed numbers), SQZ (squeezed: leading digit
//! encodes sign and magnitude), DIF (difference from the previous value),
//! DUP (repeat count for the previous, possibly DIF, value), and `?`
//! (explicitly missing value, decoded as NaN).

use crate::error::{Error, Kind};
use crate::Result;
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Affn,
    Missing,
    Sqz,
    Dif,
    Dup,
}

static EXPONENT_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[eE][+-]?\d{2,3}[;,\s]?.*").unwrap());
static EXPONENT_ALT_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[eE][+-]?\d{1,3}[;,\s].*").unwrap());

fn sqz_digit(c: char) -> Option<i64> {
    const POSITIVE: &str = "@ABCDEFGHI";
    const NEGATIVE: &str = "abcdefghi";
    if let Some(pos) = POSITIVE.find(c) {
        return Some(pos as i64);
    }
    NEGATIVE.find(c).map(|pos| -(pos as i64) - 1)
}

fn dif_digit(c: char) -> Option<i64> {
    const POSITIVE: &str = "%JKLMNOPQR";
    const NEGATIVE: &str = "jklmnopqr";
    if let Some(pos) = POSITIVE.find(c) {
        return Some(pos as i64);
    }
    NEGATIVE.find(c).map(|pos| -(pos as i64) - 1)
}

fn dup_digit(c: char) -> Option<i64> {
    // Index (0-based) in "STUVWXYZs", plus one: S=1 .. Z=8, s=9. Kept
    // verbatim from the source rather than "corrected" to S=2..Z=9, see
    // DESIGN.md.
    const POSITIVE: &str = "STUVWXYZs";
    POSITIVE.find(c).map(|pos| pos as i64 + 1)
}

fn classify(c: char) -> (TokenKind, Option<i64>) {
    if c == '?' {
        return (TokenKind::Missing, None);
    }
    if let Some(d) = sqz_digit(c) {
        return (TokenKind::Sqz, Some(d));
    }
    if let Some(d) = dif_digit(c) {
        return (TokenKind::Dif, Some(d));
    }
    if let Some(d) = dup_digit(c) {
        return (TokenKind::Dup, Some(d));
    }
    (TokenKind::Affn, None)
}

fn is_token_delimiter(chars: &[char], index: usize) -> bool {
    if index >= chars.len() {
        return true;
    }
    let c = chars[index];
    c.is_whitespace() || c == ';' || c == ','
}

fn window(chars: &[char], start: usize) -> String {
    let end = (start + 6).min(chars.len());
    chars[start..end].iter().collect()
}

fn looks_like_exponent(window: &str) -> bool {
    EXPONENT_RE.is_match(window) || EXPONENT_ALT_RE.is_match(window)
}

fn is_token_start(chars: &[char], index: usize) -> bool {
    if index >= chars.len() {
        return false;
    }
    let c = chars[index];
    if c.is_ascii_digit() || c == '.' {
        return index == 0 || is_token_delimiter(chars, index - 1);
    }
    if c == 'E' || c == 'e' {
        return !looks_like_exponent(&window(chars, index));
    }
    if c == '+' || c == '-' {
        if index == 0 {
            return true;
        }
        return !looks_like_exponent(&window(chars, index - 1));
    }
    if sqz_digit(c).is_some() || dif_digit(c).is_some() || dup_digit(c).is_some() {
        return true;
    }
    c == '?'
}

fn next_token(chars: &[char], pos: &mut usize, line: &str) -> Result<Option<String>> {
    while *pos < chars.len() && is_token_delimiter(chars, *pos) {
        *pos += 1;
    }
    if *pos >= chars.len() {
        return Ok(None);
    }
    if !is_token_start(chars, *pos) {
        return Err(Error::new(Kind::AsdfSyntax {
            details: format!("illegal character at position {}", *pos),
            line: line.to_string(),
        }));
    }
    let mut token = String::new();
    loop {
        token.push(chars[*pos]);
        *pos += 1;
        if *pos >= chars.len() || is_token_delimiter(chars, *pos) || is_token_start(chars, *pos) {
            break;
        }
    }
    Ok(Some(token))
}

/// Decodes one line of ASDF text into a sequence of `f64` values.
///
/// Returns the decoded values and a `dif_encoded` flag that is `true` if
/// *any* token on the line was in DIF form (not only the last one — this
/// matches the reference decoder, which never resets the flag once set).
pub fn decode_line(line: &str) -> Result<(Vec<f64>, bool)> {
    let chars: Vec<char> = line.chars().collect();
    let mut pos = 0;
    let mut values: Vec<f64> = Vec::new();
    let mut dif_encoded = false;
    let mut previous_value: Option<f64> = None;
    let mut previous_kind = TokenKind::Affn;

    while let Some(token) = next_token(&chars, &mut pos, line)? {
        let first = token.chars().next().unwrap();
        let (kind, digit) = classify(first);

        if kind == TokenKind::Dif {
            dif_encoded = true;
        }

        if matches!(kind, TokenKind::Dup | TokenKind::Dif) && previous_value.is_none() {
            return Err(Error::new(Kind::AsdfSyntax {
                details: format!(
                    "{} token without a preceding value",
                    if kind == TokenKind::Dup { "DUP" } else { "DIF" }
                ),
                line: line.to_string(),
            }));
        }
        if kind == TokenKind::Dup && previous_kind == TokenKind::Dup {
            return Err(Error::new(Kind::AsdfSyntax {
                details: "DUP token immediately following a DUP token".to_string(),
                line: line.to_string(),
            }));
        }

        match kind {
            TokenKind::Missing => {
                values.push(f64::NAN);
                previous_value = Some(f64::NAN);
            }
            TokenKind::Dup => {
                let transformed = format!("{}{}", digit.unwrap(), &token[1..]);
                let repeats: i64 = transformed.parse().map_err(|_| {
                    Error::new(Kind::AsdfSyntax {
                        details: format!("malformed DUP multiplier: {token:?}"),
                        line: line.to_string(),
                    })
                })?;
                for _ in 0..repeats.saturating_sub(1) {
                    if previous_kind == TokenKind::Dif {
                        let last = *values.last().unwrap();
                        values.push(last + previous_value.unwrap());
                    } else {
                        let last = *values.last().unwrap();
                        values.push(last);
                    }
                }
                previous_value = Some(repeats as f64);
            }
            _ => {
                let numeric = if matches!(kind, TokenKind::Sqz | TokenKind::Dif) {
                    format!("{}{}", digit.unwrap(), &token[1..])
                } else {
                    token.clone()
                };
                let value: f64 = numeric.parse().map_err(|_| {
                    Error::new(Kind::AsdfSyntax {
                        details: format!("malformed numeric token: {token:?}"),
                        line: line.to_string(),
                    })
                })?;
                if kind == TokenKind::Dif {
                    if previous_kind == TokenKind::Missing {
                        return Err(Error::new(Kind::AsdfSyntax {
                            details: "DIF token immediately following a ? token".to_string(),
                            line: line.to_string(),
                        }));
                    }
                    let last = *values.last().unwrap();
                    values.push(last + value);
                } else {
                    values.push(value);
                }
                previous_value = Some(value);
            }
        }
        previous_kind = kind;
    }

    Ok((values, dif_encoded))
}
