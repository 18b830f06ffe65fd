//! Label normalisation, LDR-start detection, and comment stripping.
//!
//! These are pure functions over strings; they hold no state and never touch
//! a [`TextReader`](crate::reader::TextReader). They are the authoritative
//! source of label identity: two syntactically different labels that
//! normalise to the same string denote the same LDR, and duplicate
//! detection in [`crate::block`] relies on that equivalence.

use crate::error::{Error, Kind};
use crate::Result;
use std::sync::LazyLock;

static LDR_START_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\s*##.*=.*").unwrap());

/// Returns `true` if `line` looks like the start of an LDR, i.e. matches
/// `^\s*##.*=.*`.
pub fn is_ldr_start(line: &str) -> bool {
    LDR_START_RE.is_match(line)
}

/// Normalises an LDR label: deletes ` `, `-`, `/`, `_`, and upper-cases
/// ASCII letters. Bytes outside the ASCII range, and the `$`/`.` prefixes
/// used by user-defined and technique-specific labels, pass through
/// unchanged since they are never one of the deleted characters.
pub fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c != ' ' && c != '-' && c != '/' && c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Validates and normalises a full `##LABEL=...` prefix, returning the
/// normalised text with `##`/`=` still attached (`##NORMALIZEDLABEL=rest`).
/// Used internally by [`parse_ldr_start`] to validate structure; the label
/// segment (`ldr` up to and including the first `=`) is the part that gets
/// normalised, the remainder of `ldr` (if any) is appended verbatim.
fn normalize_ldr_start(ldr: &str) -> Result<String> {
    let trimmed = ldr.trim_start();
    let mut chars = trimmed.chars();
    for _ in 0..2 {
        match chars.next() {
            Some('#') => {}
            _ => {
                return Err(Error::new(Kind::MalformedLdr {
                    line: ldr.to_string(),
                }))
            }
        }
    }
    let rest = chars.as_str();
    let eq = rest.find('=').ok_or_else(|| {
        Error::new(Kind::MalformedLdr {
            line: ldr.to_string(),
        })
    })?;
    let label = &rest[..eq];
    let suffix = &rest[eq..];
    Ok(format!("##{}{}", normalize_label(label), suffix))
}

/// Parses `##LABEL= value` into `(normalized_label, value)`. The normalised
/// label has the wrapping `##`/`=` stripped; the value has at most one
/// leading space stripped (the conventional separator after `=`).
pub fn parse_ldr_start(line: &str) -> Result<(String, String)> {
    let pos = line.find('=').ok_or_else(|| {
        Error::new(Kind::MalformedLdr {
            line: line.to_string(),
        })
    })?;
    let label_segment = &line[..=pos];
    let normalized = normalize_ldr_start(label_segment)?;
    let bytes = normalized.as_bytes();
    if normalized.len() < 3
        || bytes[0] != b'#'
        || bytes[1] != b'#'
        || bytes[normalized.len() - 1] != b'='
    {
        return Err(Error::new(Kind::MalformedLdr {
            line: normalized,
        }));
    }
    let label = normalized[2..normalized.len() - 1].to_string();

    let mut value = line[pos + 1..].to_string();
    if value.starts_with(' ') {
        value.remove(0);
    }

    Ok((label, value))
}

/// Splits `line` at the first `$$`, returning `(content, comment)`. If no
/// `$$` is present, `comment` is `None`. `trim_content`/`trim_comment`
/// control whether each side has leading/trailing whitespace stripped.
pub fn strip_line_comment(
    line: &str,
    trim_content: bool,
    trim_comment: bool,
) -> (String, Option<String>) {
    match line.find("$$") {
        None => {
            let content = if trim_content {
                line.trim().to_string()
            } else {
                line.to_string()
            };
            (content, None)
        }
        Some(pos) => {
            let mut content = line[..pos].to_string();
            let mut comment = line[pos + 2..].to_string();
            if trim_content {
                content = content.trim().to_string();
            }
            if trim_comment {
                comment = comment.trim().to_string();
            }
            (content, Some(comment))
        }
    }
}

/// Returns `true` if `line` is a pure `$$` comment, i.e. the content side
/// (trimmed) is empty.
pub fn is_pure_comment(line: &str) -> bool {
    strip_line_comment(line, true, true).0.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldr_start_matches() {
        assert!(is_ldr_start("##TITLE= foo"));
        assert!(is_ldr_start("  ##TITLE=foo"));
        assert!(!is_ldr_start("not an ldr"));
        assert!(!is_ldr_start("##TITLE foo"));
    }

    #[test]
    fn normalize_label_idempotent() {
        let cases = ["Spectrometer/DATA SYSTEM", "##FOO=", "$SW", ".OBSERVE NUCLEUS"];
        for raw in cases {
            let once = normalize_label(raw);
            let twice = normalize_label(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn normalize_label_equivalence() {
        assert_eq!(
            normalize_label("Spectrometer/DATA SYSTEM"),
            normalize_label("SPECTROMETERDATASYSTEM")
        );
    }

    #[test]
    fn normalize_label_preserves_prefixes() {
        assert_eq!(normalize_label("$SW"), "$SW");
        assert_eq!(normalize_label(".OBSERVE NUCLEUS"), ".OBSERVENUCLEUS");
    }

    #[test]
    fn parse_ldr_start_basic() {
        let (label, value) = parse_ldr_start("##XYDATA= (X++(Y..Y))").unwrap();
        assert_eq!(label, "XYDATA");
        assert_eq!(value, "(X++(Y..Y))");
    }

    #[test]
    fn parse_ldr_start_strips_one_leading_space() {
        let (_, value) = parse_ldr_start("##TITLE=  two spaces").unwrap();
        assert_eq!(value, " two spaces");
    }

    #[test]
    fn parse_ldr_start_normalizes_label() {
        let (label, _) = parse_ldr_start("##Spectrometer/Data System= foo").unwrap();
        assert_eq!(label, "SPECTROMETERDATASYSTEM");
    }

    #[test]
    fn parse_ldr_start_rejects_missing_equals() {
        assert!(parse_ldr_start("##TITLE foo").is_err());
    }

    #[test]
    fn strip_line_comment_splits_on_first_dollar_dollar() {
        let (content, comment) = strip_line_comment("450 10 11 $$ a comment", true, true);
        assert_eq!(content, "450 10 11");
        assert_eq!(comment.as_deref(), Some("a comment"));
    }

    #[test]
    fn strip_line_comment_no_comment() {
        let (content, comment) = strip_line_comment("450 10 11", true, true);
        assert_eq!(content, "450 10 11");
        assert_eq!(comment, None);
    }

    #[test]
    fn pure_comment_detection() {
        assert!(is_pure_comment("   $$ only a comment"));
        assert!(!is_pure_comment("450 10 $$ trailing comment"));
    }
}
