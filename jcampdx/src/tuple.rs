//! Tuple tokenizers shared by the bracketed-tuple records: PEAK TABLE, PEAK
//! ASSIGNMENTS, and AUDIT TRAIL.
//!
//! PEAK TABLE packs multiple `x, y[, w]` tuples per line with no enclosing
//! brackets; PEAK ASSIGNMENTS and AUDIT TRAIL each start a `(...)`-delimited
//! tuple on its own line, but the tuple may continue onto following lines
//! until a line ends in `)`.

use crate::error::{Error, Kind};
use crate::lex;
use crate::reader::TextReader;
use crate::Result;
use std::sync::LazyLock;

static PEAK_SPLIT_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[^,\s](\s*(?:;|\s)\s*)[^,\s]").unwrap());

/// Parses a token as `f64`; an empty token (present but blank) is NaN, as
/// JCAMP-DX uses an empty field to mean "not given" inside a tuple.
pub(crate) fn parse_double_token(token: Option<&str>) -> Result<f64> {
    match token {
        None | Some("") => Ok(f64::NAN),
        Some(text) => text.trim().parse().map_err(|_| {
            Error::new(Kind::TupleSyntax {
                details: format!("malformed numeric tuple field: {text:?}"),
            })
        }),
    }
}

/// Splits one PEAK TABLE line into its individual `x, y[, w]` tuples. Tuples
/// are separated by a run of whitespace (optionally containing a `;`)
/// flanked by non-comma, non-space characters; a bare comma never separates
/// tuples, since it is the field separator within one tuple.
fn split_peak_tuples(line: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for caps in PEAK_SPLIT_RE.captures_iter(line) {
        let delimiter = caps.get(1).unwrap();
        pieces.push(line[last..delimiter.start()].to_string());
        last = delimiter.end();
    }
    pieces.push(line[last..].to_string());
    pieces
}

/// Reads every PEAK TABLE tuple from the reader's current position up to
/// the next LDR start, splitting multi-tuple lines. Leaves the reader
/// positioned at that next LDR start.
pub fn read_peak_table_tuples(reader: &mut TextReader) -> Result<Vec<String>> {
    let mut tuples = Vec::new();
    let mut pos = reader.tell();

    while !reader.eof() {
        let line = reader.read_line()?;
        if lex::is_ldr_start(&line) {
            reader.seek(pos);
            break;
        }
        pos = reader.tell();

        let (value, _) = lex::strip_line_comment(&line, true, true);
        if value.is_empty() {
            continue;
        }
        let split = split_peak_tuples(&value);
        if split.is_empty() {
            return Err(Error::new(Kind::TupleSyntax {
                details: format!("unexpected content in peak table: {line:?}"),
            }));
        }
        tuples.extend(split);
    }

    Ok(tuples)
}

/// Reads the next `(...)`-delimited tuple from the reader's current
/// position, accumulating lines joined by `line_break` until one ends in
/// `)`. Returns `None` once the next LDR start is reached with no tuple
/// begun. Leaves the reader positioned at the next LDR start in that case,
/// or just past the closing line otherwise.
pub fn next_multiline_tuple(
    reader: &mut TextReader,
    line_break: &str,
    ldr_name: &str,
) -> Result<Option<String>> {
    let mut tuple = String::new();
    let mut pos = reader.tell();
    let mut started = false;

    while !reader.eof() {
        let line = reader.read_line()?;
        let (content, _) = lex::strip_line_comment(&line, true, true);
        if is_tuple_start(&content) {
            tuple.push_str(&content);
            started = true;
            break;
        }
        if lex::is_ldr_start(&content) {
            reader.seek(pos);
            return Ok(None);
        }
        if !content.is_empty() {
            return Err(Error::new(Kind::TupleSyntax {
                details: format!("illegal string found in {ldr_name}: {line:?}"),
            }));
        }
        pos = reader.tell();
    }
    if !started {
        return Ok(None);
    }
    if is_tuple_end(&tuple) {
        return Ok(Some(tuple));
    }

    loop {
        if reader.eof() {
            return Err(Error::new(Kind::TupleSyntax {
                details: format!(
                    "file ended before closing parenthesis was found for {ldr_name}: {tuple:?}"
                ),
            }));
        }
        let resume = reader.tell();
        let line = reader.read_line()?;
        let (content, _) = lex::strip_line_comment(&line, true, true);
        if lex::is_ldr_start(&content) {
            reader.seek(resume);
            return Err(Error::new(Kind::TupleSyntax {
                details: format!(
                    "no closing parenthesis found for {ldr_name} entry: {tuple:?}"
                ),
            }));
        }
        tuple.push_str(line_break);
        tuple.push_str(&content);
        if is_tuple_end(&content) {
            return Ok(Some(tuple));
        }
    }
}

fn is_tuple_start(value: &str) -> bool {
    value.trim_start().starts_with('(')
}

fn is_tuple_end(value: &str) -> bool {
    value.trim_end().ends_with(')')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(text: &str) -> TextReader {
        TextReader::from_bytes(format!("{text}\n##END=\n").into_bytes())
    }

    #[test]
    fn splits_single_tuple() {
        assert_eq!(split_peak_tuples("30.5, 100.0"), vec!["30.5, 100.0"]);
    }

    #[test]
    fn splits_semicolon_separated_tuples() {
        let pieces = split_peak_tuples("30.5, 100.0; 31.2, 99.0");
        assert_eq!(pieces, vec!["30.5, 100.0", "31.2, 99.0"]);
    }

    #[test]
    fn splits_whitespace_separated_tuples() {
        let pieces = split_peak_tuples("30.5, 100.0  31.2, 99.0");
        assert_eq!(pieces, vec!["30.5, 100.0", "31.2, 99.0"]);
    }

    #[test]
    fn parse_double_token_empty_is_nan() {
        assert!(parse_double_token(Some("")).unwrap().is_nan());
        assert!(parse_double_token(None).unwrap().is_nan());
    }

    #[test]
    fn read_peak_table_tuples_multiple_lines() {
        let mut reader = body("30.5, 100.0\n31.2, 99.0; 32.0, 98.5");
        let tuples = read_peak_table_tuples(&mut reader).unwrap();
        assert_eq!(tuples, vec!["30.5, 100.0", "31.2, 99.0", "32.0, 98.5"]);
    }

    #[test]
    fn multiline_tuple_single_line() {
        let mut reader = body("(1, <foo>, <bar>)\n(2, <baz>, <qux>)");
        let first = next_multiline_tuple(&mut reader, " ", "peak assignments")
            .unwrap()
            .unwrap();
        assert_eq!(first, "(1, <foo>, <bar>)");
        let second = next_multiline_tuple(&mut reader, " ", "peak assignments")
            .unwrap()
            .unwrap();
        assert_eq!(second, "(2, <baz>, <qux>)");
        assert!(next_multiline_tuple(&mut reader, " ", "peak assignments")
            .unwrap()
            .is_none());
    }

    #[test]
    fn multiline_tuple_spans_lines() {
        let mut reader = body("(1, <foo>,\n<bar>)");
        let tuple = next_multiline_tuple(&mut reader, " ", "peak assignments")
            .unwrap()
            .unwrap();
        assert_eq!(tuple, "(1, <foo>, <bar>)");
    }

    #[test]
    fn multiline_tuple_missing_closing_paren_is_an_error() {
        let mut reader = body("(1, <foo>, <bar>");
        assert!(next_multiline_tuple(&mut reader, " ", "peak assignments").is_err());
    }

    #[test]
    fn multiline_tuple_no_tuple_present() {
        let mut reader = TextReader::from_bytes(b"##END=\n".to_vec());
        assert!(next_multiline_tuple(&mut reader, " ", "peak assignments")
            .unwrap()
            .is_none());
    }
}
