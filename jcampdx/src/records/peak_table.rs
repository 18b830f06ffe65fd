//! The `PEAK TABLE` record: `(XY..XY)`, `(XYW..XYW)`, or `(XYM..XYM)`.

use crate::block::StringLdr;
use crate::error::{Error, Kind};
use crate::records::model::Peak;
use crate::records::{with_body, SharedReader};
use crate::reader::TextReader;
use crate::tuple::{self, parse_double_token};
use crate::{lex, Result};
use std::sync::LazyLock;

static PEAK_TUPLE_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^\s*([^,]*?)\s*,\s*([^,]*?)(?:\s*,\s*([^,]*?))?\s*$").unwrap());

/// A JCAMP-DX `PEAK TABLE` record.
#[derive(Debug)]
pub struct PeakTable {
    variable_list: String,
    width_function: Option<String>,
    reader: SharedReader,
    body_offset: usize,
}

impl PeakTable {
    pub(crate) fn new(
        variable_list: String,
        reader: SharedReader,
        _block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        crate::records::validate_variable_list(
            "PEAK TABLE",
            &variable_list,
            &["(XY..XY)", "(XYW..XYW)", "(XYM..XYM)"],
        )?;
        let body_offset = reader.borrow().tell();
        let width_function = read_leading_comments(&mut reader.borrow_mut())?;
        reader.borrow_mut().skip_to_next_ldr()?;
        Ok(Self {
            variable_list,
            width_function,
            reader,
            body_offset,
        })
    }

    /// The record's variable list.
    pub fn variable_list(&self) -> &str {
        &self.variable_list
    }

    /// Free text preceding the first tuple, joined from any consecutive
    /// `$$`-comment lines at the start of the body. `None` if the body
    /// begins directly with data.
    pub fn width_function(&self) -> Option<&str> {
        self.width_function.as_deref()
    }

    /// Decodes the data body into [`Peak`] items, in file order.
    pub fn get_data(&self) -> Result<Vec<Peak>> {
        let trimmed = self.variable_list.trim();
        with_body(&self.reader, self.body_offset, |reader| {
            read_leading_comments(reader)?;
            tuple::read_peak_table_tuples(reader)?
                .into_iter()
                .map(|tuple| parse_peak(&tuple, trimmed))
                .collect()
        })
    }
}

/// Consumes any consecutive pure `$$`-comment lines at the reader's current
/// position, leaving it positioned just past them (at the first data line or
/// the next LDR start). Returns their joined comment text.
fn read_leading_comments(reader: &mut TextReader) -> Result<Option<String>> {
    let mut comments = Vec::new();
    loop {
        if reader.eof() {
            break;
        }
        let pos = reader.tell();
        let line = reader.read_line()?;
        if lex::is_ldr_start(&line) {
            reader.seek(pos);
            break;
        }
        let (content, comment) = lex::strip_line_comment(&line, true, true);
        if content.is_empty() {
            if let Some(text) = comment.filter(|c| !c.is_empty()) {
                comments.push(text);
            }
            continue;
        }
        reader.seek(pos);
        break;
    }
    Ok(if comments.is_empty() {
        None
    } else {
        Some(comments.join("\n"))
    })
}

fn parse_peak(tuple: &str, variable_list: &str) -> Result<Peak> {
    let caps = PEAK_TUPLE_RE.captures(tuple).ok_or_else(|| {
        Error::new(Kind::TupleSyntax {
            details: format!("malformed peak table entry: {tuple:?}"),
        })
    })?;
    let x = parse_double_token(caps.get(1).map(|m| m.as_str()))?;
    let y = parse_double_token(caps.get(2).map(|m| m.as_str()))?;
    let third = caps.get(3).map(|m| m.as_str().trim());

    let (w, m) = match variable_list {
        "(XYW..XYW)" => (
            Some(parse_double_token(third.filter(|s| !s.is_empty()))?),
            None,
        ),
        "(XYM..XYM)" => (
            None,
            third.filter(|s| !s.is_empty()).map(|s| s.to_string()),
        ),
        _ => {
            if third.is_some() {
                return Err(Error::new(Kind::TupleSyntax {
                    details: format!("illegal peak component for (XY..XY): {tuple:?}"),
                }));
            }
            (None, None)
        }
    };

    Ok(Peak { x, y, w, m })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shared(text: &str) -> SharedReader {
        Rc::new(RefCell::new(TextReader::from_bytes(
            format!("{text}\n##END=\n").into_bytes(),
        )))
    }

    #[test]
    fn one_line_multi_peak_xyw() {
        let reader = shared("450.0, 10.0, 1.0 460.0, 11.0, 2.0");
        let table = PeakTable::new("(XYW..XYW)".to_string(), reader, &[]).unwrap();
        let peaks = table.get_data().unwrap();
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].w, Some(1.0));
        assert_eq!(peaks[1].x, 460.0);
    }

    #[test]
    fn xym_variable_list_populates_multiplicity() {
        let reader = shared("30.5, 100.0, S");
        let table = PeakTable::new("(XYM..XYM)".to_string(), reader, &[]).unwrap();
        let peaks = table.get_data().unwrap();
        assert_eq!(peaks[0].m.as_deref(), Some("S"));
        assert_eq!(peaks[0].w, None);
    }

    #[test]
    fn width_function_collects_leading_comments() {
        let reader = shared("$$ w = 0.5 * lw\n30.5, 100.0");
        let table = PeakTable::new("(XY..XY)".to_string(), reader, &[]).unwrap();
        assert_eq!(table.width_function(), Some("w = 0.5 * lw"));
    }

    #[test]
    fn no_leading_comment_means_no_width_function() {
        let reader = shared("30.5, 100.0");
        let table = PeakTable::new("(XY..XY)".to_string(), reader, &[]).unwrap();
        assert_eq!(table.width_function(), None);
    }

    #[test]
    fn illegal_variable_list_is_an_error() {
        let reader = shared("30.5, 100.0");
        assert!(PeakTable::new("(ABC)".to_string(), reader, &[]).is_err());
    }

    #[test]
    fn xy_variable_list_rejects_a_third_component() {
        let reader = shared("30.5, 100.0, 1.0");
        let table = PeakTable::new("(XY..XY)".to_string(), reader, &[]).unwrap();
        assert!(table.get_data().is_err());
    }
}
