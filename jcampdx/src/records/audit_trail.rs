//! The `AUDIT TRAIL` record, including the Bruker override convention:
//! instruments from that vendor sometimes declare a 5-field header but
//! carry the authoritative variable list in a comment on the line that
//! follows, e.g. `$$ ##AUDIT TRAIL= $$ (NUMBER, WHEN, WHO, WHERE, PROCESS,
//! VERSION, WHAT)`.

use crate::block::StringLdr;
use crate::error::{Error, Kind};
use crate::lex;
use crate::reader::TextReader;
use crate::records::model::AuditTrailEntry;
use crate::records::{with_body, SharedReader};
use crate::tuple;
use crate::Result;
use std::sync::LazyLock;

static FIVE_FIELD_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?s)^\(\s*(\d+)\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*)>\s*\)\s*$")
        .unwrap()
});
static SIX_FIELD_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?s)^\(\s*(\d+)\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*)>\s*\)\s*$",
    )
    .unwrap()
});
static SEVEN_FIELD_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?s)^\(\s*(\d+)\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*?)>\s*,\s*<(.*)>\s*\)\s*$",
    )
    .unwrap()
});

const FIVE_FIELD: &str = "(NUMBER,WHEN,WHO,WHERE,WHAT)";
const SIX_FIELD: &str = "(NUMBER,WHEN,WHO,WHERE,VERSION,WHAT)";
const SEVEN_FIELD: &str = "(NUMBER,WHEN,WHO,WHERE,PROCESS,VERSION,WHAT)";

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A JCAMP-DX `AUDIT TRAIL` record.
#[derive(Debug)]
pub struct AuditTrail {
    variable_list: String,
    field_count: usize,
    reader: SharedReader,
    body_offset: usize,
}

impl AuditTrail {
    pub(crate) fn new(
        variable_list: String,
        reader: SharedReader,
        _block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        let declared_count = field_count_of(&variable_list)?;

        let (effective_list, effective_count) = {
            let mut guard = reader.borrow_mut();
            match scan_bruker_override(&mut guard)? {
                Some(overridden) => {
                    let count = field_count_of(&overridden)?;
                    (overridden, count)
                }
                None => (variable_list.clone(), declared_count),
            }
        };

        let body_offset = reader.borrow().tell();
        reader.borrow_mut().skip_to_next_ldr()?;
        Ok(Self {
            variable_list: effective_list,
            field_count: effective_count,
            reader,
            body_offset,
        })
    }

    /// The effective variable list: the Bruker override's list when present,
    /// otherwise the header's own.
    pub fn variable_list(&self) -> &str {
        &self.variable_list
    }

    /// Decodes every entry, in file order.
    pub fn get_data(&self) -> Result<Vec<AuditTrailEntry>> {
        let field_count = self.field_count;
        with_body(&self.reader, self.body_offset, |reader| {
            let mut entries = Vec::new();
            while let Some(tuple) = tuple::next_multiline_tuple(reader, "\n", "audit trail")? {
                entries.push(parse_entry(&tuple, field_count)?);
            }
            Ok(entries)
        })
    }
}

fn field_count_of(variable_list: &str) -> Result<usize> {
    let normalized = strip_whitespace(variable_list);
    match normalized.as_str() {
        FIVE_FIELD => Ok(5),
        SIX_FIELD => Ok(6),
        SEVEN_FIELD => Ok(7),
        _ => Err(Error::new(Kind::IllegalVariableList {
            record: "AUDIT TRAIL".to_string(),
            variable_list: variable_list.to_string(),
        })),
    }
}

/// Looks for a Bruker override comment on the line immediately following the
/// `##AUDITTRAIL=` header: a pure `$$` comment whose text is
/// `##AUDIT TRAIL= $$ (variable list)`. Returns the overriding variable list
/// text (still wrapped in parens) if found, leaving the reader positioned
/// just past the comment line; otherwise leaves the reader untouched.
fn scan_bruker_override(reader: &mut TextReader) -> Result<Option<String>> {
    if reader.eof() {
        return Ok(None);
    }
    let pos = reader.tell();
    let line = reader.read_line()?;
    if !lex::is_pure_comment(&line) {
        reader.seek(pos);
        return Ok(None);
    }
    let (_, comment) = lex::strip_line_comment(&line, true, true);
    let comment = comment.unwrap_or_default();

    let Some(inner_marker) = comment.find("$$") else {
        reader.seek(pos);
        return Ok(None);
    };
    let header = comment[..inner_marker].trim();
    let variable_list = comment[inner_marker + 2..].trim();

    let is_audit_trail_header = header
        .strip_prefix("##")
        .map(|rest| lex::normalize_label(rest.trim_end_matches('=')) == "AUDITTRAIL")
        .unwrap_or(false);

    if !is_audit_trail_header {
        reader.seek(pos);
        return Ok(None);
    }

    Ok(Some(variable_list.to_string()))
}

fn parse_entry(tuple: &str, field_count: usize) -> Result<AuditTrailEntry> {
    let syntax_error = || {
        Error::new(Kind::TupleSyntax {
            details: format!("malformed audit trail entry: {tuple:?}"),
        })
    };
    let parse_number = |text: &str| {
        text.trim().parse::<i64>().map_err(|_| {
            Error::new(Kind::TupleSyntax {
                details: format!("malformed audit trail entry number: {text:?}"),
            })
        })
    };

    match field_count {
        5 => {
            let caps = FIVE_FIELD_RE.captures(tuple).ok_or_else(syntax_error)?;
            Ok(AuditTrailEntry {
                number: parse_number(&caps[1])?,
                when: caps[2].to_string(),
                who: caps[3].to_string(),
                where_: caps[4].to_string(),
                process: None,
                version: None,
                what: caps[5].to_string(),
            })
        }
        6 => {
            let caps = SIX_FIELD_RE.captures(tuple).ok_or_else(syntax_error)?;
            Ok(AuditTrailEntry {
                number: parse_number(&caps[1])?,
                when: caps[2].to_string(),
                who: caps[3].to_string(),
                where_: caps[4].to_string(),
                process: None,
                version: Some(caps[5].to_string()),
                what: caps[6].to_string(),
            })
        }
        7 => {
            let caps = SEVEN_FIELD_RE.captures(tuple).ok_or_else(syntax_error)?;
            Ok(AuditTrailEntry {
                number: parse_number(&caps[1])?,
                when: caps[2].to_string(),
                who: caps[3].to_string(),
                where_: caps[4].to_string(),
                process: Some(caps[5].to_string()),
                version: Some(caps[6].to_string()),
                what: caps[7].to_string(),
            })
        }
        _ => Err(syntax_error()),
    }
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
    fn five_field_entry_round_trips() {
        let reader = shared("(1, <2021-01-01>, <me>, <here>, <created>)");
        let trail = AuditTrail::new(FIVE_FIELD.to_string(), reader, &[]).unwrap();
        let entries = trail.get_data().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].number, 1);
        assert_eq!(entries[0].what, "created");
        assert!(entries[0].process.is_none());
        assert!(entries[0].version.is_none());
    }

    #[test]
    fn bruker_override_upgrades_five_field_declaration_to_seven() {
        let reader = shared(
            "$$ ##AUDIT TRAIL= $$ (NUMBER, WHEN, WHO, WHERE, PROCESS, VERSION, WHAT)\n\
             (1, <2021-01-01>, <me>, <here>, <proc>, <1.0>, <created>)",
        );
        let trail = AuditTrail::new(FIVE_FIELD.to_string(), reader, &[]).unwrap();
        let entries = trail.get_data().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].process.as_deref(), Some("proc"));
        assert_eq!(entries[0].version.as_deref(), Some("1.0"));
        assert_eq!(entries[0].what, "created");
    }

    #[test]
    fn non_override_comment_is_left_alone() {
        let reader = shared("$$ just a regular comment\n(1, <2021-01-01>, <me>, <here>, <created>)");
        let trail = AuditTrail::new(FIVE_FIELD.to_string(), reader, &[]).unwrap();
        let entries = trail.get_data().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].what, "created");
    }

    #[test]
    fn illegal_variable_list_is_rejected() {
        let reader = shared("(1, <2021-01-01>, <me>, <here>, <created>)");
        assert!(AuditTrail::new("(BOGUS)".to_string(), reader, &[]).is_err());
    }
}
