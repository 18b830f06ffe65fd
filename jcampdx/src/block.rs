//! The outer LDR-stream state machine: tokenises a JCAMP-DX block into
//! labelled data records, recognises and dispatches the special record
//! types, recurses into nested blocks, and aggregates unattributed block
//! comments.

use crate::error::{Error, Kind};
use crate::lex;
use crate::reader::TextReader;
use crate::records::{
    AuditTrail, NTuples, PeakAssignments, PeakTable, RaData, SharedReader, XyData, XyPoints,
};
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// A labelled data record with a scalar string value.
///
/// Multi-line values are joined with `\n`, except where the JCAMP-DX
/// soft-wrap convention applies (a value line ending in `=` joins the next
/// line with no separator).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringLdr {
    label: String,
    value: String,
}

impl StringLdr {
    pub(crate) fn new(label: String, value: String) -> Self {
        Self { label, value }
    }

    /// The LDR's normalised label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The LDR's accumulated value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A JCAMP-DX block: everything between a `##TITLE=` and its matching
/// `##END=`.
///
/// A block holds the standard LDRs it declares, unattributed `##= …`
/// comments, at most one of each special record, and zero or more nested
/// blocks (from a `##DATA TYPE= LINK` block).
#[derive(Debug)]
pub struct Block {
    title: String,
    ldrs: Vec<StringLdr>,
    comments: Vec<String>,
    blocks: Vec<Block>,
    xy_data: Option<XyData>,
    ra_data: Option<RaData>,
    xy_points: Option<XyPoints>,
    peak_table: Option<PeakTable>,
    peak_assignments: Option<PeakAssignments>,
    audit_trail: Option<AuditTrail>,
    ntuples: Option<NTuples>,
}

impl Block {
    /// The block's `##TITLE=` value.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Looks up a standard LDR by normalised label.
    pub fn ldr(&self, label: &str) -> Option<&StringLdr> {
        let label = lex::normalize_label(label);
        self.ldrs.iter().find(|ldr| ldr.label == label)
    }

    /// All standard LDRs, in source order. Special records and `##= …`
    /// comments are excluded.
    pub fn ldrs(&self) -> &[StringLdr] {
        &self.ldrs
    }

    /// Unattributed `##= …` block comments, in source order.
    pub fn block_comments(&self) -> &[String] {
        &self.comments
    }

    /// Nested blocks (from `##DATA TYPE= LINK`), in source order.
    pub fn nested_blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block's `XYDATA` record, if present.
    pub fn xy_data(&self) -> Option<&XyData> {
        self.xy_data.as_ref()
    }

    /// The block's `RADATA` record, if present.
    pub fn ra_data(&self) -> Option<&RaData> {
        self.ra_data.as_ref()
    }

    /// The block's `XYPOINTS` record, if present.
    pub fn xy_points(&self) -> Option<&XyPoints> {
        self.xy_points.as_ref()
    }

    /// The block's `PEAK TABLE` record, if present.
    pub fn peak_table(&self) -> Option<&PeakTable> {
        self.peak_table.as_ref()
    }

    /// The block's `PEAK ASSIGNMENTS` record, if present.
    pub fn peak_assignments(&self) -> Option<&PeakAssignments> {
        self.peak_assignments.as_ref()
    }

    /// The block's `AUDIT TRAIL` record, if present.
    pub fn audit_trail(&self) -> Option<&AuditTrail> {
        self.audit_trail.as_ref()
    }

    /// The block's `NTUPLES` record, if present.
    pub fn ntuples(&self) -> Option<&NTuples> {
        self.ntuples.as_ref()
    }
}

/// One LDR header plus its fully-accumulated (possibly multi-line) value,
/// with the label already normalised.
pub(crate) struct RawLdr {
    pub label: String,
    pub value: String,
}

/// Reads one LDR starting at the reader's current position (which must
/// already be at an LDR start), joining continuation lines per the
/// soft-wrap convention and stopping at the first pure `$$` comment, the
/// next LDR start, or EOF.
pub(crate) fn read_raw_ldr(reader: &mut TextReader) -> Result<RawLdr> {
    let header_line = reader.read_line()?;
    let (label, mut value) = lex::parse_ldr_start(&header_line)?;

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
        if lex::is_pure_comment(&line) {
            break;
        }
        if value.ends_with('=') {
            value.push_str(&line);
        } else {
            value.push('\n');
            value.push_str(&line);
        }
    }

    Ok(RawLdr { label, value })
}

/// Skips pure `$$`-comment lines, leaving the reader positioned at the next
/// LDR start. Returns `false` at EOF with no LDR start found; any other
/// non-comment content is an [`Kind::UnexpectedContent`] error.
pub(crate) fn skip_to_ldr_or_eof(reader: &mut TextReader, block_title: &str) -> Result<bool> {
    loop {
        if reader.eof() {
            return Ok(false);
        }
        let pos = reader.tell();
        let line = reader.read_line()?;
        if lex::is_ldr_start(&line) {
            reader.seek(pos);
            return Ok(true);
        }
        if lex::is_pure_comment(&line) {
            continue;
        }
        return Err(Error::new(Kind::UnexpectedContent {
            block: block_title.to_string(),
            line,
        }));
    }
}

fn duplicate(block_title: &str, label: &str) -> Error {
    Error::new(Kind::Duplicate {
        block: block_title.to_string(),
        label: label.to_string(),
    })
}

/// Parses the body of a block whose `##TITLE=` value has already been read,
/// up to and including its `##END=`. Used both for the root block and for
/// nested blocks reached via `##DATA TYPE= LINK`.
fn parse_body(title: String, reader: &SharedReader) -> Result<Block> {
    let mut block = Block {
        title,
        ldrs: Vec::new(),
        comments: Vec::new(),
        blocks: Vec::new(),
        xy_data: None,
        ra_data: None,
        xy_points: None,
        peak_table: None,
        peak_assignments: None,
        audit_trail: None,
        ntuples: None,
    };

    loop {
        let found = {
            let mut guard = reader.borrow_mut();
            skip_to_ldr_or_eof(&mut guard, &block.title)?
        };
        if !found {
            return Err(Error::new(Kind::UnexpectedContent {
                block: block.title.clone(),
                line: "<end of input before ##END=>".to_string(),
            }));
        }

        let raw = {
            let mut guard = reader.borrow_mut();
            read_raw_ldr(&mut guard)?
        };

        if raw.label.is_empty() {
            block.comments.push(raw.value);
            continue;
        }

        match raw.label.as_str() {
            "END" => break,
            "TITLE" => {
                let nested = parse_body(raw.value, reader)?;
                block.blocks.push(nested);
            }
            "XYDATA" => {
                if block.xy_data.is_some() {
                    return Err(duplicate(&block.title, "XYDATA"));
                }
                block.xy_data = Some(XyData::new(raw.value, Rc::clone(reader), &block.ldrs)?);
            }
            "RADATA" => {
                if block.ra_data.is_some() {
                    return Err(duplicate(&block.title, "RADATA"));
                }
                block.ra_data = Some(RaData::new(raw.value, Rc::clone(reader), &block.ldrs)?);
            }
            "XYPOINTS" => {
                if block.xy_points.is_some() {
                    return Err(duplicate(&block.title, "XYPOINTS"));
                }
                block.xy_points = Some(XyPoints::new(raw.value, Rc::clone(reader), &block.ldrs)?);
            }
            "PEAKTABLE" => {
                if block.peak_table.is_some() {
                    return Err(duplicate(&block.title, "PEAKTABLE"));
                }
                block.peak_table =
                    Some(PeakTable::new(raw.value, Rc::clone(reader), &block.ldrs)?);
            }
            "PEAKASSIGNMENTS" => {
                if block.peak_assignments.is_some() {
                    return Err(duplicate(&block.title, "PEAKASSIGNMENTS"));
                }
                block.peak_assignments =
                    Some(PeakAssignments::new(raw.value, Rc::clone(reader), &block.ldrs)?);
            }
            "AUDITTRAIL" => {
                if block.audit_trail.is_some() {
                    return Err(duplicate(&block.title, "AUDITTRAIL"));
                }
                block.audit_trail =
                    Some(AuditTrail::new(raw.value, Rc::clone(reader), &block.ldrs)?);
            }
            "NTUPLES" => {
                if block.ntuples.is_some() {
                    return Err(duplicate(&block.title, "NTUPLES"));
                }
                block.ntuples = Some(NTuples::new(raw.value, Rc::clone(reader), &block.ldrs)?);
            }
            label => {
                if block.ldrs.iter().any(|ldr| ldr.label == label) {
                    return Err(duplicate(&block.title, label));
                }
                block.ldrs.push(StringLdr {
                    label: label.to_string(),
                    value: raw.value,
                });
            }
        }
    }

    Ok(block)
}

/// Parses a complete JCAMP-DX document from `reader`, which must be
/// positioned at (or before) its first `##TITLE=`.
pub fn parse(mut reader: TextReader) -> Result<Block> {
    let title = {
        if !skip_to_ldr_or_eof(&mut reader, "<document>")? {
            return Err(Error::new(Kind::UnexpectedContent {
                block: "<document>".to_string(),
                line: "<empty input>".to_string(),
            }));
        }
        let raw = read_raw_ldr(&mut reader)?;
        if raw.label != "TITLE" {
            return Err(Error::new(Kind::UnexpectedContent {
                block: "<document>".to_string(),
                line: format!("expected ##TITLE=, found ##{}=", raw.label),
            }));
        }
        raw.value
    };

    let shared: SharedReader = Rc::new(RefCell::new(reader));
    parse_body(title, &shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> Result<Block> {
        parse(TextReader::from_bytes(text.as_bytes().to_vec()))
    }

    #[test]
    fn minimal_block_has_no_ldrs_beyond_title() {
        let block = parse_str("##TITLE= sample\n##END=\n").unwrap();
        assert_eq!(block.title(), "sample");
        assert!(block.ldrs().is_empty());
    }

    #[test]
    fn standard_ldrs_are_collected() {
        let block = parse_str("##TITLE= sample\n##ORIGIN= somewhere\n##END=\n").unwrap();
        assert_eq!(block.ldr("ORIGIN").unwrap().value(), "somewhere");
    }

    #[test]
    fn duplicate_standard_ldr_is_an_error() {
        let result = parse_str("##TITLE= sample\n##ORIGIN= a\n##ORIGIN= b\n##END=\n");
        assert!(result.is_err());
    }

    #[test]
    fn soft_wrap_continuation_joins_without_newline() {
        let block = parse_str("##TITLE= sample\n##LONGDATE=2023/01/01 =\n01:02:03\n##END=\n").unwrap();
        assert_eq!(block.ldr("LONGDATE").unwrap().value(), "2023/01/01 =01:02:03");
    }

    #[test]
    fn plain_continuation_joins_with_newline() {
        let block = parse_str("##TITLE= sample\n##COMMENT=line one\nline two\n##END=\n").unwrap();
        assert_eq!(block.ldr("COMMENT").unwrap().value(), "line one\nline two");
    }

    #[test]
    fn pure_comment_terminates_continuation() {
        let block =
            parse_str("##TITLE= sample\n##COMMENT=line one\n$$ a comment\nline two\n##END=\n")
                .unwrap();
        assert_eq!(block.ldr("COMMENT").unwrap().value(), "line one");
    }

    #[test]
    fn block_level_comment_is_collected() {
        let block = parse_str("##TITLE= sample\n##= a note\n##END=\n").unwrap();
        assert_eq!(block.block_comments(), ["a note".to_string()]);
    }

    #[test]
    fn nested_link_blocks_are_parsed() {
        let text = "##TITLE= outer\n##DATA TYPE= LINK\n\
                    ##TITLE= inner one\n##END=\n\
                    ##TITLE= inner two\n##END=\n\
                    ##END=\n";
        let block = parse_str(text).unwrap();
        assert_eq!(block.nested_blocks().len(), 2);
        assert_eq!(block.nested_blocks()[0].title(), "inner one");
        assert_eq!(block.nested_blocks()[1].title(), "inner two");
    }

    #[test]
    fn xydata_is_parsed_and_materialises() {
        let text = "##TITLE= sample\n##XUNITS= 1/CM\n##YUNITS= A\n##FIRSTX= 450\n\
                    ##LASTX= 451\n##XFACTOR= 1\n##YFACTOR= 1\n##NPOINTS= 2\n\
                    ##XYDATA= (X++(Y..Y))\n450 10 11\n##END=\n";
        let block = parse_str(text).unwrap();
        let data = block.xy_data().unwrap().get_data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].x, 450.0);
        assert_eq!(data[1].y, 11.0);
    }

    #[test]
    fn unexpected_content_between_ldrs_is_an_error() {
        let result = parse_str("##TITLE= sample\nnot an ldr or comment\n##END=\n");
        assert!(result.is_err());
    }
}
