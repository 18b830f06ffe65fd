//! The `PEAK ASSIGNMENTS` record: `(XYA)`, `(XYWA)`, `(XYMA)`, or `(XYMWA)`.

use crate::block::StringLdr;
use crate::error::{Error, Kind};
use crate::records::model::PeakAssignment;
use crate::records::{with_body, SharedReader};
use crate::tuple::{self, parse_double_token};
use crate::Result;
use std::sync::LazyLock;

/// Matches 2 - 5 comma-separated segments as groups 1-5, corresponding to
/// one of `(X[, Y][, W], A)`, `(X[, Y][, M], A)`, `(X[, Y][, M][, W], A)`,
/// with X as group 1 and A as group 5. Which of groups 2-4 may legally
/// participate (and which combination of absences is an error) depends on
/// the record's variable list; see [`parse_assignment`].
static PEAK_ASSIGNMENT_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?s)^\s*\(\s*([^,]*)(?:\s*,\s*([^,]*))?(?:\s*,\s*([^,]*))?(?:\s*,\s*([^,]*))?\s*,\s*<(.*)>\s*\)\s*$",
    )
    .unwrap()
});

/// A JCAMP-DX `PEAK ASSIGNMENTS` record.
#[derive(Debug)]
pub struct PeakAssignments {
    variable_list: String,
    reader: SharedReader,
    body_offset: usize,
}

impl PeakAssignments {
    pub(crate) fn new(
        variable_list: String,
        reader: SharedReader,
        _block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        crate::records::validate_variable_list(
            "PEAK ASSIGNMENTS",
            &variable_list,
            &["(XYA)", "(XYWA)", "(XYMA)", "(XYMWA)"],
        )?;
        let body_offset = reader.borrow().tell();
        reader.borrow_mut().skip_to_next_ldr()?;
        Ok(Self {
            variable_list,
            reader,
            body_offset,
        })
    }

    /// The record's variable list.
    pub fn variable_list(&self) -> &str {
        &self.variable_list
    }

    /// Decodes every tuple into a [`PeakAssignment`], in file order.
    pub fn get_data(&self) -> Result<Vec<PeakAssignment>> {
        let variable_list = self.variable_list.trim().to_string();
        with_body(&self.reader, self.body_offset, |reader| {
            let mut assignments = Vec::new();
            while let Some(tuple) =
                tuple::next_multiline_tuple(reader, " ", "peak assignments")?
            {
                assignments.push(parse_assignment(&tuple, &variable_list)?);
            }
            Ok(assignments)
        })
    }
}

/// Decodes one `(...)`-delimited tuple against `variable_list`.
///
/// Groups 2-4 of [`PEAK_ASSIGNMENT_RE`] are independently optional, so a
/// capture group can be in one of two distinct states: it did not
/// participate in the match at all (the field was omitted, `None`), or it
/// participated and captured an empty string (the field is present but
/// blank, `Some(NaN)` once parsed). Only the former maps to a `None` field
/// on [`PeakAssignment`]; which shapes of presence/absence are legal (vs.
/// illegal or ambiguous) depends on `variable_list`, mirroring the source's
/// per-variable-list error map.
fn parse_assignment(tuple: &str, variable_list: &str) -> Result<PeakAssignment> {
    let syntax_error = || {
        Error::new(Kind::TupleSyntax {
            details: format!("malformed peak assignment entry: {tuple:?}"),
        })
    };
    let illegal = || {
        Error::new(Kind::TupleSyntax {
            details: format!("illegal peak assignments entry for {variable_list}: {tuple:?}"),
        })
    };
    let ambiguous = || {
        Error::new(Kind::TupleSyntax {
            details: format!("ambiguous peak assignments entry for {variable_list}: {tuple:?}"),
        })
    };

    let caps = PEAK_ASSIGNMENT_RE.captures(tuple).ok_or_else(syntax_error)?;
    let y = caps.get(2);
    let third = caps.get(3);
    let fourth = caps.get(4);

    let mut assignment = PeakAssignment {
        x: parse_double_token(caps.get(1).map(|m| m.as_str()))?,
        y: None,
        m: None,
        w: None,
        a: caps.get(5).map(|m| m.as_str()).unwrap_or_default().to_string(),
    };

    match variable_list {
        "(XYA)" => {
            if third.is_some() || fourth.is_some() {
                return Err(illegal());
            }
            if let Some(y) = y {
                assignment.y = Some(parse_double_token(Some(y.as_str()))?);
            }
        }
        "(XYWA)" => {
            if fourth.is_some() {
                return Err(illegal());
            }
            if y.is_some() && third.is_none() {
                return Err(ambiguous());
            }
            if let (Some(y), Some(w)) = (y, third) {
                assignment.y = Some(parse_double_token(Some(y.as_str()))?);
                assignment.w = Some(parse_double_token(Some(w.as_str()))?);
            }
        }
        "(XYMA)" => {
            if fourth.is_some() {
                return Err(illegal());
            }
            if y.is_some() && third.is_none() {
                return Err(ambiguous());
            }
            if let (Some(y), Some(m)) = (y, third) {
                assignment.y = Some(parse_double_token(Some(y.as_str()))?);
                let m = m.as_str().trim();
                assignment.m = (!m.is_empty()).then(|| m.to_string());
            }
        }
        "(XYMWA)" => {
            let all_present = y.is_some() && third.is_some() && fourth.is_some();
            let any_present = y.is_some() || third.is_some() || fourth.is_some();
            if any_present && !all_present {
                return Err(ambiguous());
            }
            if let (Some(y), Some(m), Some(w)) = (y, third, fourth) {
                assignment.y = Some(parse_double_token(Some(y.as_str()))?);
                let m = m.as_str().trim();
                assignment.m = (!m.is_empty()).then(|| m.to_string());
                assignment.w = Some(parse_double_token(Some(w.as_str()))?);
            }
        }
        _ => return Err(syntax_error()),
    }

    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TextReader;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn shared(text: &str) -> SharedReader {
        Rc::new(RefCell::new(TextReader::from_bytes(
            format!("{text}\n##END=\n").into_bytes(),
        )))
    }

    #[test]
    fn xya_tuples_are_parsed() {
        let reader = shared("(450.0, 10.0, <C=O str>)\n(460.0, 11.0, <CH bend>)");
        let record = PeakAssignments::new("(XYA)".to_string(), reader, &[]).unwrap();
        let data = record.get_data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].x, 450.0);
        assert_eq!(data[0].a, "C=O str");
        assert_eq!(data[1].a, "CH bend");
    }

    #[test]
    fn xymwa_tuple_spanning_lines() {
        let reader = shared("(450.0, 10.0, S,\n1.5, <C=O str>)");
        let record = PeakAssignments::new("(XYMWA)".to_string(), reader, &[]).unwrap();
        let data = record.get_data().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].m.as_deref(), Some("S"));
        assert_eq!(data[0].w, Some(1.5));
        assert_eq!(data[0].a, "C=O str");
    }

    #[test]
    fn illegal_variable_list_is_rejected() {
        let reader = shared("(450.0, 10.0, <x>)");
        assert!(PeakAssignments::new("(XY)".to_string(), reader, &[]).is_err());
    }

    #[test]
    fn xya_omitted_y_is_none_blank_y_is_some_nan() {
        let reader = shared(
            "(1.0, 10.0, <peak assignment 1>)\n\
             (3.0, <peak assignment 3>)\n\
             (4.0, , <peak assignment 4>)",
        );
        let record = PeakAssignments::new("(XYA)".to_string(), reader, &[]).unwrap();
        let data = record.get_data().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0].y, Some(10.0));
        assert_eq!(data[1].y, None);
        assert!(data[2].y.unwrap().is_nan());
    }

    #[test]
    fn xywa_omitted_pair_is_none_blank_pair_is_some_nan() {
        let reader = shared(
            "(1.0, 10.0, 100.0, <peak assignment 1>)\n\
             (3.0, <peak assignment 3>)\n\
             (4.0, ,, <peak assignment 4>)\n\
             (6.0, 60.0, , <peak assignment 6>)",
        );
        let record = PeakAssignments::new("(XYWA)".to_string(), reader, &[]).unwrap();
        let data = record.get_data().unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(data[0].y, Some(10.0));
        assert_eq!(data[0].w, Some(100.0));
        assert_eq!(data[1].y, None);
        assert_eq!(data[1].w, None);
        assert!(data[2].y.unwrap().is_nan());
        assert!(data[2].w.unwrap().is_nan());
        assert_eq!(data[3].y, Some(60.0));
        assert!(data[3].w.unwrap().is_nan());
    }

    #[test]
    fn xywa_y_without_w_is_ambiguous() {
        let reader = shared("(1.0, 10.0, <peak assignment 1>)");
        let record = PeakAssignments::new("(XYWA)".to_string(), reader, &[]).unwrap();
        assert!(record.get_data().is_err());
    }

    #[test]
    fn xya_excess_component_is_illegal() {
        let reader = shared("(1.0, 10.0, 100.0, <peak assignment 1>)");
        let record = PeakAssignments::new("(XYA)".to_string(), reader, &[]).unwrap();
        assert!(record.get_data().is_err());
    }
}
