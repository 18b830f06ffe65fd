//! Typed wrappers for the JCAMP-DX "special" LDRs: XYDATA, RADATA, XYPOINTS,
//! PEAK TABLE, PEAK ASSIGNMENTS, AUDIT TRAIL, and NTUPLES.
//!
//! Every record constructor validates its label and variable list, derives
//! any numeric parameters from the surrounding block's LDRs eagerly, and
//! defers decoding the data body itself to `get_data()`. The reader is
//! shared (`Rc<RefCell<TextReader>>`) between the owning [`Block`](crate::block::Block)
//! and every record and nested block it contains, per the ownership
//! decision recorded in `DESIGN.md`.

pub mod audit_trail;
pub mod model;
pub mod ntuples;
pub mod peak_assignments;
pub mod peak_table;
pub mod ra_data;
pub mod xy_data;
pub mod xy_points;

pub use audit_trail::AuditTrail;
pub use model::{AuditTrailEntry, Peak, PeakAssignment};
pub use ntuples::{AxisAttributes, DataTable, NTuples, NTuplesAttributes, Page};
pub use peak_assignments::PeakAssignments;
pub use peak_table::PeakTable;
pub use ra_data::{RaData, RaParameters};
pub use xy_data::{XyData, XyParameters};
pub use xy_points::XyPoints;

use crate::error::{Error, Kind};
use crate::reader::TextReader;
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// The reader shared between a [`Block`](crate::block::Block), its nested
/// blocks, and every record it holds.
pub(crate) type SharedReader = Rc<RefCell<TextReader>>;

/// Runs `f` with the reader seeked to `offset`, restoring the reader's prior
/// position afterwards whether or not `f` succeeds.
///
/// This is the scoped acquire/seek/decode/restore pattern §5 and §9 of the
/// design call for: a record's `get_data()` must leave the reader exactly
/// where it found it.
pub(crate) fn with_body<T>(
    reader: &SharedReader,
    offset: usize,
    f: impl FnOnce(&mut TextReader) -> Result<T>,
) -> Result<T> {
    let mut reader = reader.borrow_mut();
    let saved = reader.tell();
    reader.seek(offset);
    let result = f(&mut reader);
    reader.seek(saved);
    result
}

/// Looks up the (already-normalised) label `label` in `ldrs`, returning its
/// string value.
pub(crate) fn find_ldr<'a>(ldrs: &'a [crate::block::StringLdr], label: &str) -> Option<&'a str> {
    ldrs.iter()
        .find(|ldr| ldr.label() == label)
        .map(|ldr| ldr.value())
}

/// Parses a required numeric parameter LDR, collecting its label into
/// `missing` if absent rather than failing immediately: record parameter
/// parsing collects every missing label before reporting
/// [`Kind::MissingRequired`], so a caller sees the complete list in one
/// error rather than one at a time.
pub(crate) fn required_f64(
    ldrs: &[crate::block::StringLdr],
    label: &str,
    missing: &mut Vec<String>,
) -> f64 {
    match find_ldr(ldrs, label).and_then(|v| v.trim().parse::<f64>().ok()) {
        Some(value) => value,
        None => {
            missing.push(label.to_string());
            f64::NAN
        }
    }
}

/// Parses a required unsigned integer parameter LDR, same collecting
/// behaviour as [`required_f64`].
pub(crate) fn required_usize(
    ldrs: &[crate::block::StringLdr],
    label: &str,
    missing: &mut Vec<String>,
) -> usize {
    match find_ldr(ldrs, label).and_then(|v| v.trim().parse::<usize>().ok()) {
        Some(value) => value,
        None => {
            missing.push(label.to_string());
            0
        }
    }
}

/// Parses a required string parameter LDR, same collecting behaviour as
/// [`required_f64`].
pub(crate) fn required_string(
    ldrs: &[crate::block::StringLdr],
    label: &str,
    missing: &mut Vec<String>,
) -> String {
    match find_ldr(ldrs, label) {
        Some(value) => value.trim().to_string(),
        None => {
            missing.push(label.to_string());
            String::new()
        }
    }
}

pub(crate) fn optional_f64(ldrs: &[crate::block::StringLdr], label: &str) -> Option<f64> {
    find_ldr(ldrs, label).and_then(|v| v.trim().parse::<f64>().ok())
}

pub(crate) fn optional_string(ldrs: &[crate::block::StringLdr], label: &str) -> Option<String> {
    find_ldr(ldrs, label).map(|v| v.trim().to_string())
}

pub(crate) fn fail_if_missing(record: &str, missing: Vec<String>) -> Result<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::new(Kind::MissingRequired {
            record: record.to_string(),
            labels: missing,
        }))
    }
}

/// Validates `variable_list` (trimmed) against an allow-list, returning
/// [`Kind::IllegalVariableList`] if it isn't a member.
pub(crate) fn validate_variable_list(
    record: &str,
    variable_list: &str,
    allowed: &[&str],
) -> Result<()> {
    let trimmed = variable_list.trim();
    if allowed.iter().any(|&candidate| candidate == trimmed) {
        Ok(())
    } else {
        Err(Error::new(Kind::IllegalVariableList {
            record: record.to_string(),
            variable_list: variable_list.to_string(),
        }))
    }
}
