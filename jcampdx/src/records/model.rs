//! Value types shared by the tabular record kinds: PEAK TABLE, PEAK
//! ASSIGNMENTS, and AUDIT TRAIL.
//!
//! [`xy::Point`](crate::xy::Point) is the value type for XYDATA, RADATA,
//! XYPOINTS, and NTUPLES DATA TABLE, and lives alongside the decoder that
//! produces it.

/// One item of a PEAK TABLE.
///
/// `w` and `m` are mutually exclusive: `w` is populated under the
/// `(XYW..XYW)` variable list, `m` under `(XYM..XYM)`; under `(XY..XY)`
/// neither is set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Peak {
    /// Peak position.
    pub x: f64,
    /// Intensity.
    pub y: f64,
    /// Width, under `(XYW..XYW)`.
    pub w: Option<f64>,
    /// Multiplicity (e.g. `"S"`, `"D"`, `"T"`, `"Q"`, `"M"`, `"U"`), under
    /// `(XYM..XYM)`.
    pub m: Option<String>,
}

/// One item of a PEAK ASSIGNMENTS record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakAssignment {
    /// Peak position.
    pub x: f64,
    /// Intensity, where given.
    pub y: Option<f64>,
    /// Multiplicity, under `(XYMA)`/`(XYMWA)`.
    pub m: Option<String>,
    /// Width, under `(XYWA)`/`(XYMWA)`.
    pub w: Option<f64>,
    /// The free-text assignment, originally `<…>`-delimited.
    pub a: String,
}

/// One entry of an AUDIT TRAIL.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuditTrailEntry {
    /// Change number.
    pub number: i64,
    /// Timestamp, as given in the file (not interpreted).
    pub when: String,
    /// Person who made or authorized the change.
    pub who: String,
    /// The person's location.
    pub where_: String,
    /// Process, present for the 7-field variable list.
    pub process: Option<String>,
    /// Software version, present for the 6- and 7-field variable lists.
    pub version: Option<String>,
    /// Details of the change made. May contain embedded newlines.
    pub what: String,
}
