//! The `XYDATA` record: `(X++(Y..Y))`, a spaced-abscissa Y-sample table.

use crate::block::StringLdr;
use crate::records::{
    fail_if_missing, optional_f64, required_f64, required_string, required_usize, with_body,
    SharedReader,
};
use crate::xy::{self, Point};
use crate::Result;

/// Numeric attributes of an XYDATA record, derived from the enclosing
/// block's LDRs.
///
/// `x_units`/`y_units` and the extrema are not needed to decode the data,
/// only to display it; `first_x`, `last_x`, `x_factor`, `y_factor`, and
/// `n_points` are required to reconstruct it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XyParameters {
    /// `##XUNITS=`.
    pub x_units: String,
    /// `##YUNITS=`.
    pub y_units: String,
    /// `##FIRSTX=`.
    pub first_x: f64,
    /// `##LASTX=`.
    pub last_x: f64,
    /// `##XFACTOR=`. Not applied during abscissa reconstruction: FIRSTX and
    /// LASTX are already the scaled values (see DESIGN.md).
    pub x_factor: f64,
    /// `##YFACTOR=`, applied to every decoded Y sample.
    pub y_factor: f64,
    /// `##NPOINTS=`.
    pub n_points: usize,
    /// `##FIRSTY=`.
    pub first_y: Option<f64>,
    /// `##MAXX=`.
    pub max_x: Option<f64>,
    /// `##MINX=`.
    pub min_x: Option<f64>,
    /// `##MAXY=`.
    pub max_y: Option<f64>,
    /// `##MINY=`.
    pub min_y: Option<f64>,
    /// `##RESOLUTION=`.
    pub resolution: Option<f64>,
    /// `##DELTAX=`.
    pub delta_x: Option<f64>,
}

impl XyParameters {
    fn parse(ldrs: &[StringLdr]) -> Result<Self> {
        Self::parse_for("XYDATA", ldrs)
    }

    /// Parses the same XYDATA parameter set under a different record name,
    /// for [`Kind::MissingRequired`] messages. Used by XYPOINTS, which
    /// shares this exact parameter set with XYDATA (see the reference
    /// decoder's `XyBase::parseParameters`).
    pub(crate) fn parse_for(record: &str, ldrs: &[StringLdr]) -> Result<Self> {
        let mut missing = Vec::new();
        let parameters = Self {
            x_units: required_string(ldrs, "XUNITS", &mut missing),
            y_units: required_string(ldrs, "YUNITS", &mut missing),
            first_x: required_f64(ldrs, "FIRSTX", &mut missing),
            last_x: required_f64(ldrs, "LASTX", &mut missing),
            x_factor: required_f64(ldrs, "XFACTOR", &mut missing),
            y_factor: required_f64(ldrs, "YFACTOR", &mut missing),
            n_points: required_usize(ldrs, "NPOINTS", &mut missing),
            first_y: optional_f64(ldrs, "FIRSTY"),
            max_x: optional_f64(ldrs, "MAXX"),
            min_x: optional_f64(ldrs, "MINX"),
            max_y: optional_f64(ldrs, "MAXY"),
            min_y: optional_f64(ldrs, "MINY"),
            resolution: optional_f64(ldrs, "RESOLUTION"),
            delta_x: optional_f64(ldrs, "DELTAX"),
        };
        fail_if_missing(record, missing)?;
        Ok(parameters)
    }
}

/// A JCAMP-DX `XYDATA` record: `(X++(Y..Y))`.
#[derive(Debug)]
pub struct XyData {
    variable_list: String,
    parameters: XyParameters,
    reader: SharedReader,
    body_offset: usize,
}

impl XyData {
    pub(crate) fn new(
        variable_list: String,
        reader: SharedReader,
        block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        crate::records::validate_variable_list("XYDATA", &variable_list, &["(X++(Y..Y))"])?;
        let parameters = XyParameters::parse(block_ldrs)?;
        let body_offset = reader.borrow().tell();
        reader.borrow_mut().skip_to_next_ldr()?;
        Ok(Self {
            variable_list,
            parameters,
            reader,
            body_offset,
        })
    }

    /// The record's variable list, e.g. `"(X++(Y..Y))"`.
    pub fn variable_list(&self) -> &str {
        &self.variable_list
    }

    /// The numeric parameters used to decode and reconstruct this record.
    pub fn parameters(&self) -> &XyParameters {
        &self.parameters
    }

    /// Decodes the data body into ordered `(x, y)` samples.
    pub fn get_data(&self) -> Result<Vec<Point>> {
        with_body(&self.reader, self.body_offset, |reader| {
            let y_raw = xy::read_xpp_yy_body(reader)?;
            xy::reconstruct(
                &y_raw,
                self.parameters.first_x,
                self.parameters.last_x,
                self.parameters.y_factor,
                self.parameters.n_points,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TextReader;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ldr(label: &str, value: &str) -> StringLdr {
        StringLdr::new(label.to_string(), value.to_string())
    }

    #[test]
    fn decodes_spaced_abscissa_samples() {
        let reader = Rc::new(RefCell::new(TextReader::from_bytes(
            b"450 10 11 12\n##END=\n".to_vec(),
        )));
        let ldrs = vec![
            ldr("XUNITS", "1/CM"),
            ldr("YUNITS", "A"),
            ldr("FIRSTX", "450"),
            ldr("LASTX", "452"),
            ldr("XFACTOR", "1"),
            ldr("YFACTOR", "1"),
            ldr("NPOINTS", "3"),
        ];
        let record = XyData::new("(X++(Y..Y))".to_string(), reader, &ldrs).unwrap();
        let points = record.get_data().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], Point { x: 450.0, y: 10.0 });
        assert_eq!(points[2], Point { x: 452.0, y: 12.0 });
    }

    #[test]
    fn missing_required_ldr_is_an_error() {
        let reader = Rc::new(RefCell::new(TextReader::from_bytes(
            b"450 10 11\n##END=\n".to_vec(),
        )));
        let ldrs = vec![ldr("XUNITS", "1/CM")];
        assert!(XyData::new("(X++(Y..Y))".to_string(), reader, &ldrs).is_err());
    }

    #[test]
    fn wrong_variable_list_is_rejected() {
        let reader = Rc::new(RefCell::new(TextReader::from_bytes(
            b"450 10 11\n##END=\n".to_vec(),
        )));
        assert!(XyData::new("(XY..XY)".to_string(), reader, &[]).is_err());
    }
}
