//! The `RADATA` record: `(R++(A..A))`, the Raman-shift/radial analogue of
//! XYDATA.

use crate::block::StringLdr;
use crate::records::{
    fail_if_missing, optional_f64, required_f64, required_string, required_usize, with_body,
    SharedReader,
};
use crate::xy::{self, Point};
use crate::Result;

/// Numeric attributes of a RADATA record, derived from the enclosing
/// block's LDRs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaParameters {
    /// `##RUNITS=`.
    pub r_units: String,
    /// `##AUNITS=`.
    pub a_units: String,
    /// `##FIRSTR=`.
    pub first_r: f64,
    /// `##LASTR=`.
    pub last_r: f64,
    /// `##RFACTOR=`. Not applied during abscissa reconstruction, as with
    /// XYDATA's XFACTOR.
    pub r_factor: f64,
    /// `##AFACTOR=`, applied to every decoded A sample.
    pub a_factor: f64,
    /// `##NPOINTS=`.
    pub n_points: usize,
    /// `##FIRSTA=`.
    pub first_a: Option<f64>,
    /// `##MAXA=`.
    pub max_a: Option<f64>,
    /// `##MINA=`.
    pub min_a: Option<f64>,
    /// `##RESOLUTION=`.
    pub resolution: Option<f64>,
    /// `##DELTAR=`.
    pub delta_r: Option<f64>,
    /// `##ZDP=`, the zero-data-point index used by some Raman instruments.
    pub zdp: Option<f64>,
    /// `##ALIAS=`.
    pub alias: Option<String>,
}

impl RaParameters {
    fn parse(ldrs: &[StringLdr]) -> Result<Self> {
        let mut missing = Vec::new();
        let parameters = Self {
            r_units: required_string(ldrs, "RUNITS", &mut missing),
            a_units: required_string(ldrs, "AUNITS", &mut missing),
            first_r: required_f64(ldrs, "FIRSTR", &mut missing),
            last_r: required_f64(ldrs, "LASTR", &mut missing),
            r_factor: required_f64(ldrs, "RFACTOR", &mut missing),
            a_factor: required_f64(ldrs, "AFACTOR", &mut missing),
            n_points: required_usize(ldrs, "NPOINTS", &mut missing),
            first_a: optional_f64(ldrs, "FIRSTA"),
            max_a: optional_f64(ldrs, "MAXA"),
            min_a: optional_f64(ldrs, "MINA"),
            resolution: optional_f64(ldrs, "RESOLUTION"),
            delta_r: optional_f64(ldrs, "DELTAR"),
            zdp: optional_f64(ldrs, "ZDP"),
            alias: crate::records::optional_string(ldrs, "ALIAS"),
        };
        fail_if_missing("RADATA", missing)?;
        Ok(parameters)
    }
}

/// A JCAMP-DX `RADATA` record: `(R++(A..A))`.
#[derive(Debug)]
pub struct RaData {
    variable_list: String,
    parameters: RaParameters,
    reader: SharedReader,
    body_offset: usize,
}

impl RaData {
    pub(crate) fn new(
        variable_list: String,
        reader: SharedReader,
        block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        crate::records::validate_variable_list("RADATA", &variable_list, &["(R++(A..A))"])?;
        let parameters = RaParameters::parse(block_ldrs)?;
        let body_offset = reader.borrow().tell();
        reader.borrow_mut().skip_to_next_ldr()?;
        Ok(Self {
            variable_list,
            parameters,
            reader,
            body_offset,
        })
    }

    /// The record's variable list, e.g. `"(R++(A..A))"`.
    pub fn variable_list(&self) -> &str {
        &self.variable_list
    }

    /// The numeric parameters used to decode and reconstruct this record.
    pub fn parameters(&self) -> &RaParameters {
        &self.parameters
    }

    /// Decodes the data body into ordered `(r, a)` samples.
    pub fn get_data(&self) -> Result<Vec<Point>> {
        with_body(&self.reader, self.body_offset, |reader| {
            let a_raw = xy::read_xpp_yy_body(reader)?;
            xy::reconstruct(
                &a_raw,
                self.parameters.first_r,
                self.parameters.last_r,
                self.parameters.a_factor,
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
            b"100 1 2\n##END=\n".to_vec(),
        )));
        let ldrs = vec![
            ldr("RUNITS", "1/CM"),
            ldr("AUNITS", "ARBITRARY UNITS"),
            ldr("FIRSTR", "100"),
            ldr("LASTR", "101"),
            ldr("RFACTOR", "1"),
            ldr("AFACTOR", "1"),
            ldr("NPOINTS", "2"),
        ];
        let record = RaData::new("(R++(A..A))".to_string(), reader, &ldrs).unwrap();
        let points = record.get_data().unwrap();
        assert_eq!(points, vec![Point { x: 100.0, y: 1.0 }, Point { x: 101.0, y: 2.0 }]);
    }

    #[test]
    fn optional_alias_is_carried() {
        let reader = Rc::new(RefCell::new(TextReader::from_bytes(
            b"100 1 2\n##END=\n".to_vec(),
        )));
        let ldrs = vec![
            ldr("RUNITS", "1/CM"),
            ldr("AUNITS", "ARBITRARY UNITS"),
            ldr("FIRSTR", "100"),
            ldr("LASTR", "101"),
            ldr("RFACTOR", "1"),
            ldr("AFACTOR", "1"),
            ldr("NPOINTS", "2"),
            ldr("ALIAS", "(R++(A..A))"),
        ];
        let record = RaData::new("(R++(A..A))".to_string(), reader, &ldrs).unwrap();
        assert_eq!(record.parameters().alias.as_deref(), Some("(R++(A..A))"));
    }
}
