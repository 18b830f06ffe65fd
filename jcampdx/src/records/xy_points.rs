//! The `XYPOINTS` record: `(XY..XY)`, explicit coordinate pairs.

use crate::block::StringLdr;
use crate::error::{Error, Kind};
use crate::records::xy_data::XyParameters;
use crate::records::{with_body, SharedReader};
use crate::xy::{self, Point};
use crate::Result;

/// A JCAMP-DX `XYPOINTS` record: `(XY..XY)`.
///
/// XYPOINTS shares its parameter set with XYDATA (the same required
/// FIRSTX/LASTX/XFACTOR/YFACTOR/NPOINTS LDRs): `XFACTOR` and `YFACTOR` are
/// applied to every parsed pair, and the parsed point count must match
/// `NPOINTS`, matching the reference decoder's `XyBase`/`Array2DData`
/// handling of the `XyXy` encoding. Unlike XYDATA, the parsed abscissae are
/// the data itself rather than being reconstructed from FIRSTX/LASTX.
#[derive(Debug)]
pub struct XyPoints {
    variable_list: String,
    parameters: XyParameters,
    reader: SharedReader,
    body_offset: usize,
}

impl XyPoints {
    pub(crate) fn new(
        variable_list: String,
        reader: SharedReader,
        block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        crate::records::validate_variable_list("XYPOINTS", &variable_list, &["(XY..XY)"])?;
        let parameters = XyParameters::parse_for("XYPOINTS", block_ldrs)?;
        let body_offset = reader.borrow().tell();
        reader.borrow_mut().skip_to_next_ldr()?;
        Ok(Self {
            variable_list,
            parameters,
            reader,
            body_offset,
        })
    }

    /// The record's variable list, always `"(XY..XY)"`.
    pub fn variable_list(&self) -> &str {
        &self.variable_list
    }

    /// The numeric parameters shared with XYDATA; `first_x`/`last_x` are not
    /// used to reconstruct abscissae here, only exposed for reference.
    pub fn parameters(&self) -> &XyParameters {
        &self.parameters
    }

    /// Decodes the data body into `(x, y)` pairs, in file order, with
    /// `XFACTOR`/`YFACTOR` applied.
    pub fn get_data(&self) -> Result<Vec<Point>> {
        with_body(&self.reader, self.body_offset, |reader| {
            let points = xy::read_xy_xy_body(reader)?;
            if points.len() != self.parameters.n_points {
                return Err(Error::new(Kind::NPointsMismatch {
                    expected: self.parameters.n_points,
                    actual: points.len(),
                }));
            }
            Ok(points
                .into_iter()
                .map(|p| Point {
                    x: p.x * self.parameters.x_factor,
                    y: p.y * self.parameters.y_factor,
                })
                .collect())
        })
    }
}
