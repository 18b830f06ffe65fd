//! Applies [`asdf::decode_line`](crate::asdf::decode_line) across a record's
//! body: reassembles abscissae from FIRSTX/LASTX/NPOINTS, enforces
//! cross-line Y-checks, and parses the plain `(XY..XY)` pair form.

use crate::asdf;
use crate::error::{Error, Kind};
use crate::lex;
use crate::reader::TextReader;
use crate::Result;

/// A decoded `(x, y)` sample. `NaN` in either position represents an
/// explicitly missing value (a `?` token).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// The abscissa.
    pub x: f64,
    /// The ordinate.
    pub y: f64,
}

/// Reads raw Y-samples from a `(X++(Y..Y))`-shaped body (and its R/I
/// variants), starting at the reader's current position, up to the next LDR
/// start. Leaves the reader positioned at that next LDR start.
///
/// This is the shared core of XYDATA/RADATA/NTUPLES `(X++(Y..Y))` pages; the
/// leading abscissa of each line is dropped (the spec-documented but
/// unenforced X-value check, see DESIGN.md) and the inter-line Y-checksum is
/// applied whenever the previous line ended with a DIF-form token.
pub fn read_xpp_yy_body(reader: &mut TextReader) -> Result<Vec<f64>> {
    let mut y_values: Vec<f64> = Vec::new();
    let mut y_check: Option<f64> = None;
    let mut pos = reader.tell();

    loop {
        let line = reader.read_line()?;
        if lex::is_ldr_start(&line) {
            reader.seek(pos);
            break;
        }
        pos = reader.tell();

        let (content, _) = lex::strip_line_comment(&line, true, true);
        let (mut line_values, dif_encoded) = asdf::decode_line(&content)?;
        if !line_values.is_empty() {
            line_values.remove(0);
        }

        if let Some(check) = y_check {
            if !line_values.is_empty() && (line_values[0] - check).abs() >= 1.0 {
                return Err(Error::new(Kind::YCheck {
                    previous: check,
                    checksum: line_values[0],
                }));
            }
            y_values.pop();
        }

        y_values.extend(&line_values);

        y_check = if !dif_encoded || line_values.is_empty() {
            None
        } else if line_values.len() == 1 && line_values[0].is_nan() {
            None
        } else if line_values.len() >= 2
            && (line_values[line_values.len() - 1].is_nan()
                || line_values[line_values.len() - 2].is_nan())
        {
            None
        } else {
            Some(*line_values.last().unwrap())
        };
    }

    Ok(y_values)
}

/// Reads `(XY..XY)` pairs starting at the reader's current position, up to
/// the next LDR start. Leaves the reader positioned at that next LDR start.
///
/// `?` as an X value is an error; `?` as a Y value yields NaN. An odd number
/// of total values is a [`Kind::TupleSyntax`] error.
pub fn read_xy_xy_body(reader: &mut TextReader) -> Result<Vec<Point>> {
    let mut points: Vec<Point> = Vec::new();
    let mut last_is_x_only = false;
    let mut pos = reader.tell();

    loop {
        let line = reader.read_line()?;
        if lex::is_ldr_start(&line) {
            reader.seek(pos);
            break;
        }
        pos = reader.tell();

        let (content, _) = lex::strip_line_comment(&line, true, true);
        let (values, _dif_encoded) = asdf::decode_line(&content)?;

        for value in values {
            if last_is_x_only {
                points.last_mut().unwrap().y = value;
                last_is_x_only = false;
            } else {
                if value.is_nan() {
                    return Err(Error::new(Kind::TupleSyntax {
                        details: format!("NaN encountered as x value in line: {line:?}"),
                    }));
                }
                points.push(Point { x: value, y: f64::NAN });
                last_is_x_only = true;
            }
        }
    }

    if last_is_x_only {
        return Err(Error::new(Kind::TupleSyntax {
            details: "uneven number of values for (XY..XY) data".to_string(),
        }));
    }

    Ok(points)
}

/// Reconstructs abscissae for a spaced-abscissa record (`(X++(Y..Y))` and
/// its R/I variants) from raw Y-samples and FIRSTX/LASTX/NPOINTS, applying
/// `y_factor`.
///
/// Per the single-point formula preserved from the reference decoder, when
/// `n_points == 1` the sole abscissa is exactly `first_x`.
pub fn reconstruct(
    y_raw: &[f64],
    first_x: f64,
    last_x: f64,
    y_factor: f64,
    n_points: usize,
) -> Result<Vec<Point>> {
    if y_raw.len() != n_points {
        return Err(Error::new(Kind::NPointsMismatch {
            expected: n_points,
            actual: y_raw.len(),
        }));
    }
    if n_points == 0 {
        return Ok(Vec::new());
    }
    let (numerator, denominator) = if n_points == 1 {
        (first_x, 1.0)
    } else {
        (last_x - first_x, (n_points - 1) as f64)
    };
    Ok(y_raw
        .iter()
        .enumerate()
        .map(|(i, &y)| Point {
            x: first_x + numerator / denominator * i as f64,
            y: y_factor * y,
        })
        .collect())
}
