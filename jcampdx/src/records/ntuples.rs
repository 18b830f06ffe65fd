//! The `NTUPLES` record: a container grouping several related data tables
//! (e.g. the real and imaginary components of an NMR spectrum) under a
//! shared per-variable attribute table, with attributes mergeable from the
//! enclosing block down to the individual page.

use crate::block::{read_raw_ldr, skip_to_ldr_or_eof, StringLdr};
use crate::error::{Error, Kind};
use crate::records::{optional_f64, optional_string, with_body, SharedReader};
use crate::xy::{self, Point};
use crate::Result;
use std::rc::Rc;

const KNOWN_COLUMNS: &[&str] = &[
    "VARNAME", "SYMBOL", "VARTYPE", "VARFORM", "VARDIM", "UNITS", "FIRST", "LAST", "MIN", "MAX",
    "FACTOR",
];

fn split_csv(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

/// Per-variable column of the NTUPLES attribute table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NTuplesAttributes {
    /// `##VARNAME=` column for this variable.
    pub var_name: String,
    /// `##SYMBOL=` column, e.g. `"X"`, `"Y"`, `"R"`, `"I"`.
    pub symbol: String,
    /// `##VARTYPE=` column.
    pub var_type: Option<String>,
    /// `##VARFORM=` column.
    pub var_form: Option<String>,
    /// `##VARDIM=` column.
    pub var_dim: Option<usize>,
    /// `##UNITS=` column.
    pub units: Option<String>,
    /// `##FIRST=` column.
    pub first: Option<f64>,
    /// `##LAST=` column.
    pub last: Option<f64>,
    /// `##MIN=` column.
    pub min: Option<f64>,
    /// `##MAX=` column.
    pub max: Option<f64>,
    /// `##FACTOR=` column.
    pub factor: Option<f64>,
    /// Any other attribute-table row's value for this column.
    pub application_attributes: Vec<StringLdr>,
}

fn lookup<'a>(rows: &'a [(String, Vec<String>)], label: &str, index: usize) -> Option<&'a str> {
    rows.iter()
        .find(|(l, _)| l == label)
        .and_then(|(_, values)| values.get(index))
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
}

fn build_attributes(
    columns: &[String],
    rows: &[(String, Vec<String>)],
) -> Vec<NTuplesAttributes> {
    columns
        .iter()
        .enumerate()
        .map(|(i, var_name)| NTuplesAttributes {
            var_name: var_name.clone(),
            symbol: lookup(rows, "SYMBOL", i).unwrap_or_default().to_string(),
            var_type: lookup(rows, "VARTYPE", i).map(str::to_string),
            var_form: lookup(rows, "VARFORM", i).map(str::to_string),
            var_dim: lookup(rows, "VARDIM", i).and_then(|s| s.parse().ok()),
            units: lookup(rows, "UNITS", i).map(str::to_string),
            first: lookup(rows, "FIRST", i).and_then(|s| s.parse().ok()),
            last: lookup(rows, "LAST", i).and_then(|s| s.parse().ok()),
            min: lookup(rows, "MIN", i).and_then(|s| s.parse().ok()),
            max: lookup(rows, "MAX", i).and_then(|s| s.parse().ok()),
            factor: lookup(rows, "FACTOR", i).and_then(|s| s.parse().ok()),
            application_attributes: rows
                .iter()
                .filter(|(label, _)| !KNOWN_COLUMNS.contains(&label.as_str()))
                .filter_map(|(label, values)| {
                    values
                        .get(i)
                        .filter(|v| !v.is_empty())
                        .map(|v| StringLdr::new(label.clone(), v.clone()))
                })
                .collect(),
        })
        .collect()
}

fn find_attribute<'a>(
    attributes: &'a [NTuplesAttributes],
    symbol: &str,
) -> Option<&'a NTuplesAttributes> {
    attributes
        .iter()
        .find(|attr| attr.symbol.trim().eq_ignore_ascii_case(symbol))
}

/// One NTUPLES page: a page-variable expression (e.g. `N=1`), its own LDRs,
/// and an optional `DATA TABLE`.
#[derive(Debug)]
pub struct Page {
    page_variables: String,
    ldrs: Vec<StringLdr>,
    data_table: Option<DataTable>,
}

impl Page {
    /// The page-variable expression following `##PAGE=`, e.g. `"N=1"`.
    pub fn page_variables(&self) -> &str {
        &self.page_variables
    }

    /// LDRs declared within this page.
    pub fn ldrs(&self) -> &[StringLdr] {
        &self.ldrs
    }

    /// This page's `DATA TABLE`, if present.
    pub fn data_table(&self) -> Option<&DataTable> {
        self.data_table.as_ref()
    }
}

fn parse_page(
    page_variables: String,
    reader: &SharedReader,
    attributes: &[NTuplesAttributes],
    block_ldrs: &[StringLdr],
) -> Result<Page> {
    let mut ldrs = Vec::new();
    let mut data_table = None;

    loop {
        let found = skip_to_ldr_or_eof(&mut reader.borrow_mut(), "NTUPLES PAGE")?;
        if !found {
            break;
        }
        let pos = reader.borrow().tell();
        let raw = read_raw_ldr(&mut reader.borrow_mut())?;

        match raw.label.as_str() {
            "PAGE" | "ENDNTUPLES" => {
                reader.borrow_mut().seek(pos);
                break;
            }
            "DATATABLE" => {
                if data_table.is_some() {
                    return Err(Error::new(Kind::Duplicate {
                        block: "NTUPLES PAGE".to_string(),
                        label: "DATATABLE".to_string(),
                    }));
                }
                data_table = Some(DataTable::new(
                    raw.value,
                    Rc::clone(reader),
                    attributes,
                    &ldrs,
                    block_ldrs,
                )?);
            }
            label => {
                ldrs.push(StringLdr::new(label.to_string(), raw.value));
            }
        }
    }

    Ok(Page {
        page_variables,
        ldrs,
        data_table,
    })
}

fn split_plot_descriptor(raw: &str) -> (String, Option<String>) {
    match raw.find(',') {
        Some(idx) => (
            raw[..idx].trim().to_string(),
            Some(raw[idx + 1..].trim().to_string()),
        ),
        None => (raw.trim().to_string(), None),
    }
}

fn dependent_symbol_of(variable_list: &str) -> Option<&'static str> {
    match variable_list {
        "(X++(Y..Y))" => Some("Y"),
        "(X++(R..R))" => Some("R"),
        "(X++(I..I))" => Some("I"),
        _ => None,
    }
}

/// Merged numeric attributes for one axis (independent or dependent) of a
/// `DATA TABLE`, combining the NTUPLES attribute table with the enclosing
/// page's and block's LDRs. Precedence (lowest to highest): block LDRs,
/// NTUPLES-level attribute, page-level LDR.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisAttributes {
    /// The merged units string.
    pub units: Option<String>,
    /// The merged first-value.
    pub first: Option<f64>,
    /// The merged last-value.
    pub last: Option<f64>,
    /// The merged scale factor.
    pub factor: Option<f64>,
    /// The merged minimum.
    pub min: Option<f64>,
    /// The merged maximum.
    pub max: Option<f64>,
}

fn merge_string(
    page_ldrs: &[StringLdr],
    page_label: &str,
    ntuples_value: Option<&str>,
    block_ldrs: &[StringLdr],
    block_label: &str,
) -> Option<String> {
    optional_string(page_ldrs, page_label)
        .or_else(|| ntuples_value.map(str::to_string))
        .or_else(|| optional_string(block_ldrs, block_label))
}

fn merge_f64(
    page_ldrs: &[StringLdr],
    page_label: &str,
    ntuples_value: Option<f64>,
    block_ldrs: &[StringLdr],
    block_label: &str,
) -> Option<f64> {
    optional_f64(page_ldrs, page_label)
        .or(ntuples_value)
        .or_else(|| optional_f64(block_ldrs, block_label))
}

fn merge_axis(
    attribute: Option<&NTuplesAttributes>,
    page_ldrs: &[StringLdr],
    block_ldrs: &[StringLdr],
    page_prefix: &str,
    block_prefix: &str,
) -> AxisAttributes {
    AxisAttributes {
        units: merge_string(
            page_ldrs,
            &format!("{page_prefix}UNITS"),
            attribute.and_then(|a| a.units.as_deref()),
            block_ldrs,
            &format!("{block_prefix}UNITS"),
        ),
        first: merge_f64(
            page_ldrs,
            &format!("FIRST{page_prefix}"),
            attribute.and_then(|a| a.first),
            block_ldrs,
            &format!("FIRST{block_prefix}"),
        ),
        last: merge_f64(
            page_ldrs,
            &format!("LAST{page_prefix}"),
            attribute.and_then(|a| a.last),
            block_ldrs,
            &format!("LAST{block_prefix}"),
        ),
        factor: merge_f64(
            page_ldrs,
            &format!("{page_prefix}FACTOR"),
            attribute.and_then(|a| a.factor),
            block_ldrs,
            &format!("{block_prefix}FACTOR"),
        ),
        min: merge_f64(
            page_ldrs,
            &format!("MIN{page_prefix}"),
            attribute.and_then(|a| a.min),
            block_ldrs,
            &format!("MIN{block_prefix}"),
        ),
        max: merge_f64(
            page_ldrs,
            &format!("MAX{page_prefix}"),
            attribute.and_then(|a| a.max),
            block_ldrs,
            &format!("MAX{block_prefix}"),
        ),
    }
}

/// One `DATA TABLE` inside an NTUPLES page: `(X++(Y..Y))`, `(X++(R..R))`,
/// `(X++(I..I))`, or `(XY..XY)`.
#[derive(Debug)]
pub struct DataTable {
    variable_list: String,
    plot_descriptor: Option<String>,
    x: AxisAttributes,
    y: AxisAttributes,
    reader: SharedReader,
    body_offset: usize,
}

impl DataTable {
    pub(crate) fn new(
        raw_value: String,
        reader: SharedReader,
        attributes: &[NTuplesAttributes],
        page_ldrs: &[StringLdr],
        block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        let (variable_list, plot_descriptor) = split_plot_descriptor(&raw_value);
        crate::records::validate_variable_list(
            "NTUPLES DATA TABLE",
            &variable_list,
            &["(X++(Y..Y))", "(X++(R..R))", "(X++(I..I))", "(XY..XY)"],
        )?;

        let dependent_symbol = dependent_symbol_of(&variable_list);
        let x_attribute = find_attribute(attributes, "X");
        let y_attribute = dependent_symbol.and_then(|symbol| find_attribute(attributes, symbol));

        let x = merge_axis(x_attribute, page_ldrs, block_ldrs, "X", "X");
        let y = merge_axis(y_attribute, page_ldrs, block_ldrs, "Y", "Y");

        let body_offset = reader.borrow().tell();
        reader.borrow_mut().skip_to_next_ldr()?;
        Ok(Self {
            variable_list,
            plot_descriptor,
            x,
            y,
            reader,
            body_offset,
        })
    }

    /// The record's variable list, with any trailing plot descriptor
    /// stripped.
    pub fn variable_list(&self) -> &str {
        &self.variable_list
    }

    /// The plot descriptor (`PROFILE`, `XYDATA`, `PEAKS`, or `CONTOUR`),
    /// if given.
    pub fn plot_descriptor(&self) -> Option<&str> {
        self.plot_descriptor.as_deref()
    }

    /// Merged attributes for the independent (X) axis.
    pub fn x_attributes(&self) -> &AxisAttributes {
        &self.x
    }

    /// Merged attributes for the dependent (Y/R/I) axis.
    pub fn y_attributes(&self) -> &AxisAttributes {
        &self.y
    }

    /// Decodes the data body into ordered samples.
    pub fn get_data(&self) -> Result<Vec<Point>> {
        if self.variable_list == "(XY..XY)" {
            return with_body(&self.reader, self.body_offset, xy::read_xy_xy_body);
        }

        let mut missing = Vec::new();
        let first_x = self.x.first.unwrap_or_else(|| {
            missing.push("FIRSTX".to_string());
            f64::NAN
        });
        let last_x = self.x.last.unwrap_or_else(|| {
            missing.push("LASTX".to_string());
            f64::NAN
        });
        let y_factor = self.y.factor.unwrap_or(1.0);
        if !missing.is_empty() {
            return Err(Error::new(Kind::MissingRequired {
                record: "NTUPLES DATA TABLE".to_string(),
                labels: missing,
            }));
        }

        with_body(&self.reader, self.body_offset, |reader| {
            let y_raw = xy::read_xpp_yy_body(reader)?;
            let n_points = y_raw.len();
            xy::reconstruct(&y_raw, first_x, last_x, y_factor, n_points)
        })
    }
}

/// A JCAMP-DX `NTUPLES` record.
#[derive(Debug)]
pub struct NTuples {
    data_form: String,
    attributes: Vec<NTuplesAttributes>,
    pages: Vec<Page>,
}

impl NTuples {
    pub(crate) fn new(
        data_form: String,
        reader: SharedReader,
        block_ldrs: &[StringLdr],
    ) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<(String, Vec<String>)> = Vec::new();
        let mut pages = Vec::new();

        loop {
            let found = skip_to_ldr_or_eof(&mut reader.borrow_mut(), "NTUPLES")?;
            if !found {
                return Err(Error::new(Kind::UnexpectedContent {
                    block: "NTUPLES".to_string(),
                    line: "<end of input before ##ENDNTUPLES=>".to_string(),
                }));
            }
            let raw = read_raw_ldr(&mut reader.borrow_mut())?;

            match raw.label.as_str() {
                "ENDNTUPLES" => break,
                "PAGE" => {
                    let attributes = build_attributes(&columns, &rows);
                    let page = parse_page(raw.value, &reader, &attributes, block_ldrs)?;
                    pages.push(page);
                }
                label => {
                    if label == "VARNAME" {
                        columns = split_csv(&raw.value);
                    }
                    rows.push((label.to_string(), split_csv(&raw.value)));
                }
            }
        }

        let attributes = build_attributes(&columns, &rows);
        Ok(Self {
            data_form,
            attributes,
            pages,
        })
    }

    /// The text following `##NTUPLES=`, naming the data form (e.g.
    /// `"NMR SPECTRUM"`).
    pub fn data_form(&self) -> &str {
        &self.data_form
    }

    /// The per-variable attribute table, in column order.
    pub fn attributes(&self) -> &[NTuplesAttributes] {
        &self.attributes
    }

    /// The pages, in source order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TextReader;
    use std::cell::RefCell;

    fn shared(text: &str) -> SharedReader {
        Rc::new(RefCell::new(TextReader::from_bytes(
            format!("{text}\n##END=\n").into_bytes(),
        )))
    }

    #[test]
    fn page_data_table_decodes_with_ntuples_level_attributes() {
        let reader = shared(
            "##VARNAME= PAGE NUMBER, FREQUENCY, INTENSITY\n\
             ##SYMBOL= N, X, Y\n\
             ##VARTYPE= INDEPENDENT, INDEPENDENT, DEPENDENT\n\
             ##UNITS= , HZ, ARBITRARY UNITS\n\
             ##FIRST= 1, 450, 0\n\
             ##LAST= , 452, 0\n\
             ##FACTOR= 1, 1, 1\n\
             ##PAGE= N=1\n\
             ##DATATABLE= (X++(Y..Y)), XYDATA\n\
             450 10 11 12\n\
             ##ENDNTUPLES=",
        );
        let ntuples = NTuples::new("NMR SPECTRUM".to_string(), reader, &[]).unwrap();
        assert_eq!(ntuples.pages().len(), 1);
        let table = ntuples.pages()[0].data_table().unwrap();
        assert_eq!(table.plot_descriptor(), Some("XYDATA"));
        assert_eq!(table.x_attributes().units.as_deref(), Some("HZ"));
        let points = table.get_data().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], Point { x: 450.0, y: 10.0 });
        assert_eq!(points[2], Point { x: 452.0, y: 12.0 });
    }

    #[test]
    fn data_table_falls_back_to_block_ldrs_when_ntuples_level_is_silent() {
        let reader = shared(
            "##VARNAME= FREQUENCY, INTENSITY\n\
             ##SYMBOL= X, Y\n\
             ##PAGE= N=1\n\
             ##DATATABLE= (X++(Y..Y))\n\
             450 10 11\n\
             ##ENDNTUPLES=",
        );
        let block_ldrs = vec![
            StringLdr::new("FIRSTX".to_string(), "450".to_string()),
            StringLdr::new("LASTX".to_string(), "451".to_string()),
            StringLdr::new("YFACTOR".to_string(), "2".to_string()),
        ];
        let ntuples = NTuples::new("NMR SPECTRUM".to_string(), reader, &block_ldrs).unwrap();
        let table = ntuples.pages()[0].data_table().unwrap();
        let points = table.get_data().unwrap();
        assert_eq!(points, vec![Point { x: 450.0, y: 20.0 }, Point { x: 451.0, y: 22.0 }]);
    }

    #[test]
    fn page_level_ldr_overrides_ntuples_level_attribute() {
        let reader = shared(
            "##VARNAME= FREQUENCY, INTENSITY\n\
             ##SYMBOL= X, Y\n\
             ##FIRST= 450, 0\n\
             ##LAST= 460, 0\n\
             ##PAGE= N=1\n\
             ##FIRSTX= 0\n\
             ##LASTX= 2\n\
             ##DATATABLE= (X++(Y..Y))\n\
             0 10 11 12\n\
             ##ENDNTUPLES=",
        );
        let ntuples = NTuples::new("NMR SPECTRUM".to_string(), reader, &[]).unwrap();
        let table = ntuples.pages()[0].data_table().unwrap();
        assert_eq!(table.x_attributes().first, Some(0.0));
        assert_eq!(table.x_attributes().last, Some(2.0));
    }

    #[test]
    fn missing_end_ntuples_is_an_error() {
        let reader = shared("##VARNAME= X, Y\n##SYMBOL= X, Y");
        assert!(NTuples::new("NMR SPECTRUM".to_string(), reader, &[]).is_err());
    }
}
