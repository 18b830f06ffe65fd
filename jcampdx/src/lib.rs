#![warn(missing_docs)]

//! A reader for JCAMP-DX, the plain-text interchange format for
//! spectroscopy (IR, NMR, mass spectra, and related techniques).
//!
//! Given JCAMP-DX text, [`parse`] produces a navigable tree of [`Block`]s:
//! each block carries its `##TITLE=`, its ordinary labelled data records
//! (LDRs), any nested blocks (from `##DATA TYPE= LINK`), and at most one of
//! each "special" record — `XYDATA`, `RADATA`, `XYPOINTS`, `PEAK TABLE`,
//! `PEAK ASSIGNMENTS`, `AUDIT TRAIL`, and `NTUPLES`. Each special record
//! defers decoding its data body until [`get_data()`](records::XyData::get_data)
//! (or its equivalent) is called, so that malformed numeric data does not
//! prevent metadata from being read.
//!
//! ```
//! use jcampdx::parse;
//!
//! let text = "##TITLE= sample\n##XUNITS= 1/CM\n##YUNITS= ABSORBANCE\n\
//!             ##FIRSTX= 450\n##LASTX= 451\n##XFACTOR= 1\n##YFACTOR= 1\n\
//!             ##NPOINTS= 2\n##XYDATA= (X++(Y..Y))\n450 10 11\n##END=\n";
//! let block = parse(text.as_bytes().to_vec()).unwrap();
//! let points = block.xy_data().unwrap().get_data().unwrap();
//! assert_eq!(points.len(), 2);
//! ```

mod asdf;
mod block;
mod error;
mod lex;
pub mod records;
mod reader;
mod tuple;
mod xy;

pub use block::{Block, StringLdr};
pub use error::{Error, Kind, Result};
pub use reader::TextReader;
pub use xy::Point;

use std::path::Path;

/// Parses a complete JCAMP-DX document from an in-memory byte buffer.
pub fn parse(data: Vec<u8>) -> Result<Block> {
    block::parse(TextReader::from_bytes(data))
}

/// Parses a complete JCAMP-DX document from a file.
pub fn parse_path<P: AsRef<Path>>(path: P) -> Result<Block> {
    block::parse(TextReader::from_path(path)?)
}

/// Returns `true` if `path` and the start of `reader` look like a JCAMP-DX
/// document: the filename extension is one of `jdx`, `dx`, or `jcm`
/// (case-insensitive), and the first eight bytes are `##TITLE=`.
pub fn can_parse<P: AsRef<Path>>(path: P, reader: &TextReader) -> bool {
    let has_extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jdx" | "dx" | "jcm"))
        .unwrap_or(false);
    has_extension && reader.peek(8) == b"##TITLE=".as_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_requires_extension_and_header() {
        let good = TextReader::from_bytes(b"##TITLE= x\n".to_vec());
        let bad = TextReader::from_bytes(b"not a jcamp file".to_vec());
        assert!(can_parse("sample.jdx", &good));
        assert!(can_parse("sample.JDX", &good));
        assert!(!can_parse("sample.txt", &good));
        assert!(!can_parse("sample.jdx", &bad));
    }

    #[test]
    fn parse_minimal_xydata_block() {
        let text = "##TITLE= T\n##JCAMP-DX= 4.24\n##XUNITS= 1/CM\n##YUNITS= A\n\
                    ##FIRSTX= 450\n##LASTX= 451\n##XFACTOR= 1\n##YFACTOR= 1\n\
                    ##NPOINTS= 2\n##XYDATA= (X++(Y..Y))\n450 10 11\n##END=\n";
        let block = parse(text.as_bytes().to_vec()).unwrap();
        let points = block.xy_data().unwrap().get_data().unwrap();
        assert_eq!(points, vec![Point { x: 450.0, y: 10.0 }, Point { x: 451.0, y: 11.0 }]);
    }
}
