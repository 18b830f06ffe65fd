//! Error types produced while parsing JCAMP-DX input.

/// The error type returned by every fallible operation in this crate.
///
/// This kind of error is always fatal to the block or record being parsed:
/// there is no local recovery. It indicates either a structural problem with
/// the JCAMP-DX text itself (a malformed LDR, an unsupported variable list, a
/// violated checksum) or a failure of the underlying text source.
///
/// See [`Kind`] for the individual kinds of errors that can occur.
#[derive(Clone, Debug)]
pub struct Error {
    kind: Kind,
}

impl Error {
    /// Constructs a new `Error` from the given [`Kind`].
    pub fn new(kind: Kind) -> Self {
        kind.into()
    }

    /// Returns the [`Kind`] of this `Error`.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }
}

/// The kind of [`Error`] that occurred while parsing JCAMP-DX input.
///
/// Marked as non-exhaustive to allow new variants to be added without
/// breaking compatibility.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Kind {
    /// The underlying text source failed (e.g. a file read error).
    Io {
        /// Description of the underlying I/O failure.
        message: String,
    },
    /// An LDR header is missing `##`, missing `=`, or is otherwise
    /// syntactically invalid.
    MalformedLdr {
        /// The offending line, or a prefix of it.
        line: String,
    },
    /// Non-comment text appeared where an LDR start or a pure comment was
    /// expected.
    UnexpectedContent {
        /// The block title this content was found in.
        block: String,
        /// The offending line, or a prefix of it.
        line: String,
    },
    /// A standard LDR or special record appeared twice within one block.
    Duplicate {
        /// The block title this duplicate was found in.
        block: String,
        /// The normalised label that was duplicated.
        label: String,
    },
    /// A parameter LDR required to interpret a data record is absent.
    MissingRequired {
        /// The record that required the parameter (e.g. `"XYDATA"`).
        record: String,
        /// The missing normalised labels.
        labels: Vec<String>,
    },
    /// The variable list does not match the record's allow-list.
    IllegalVariableList {
        /// The record the variable list was found on.
        record: String,
        /// The variable list text that was rejected.
        variable_list: String,
    },
    /// The decoded element count differs from NPOINTS / VAR_DIM.
    NPointsMismatch {
        /// The number of elements NPOINTS/VAR_DIM declared.
        expected: usize,
        /// The number of elements actually decoded.
        actual: usize,
    },
    /// The inter-line Y-value checksum was violated by more than 1.
    YCheck {
        /// The previous line's last Y value.
        previous: f64,
        /// The new line's first Y value (the checksum).
        checksum: f64,
    },
    /// An ASDF token rule was violated (orphan DIF/DUP, DUP after DUP, DIF
    /// after `?`, or an illegal character).
    AsdfSyntax {
        /// A description of the violated rule.
        details: String,
        /// The line the violation occurred on.
        line: String,
    },
    /// A bracketed tuple was malformed: mismatched brackets, the wrong
    /// number of components, or premature EOF inside a tuple.
    TupleSyntax {
        /// A description of the violated rule.
        details: String,
    },
    /// A label or variable-list form outside this crate's scope.
    UnsupportedFeature {
        /// A description of the unsupported feature.
        details: String,
    },
}

impl std::error::Error for Error {}

impl From<Kind> for Error {
    fn from(kind: Kind) -> Self {
        Self { kind }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use self::Kind::*;
        let description = match &self.kind {
            Io { message } => format!("I/O error reading JCAMP-DX source: {message}"),
            MalformedLdr { line } => {
                format!("malformed LDR header: {line:?}")
            }
            UnexpectedContent { block, line } => format!(
                "unexpected content in block {block:?}: {line:?}"
            ),
            Duplicate { block, label } => format!(
                "duplicate LDR {label:?} in block {block:?}"
            ),
            MissingRequired { record, labels } => format!(
                "{record} is missing required LDR(s): {}",
                labels.join(", ")
            ),
            IllegalVariableList {
                record,
                variable_list,
            } => format!(
                "{record} has an unsupported variable list: {variable_list:?}"
            ),
            NPointsMismatch { expected, actual } => format!(
                "decoded element count {actual} does not match NPOINTS/VAR_DIM {expected}"
            ),
            YCheck {
                previous,
                checksum,
            } => format!(
                "Y-value checksum failed: previous line ended in {previous}, \
                 next line starts with {checksum}"
            ),
            AsdfSyntax { details, line } => {
                format!("ASDF syntax error: {details} (in {line:?})")
            }
            TupleSyntax { details } => format!("tuple syntax error: {details}"),
            UnsupportedFeature { details } => format!("unsupported feature: {details}"),
        };
        write!(f, "{description}")
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Kind::Io {
            message: error.to_string(),
        }
        .into()
    }
}

/// A specialized [`Result`](std::result::Result) type for this crate's
/// fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
