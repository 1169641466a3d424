// Column-spec parsing and inspection query generation.
// Everything in here is synchronous and free of I/O so both the CLI and the
// web handlers can call it directly.
pub mod builder;
pub mod parser;
pub mod schema;
pub mod session;

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum InspectError {
    /// A pasted block of TSV produced no usable rows at all.
    InvalidPaste,
    /// No column survived filtering, so there is nothing to UNION.
    EmptyColumnSet,
    MissingTableReference,
    Template(String),
    IoError(std::io::Error),
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectError::InvalidPaste => write!(
                f,
                "Invalid paste: enter column name and data type separated by a tab, one per line"
            ),
            InspectError::EmptyColumnSet => write!(
                f,
                "No valid columns: every row has an empty name or an unsupported data type"
            ),
            InspectError::MissingTableReference => {
                write!(f, "A table reference (project.dataset.table) is required")
            }
            InspectError::Template(msg) => write!(f, "Template error: {}", msg),
            InspectError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl Error for InspectError {}

impl From<std::io::Error> for InspectError {
    fn from(err: std::io::Error) -> Self {
        InspectError::IoError(err)
    }
}

impl From<minijinja::Error> for InspectError {
    fn from(err: minijinja::Error) -> Self {
        InspectError::Template(err.to_string())
    }
}
