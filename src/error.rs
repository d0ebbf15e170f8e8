//! Error types for bytelog operations

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors produced while rendering or writing log entries.
///
/// None of these are fatal: a core that hits one still finishes the entry (a field that fails
/// to encode is dropped from the line, every child of a fan-out is still written) and reports
/// what went wrong afterwards.
#[derive(Error, Debug)]
pub enum Error {
    /// A field's value could not be rendered. The field was left out of the line.
    #[error("failed to encode field \"{key}\": {source}")]
    Encode {
        key: String,
        #[source]
        source: Box<Error>,
    },

    /// The generic structural encoder rejected a value
    #[error("structural encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by a sink
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A sink accepted fewer bytes than it was given
    #[error("short write: {written} of {expected} bytes written")]
    ShortWrite { written: usize, expected: usize },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Several independent failures, e.g. from the children of a fan-out
    #[error(transparent)]
    Multiple(MultiError),
}

/// Result type for bytelog operations
pub type Result<T> = std::result::Result<T, Error>;

/// A list of errors gathered from operations that all ran to completion.
///
/// `{}` renders the errors on one line separated by `; `; the alternate form `{:#}` renders
/// one error per line:
///
/// ```text
/// the following errors occurred:
///  -  first error
///  -  second error
///     with a continuation line
/// ```
#[derive(Debug)]
pub struct MultiError {
    errors: Vec<Error>,
}

impl MultiError {
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    fn fmt_single_line(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }

    fn fmt_multi_line(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the following errors occurred:")?;
        for item in &self.errors {
            f.write_str("\n -  ")?;
            let text = format!("{:#}", item);
            for (i, line) in text.split_inclusive('\n').enumerate() {
                if i > 0 {
                    f.write_str("    ")?;
                }
                f.write_str(line)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.fmt_multi_line(f)
        } else {
            self.fmt_single_line(f)
        }
    }
}

impl std::error::Error for MultiError {}

/// Merges two outcomes, keeping every error.
///
/// Nested [`Error::Multiple`] values are flattened, so combining in a loop yields a single
/// flat list rather than a tree.
///
/// # Examples
///
/// ```
/// use bytelog::error::{combine, Error};
///
/// let merged = combine(
///     Err(Error::Config("a".into())),
///     Err(Error::Config("b".into())),
/// );
/// let merged = combine(merged, Ok(()));
/// assert_eq!(
///     merged.unwrap_err().to_string(),
///     "invalid configuration: a; invalid configuration: b"
/// );
/// ```
pub fn combine(left: Result<()>, right: Result<()>) -> Result<()> {
    match (left, right) {
        (Ok(()), right) => right,
        (left, Ok(())) => left,
        (Err(left), Err(right)) => {
            let mut errors = Vec::with_capacity(2);
            for err in [left, right] {
                match err {
                    Error::Multiple(multi) => errors.extend(multi.errors),
                    other => errors.push(other),
                }
            }
            Err(Error::Multiple(MultiError { errors }))
        }
    }
}
