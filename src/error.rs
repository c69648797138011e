use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Rejected engine configuration (architecture or hyperparameters).
    InvalidConfig(String),
    /// A vector or dataset width disagrees with the configured architecture.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    /// Training or evaluation was requested on a dataset with no samples.
    EmptyDataset,
    /// Malformed dataset construction or I/O.
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Error::DimensionMismatch {
                what,
                expected,
                got,
            } => write!(f, "dimension mismatch: {what} is {got}, expected {expected}"),
            Error::EmptyDataset => write!(f, "dataset must not be empty"),
            Error::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
