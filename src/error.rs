use core::fmt;

/// Result alias for `neokmedoids`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the solver and matrix intake.
///
/// Every variant is raised before any clustering work starts; a failed
/// call leaves solver state untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Distance matrix is not square (or has ragged rows).
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Offending column count.
        cols: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of objects.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// A distance entry is NaN or infinite.
    NonFiniteDistance {
        /// Row of the entry.
        row: usize,
        /// Column of the entry.
        col: usize,
    },
}

impl Error {
    /// True for shape violations of the distance matrix.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, Error::NotSquare { .. })
    }

    /// True for violations of the k / alpha / beta constraints or of the
    /// solver configuration.
    pub fn is_constraint_error(&self) -> bool {
        !self.is_shape_error()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotSquare { rows, cols } => {
                write!(f, "distance matrix must be square: {rows} rows, {cols} columns")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::NonFiniteDistance { row, col } => {
                write!(f, "distance at ({row}, {col}) is not finite")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
