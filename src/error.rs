use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::result::Result as StdResult;

use crate::notice::PgNotice;

/// A specialized `Result` type for this crate.
pub type Result<T> = StdResult<T, Error>;

/// A type-erased error, used to carry a caller's own failure out of a row
/// callback without forcing a conversion.
pub type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// Represents all the ways a dispatched command can fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Error returned from the database.
    #[error("error returned from database: {0}")]
    Database(Box<PgDatabaseError>),

    /// Error communicating with the database backend.
    #[error("error communicating with the server: {0}")]
    Io(#[from] io::Error),

    /// Unexpected or invalid data encountered while communicating with the
    /// database backend.
    ///
    /// This should indicate there is a programming error in the underlying
    /// connection or something corrupted with the connection to the database
    /// itself.
    #[error("encountered unexpected or invalid data: {0}")]
    Protocol(String),

    /// The caller's row callback returned an error; row delivery stopped at
    /// that row and the cause is carried here.
    #[error("error in row callback: {0}")]
    RowCallback(#[source] BoxDynError),

    /// Column index was out of bounds.
    #[error("column index out of bounds: the len is {len}, but the index is {index}")]
    ColumnIndexOutOfBounds { index: usize, len: usize },

    /// No column found for the given name.
    #[error("no column found for name: {0}")]
    ColumnNotFound(String),

    /// A data row did not carry one value per described column.
    #[error("row contains {received} values but the statement describes {expected} columns")]
    ColumnCountMismatch { expected: usize, received: usize },

    /// A statement was executed before it was prepared.
    #[error("statement {0:?} has not been prepared")]
    StatementNotPrepared(String),

    /// A statement was prepared a second time.
    #[error("statement {0:?} has already been prepared")]
    StatementAlreadyPrepared(String),

    /// The underlying connection does not support the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl Error {
    #[allow(dead_code)]
    #[inline]
    pub(crate) fn protocol(err: impl Display) -> Self {
        Error::Protocol(err.to_string())
    }
}

// Format an error message as a `Protocol` error
macro_rules! err_protocol {
    ($expr:expr) => {
        $crate::error::Error::Protocol($expr.into())
    };

    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Protocol(format!($fmt, $($arg)*))
    };
}

/// A failure raised by the underlying connection.
///
/// This is the connection's internal representation; it is normalized into
/// [`Error`] exactly once, when the failure propagates out of a dispatched
/// command.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// The backend responded with an `ErrorResponse`.
    #[error("{0}")]
    Backend(PgNotice),

    /// The transport failed.
    #[error("{0}")]
    Io(#[from] io::Error),

    /// The backend sent something the connection could not make sense of.
    #[error("{0}")]
    Protocol(String),

    /// The connection does not implement the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Backend(notice) => {
                Error::Database(Box::new(PgDatabaseError(notice)))
            }

            ConnectionError::Io(err) => Error::Io(err),
            ConnectionError::Protocol(message) => Error::Protocol(message),
            ConnectionError::Unsupported(operation) => Error::Unsupported(operation),
        }
    }
}

/// An error returned from the PostgreSQL database.
///
/// Wraps the full [`PgNotice`] the backend sent; every field of the original
/// response remains reachable.
#[derive(Debug, Clone)]
pub struct PgDatabaseError(pub(crate) PgNotice);

impl PgDatabaseError {
    /// The complete notice the backend attached to this error.
    pub fn notice(&self) -> &PgNotice {
        &self.0
    }

    /// The SQLSTATE code for this error.
    pub fn code(&self) -> &str {
        self.0.code()
    }

    /// The primary, human-readable error message.
    pub fn message(&self) -> &str {
        self.0.message()
    }

    pub fn detail(&self) -> Option<&str> {
        self.0.detail()
    }

    pub fn hint(&self) -> Option<&str> {
        self.0.hint()
    }

    /// Position within the original query string where the error occurred,
    /// in characters, counted from one.
    pub fn position(&self) -> Option<u32> {
        self.0.position()
    }
}

impl Display for PgDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for PgDatabaseError {}

impl From<PgDatabaseError> for Error {
    fn from(err: PgDatabaseError) -> Self {
        Error::Database(Box::new(err))
    }
}
