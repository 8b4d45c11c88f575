use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::arguments::PgArguments;
use crate::error::BoxDynError;
use crate::query_result::PgQueryResult;
use crate::row::PgRow;
use crate::statement::PgStatement;

/// Invoked once per delivered row.
///
/// An error stops the stream immediately; rows already delivered stand, and
/// the error becomes the overall failure of the dispatch. The connection is
/// not polled for the next row until the callback has returned.
pub type RowCallback<'q> = Box<dyn FnMut(PgRow) -> Result<(), BoxDynError> + Send + 'q>;

/// Invoked with the final result of a query once its stream has completed.
pub type MetadataCallback<'q> = Box<dyn FnMut(&PgQueryResult) + Send + 'q>;

/// A single request for [`PgClient::dispatch`][crate::PgClient::dispatch].
///
/// The set of request shapes is closed; every dispatch site matches on it
/// exhaustively, so there is no "unrecognized variant" path.
pub enum PgCommand<'q> {
    /// An ad-hoc parameterized query through the extended protocol.
    Query {
        sql: &'q str,
        arguments: PgArguments,
        on_metadata: MetadataCallback<'q>,
        on_row: RowCallback<'q>,
    },

    /// A query through the text protocol; connections may decline this.
    SimpleQuery { sql: &'q str, on_row: RowCallback<'q> },

    /// Compile `sql` under the statement's name and fill the statement's
    /// cache slot.
    Prepare { sql: &'q str, statement: Arc<PgStatement> },

    /// Execute a previously prepared statement.
    Execute {
        statement: Arc<PgStatement>,
        arguments: PgArguments,
        on_row: RowCallback<'q>,
    },
}

impl Debug for PgCommand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query { sql, arguments, .. } => f
                .debug_struct("Query")
                .field("sql", sql)
                .field("arguments", arguments)
                .finish_non_exhaustive(),

            Self::SimpleQuery { sql, .. } => {
                f.debug_struct("SimpleQuery").field("sql", sql).finish_non_exhaustive()
            }

            Self::Prepare { sql, statement } => f
                .debug_struct("Prepare")
                .field("sql", sql)
                .field("statement", &statement.name())
                .finish(),

            Self::Execute { statement, arguments, .. } => f
                .debug_struct("Execute")
                .field("statement", &statement.name())
                .field("arguments", arguments)
                .finish_non_exhaustive(),
        }
    }
}
