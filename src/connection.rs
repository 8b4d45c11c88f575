use std::num::{NonZeroI16, NonZeroI32};

use bytes::Bytes;
use futures_core::future::BoxFuture;
use futures_core::stream::BoxStream;

use crate::arguments::PgArguments;
use crate::error::ConnectionError;
use crate::statement::StatementHandle;
use crate::type_id::Oid;

/// A column descriptor as the backend reports it in a `RowDescription`,
/// before validation.
#[derive(Debug, Clone)]
pub struct Field {
    /// The name of the field.
    pub name: String,

    /// If the field can be identified as a column of a specific table, the
    /// object ID of the table; otherwise absent.
    pub relation_id: Option<NonZeroI32>,

    /// If the field can be identified as a column of a specific table, the
    /// attribute number of the column; otherwise absent.
    pub relation_attribute_no: Option<NonZeroI16>,

    /// The object ID of the field's data type.
    pub type_id: Oid,

    /// The data type size (see `pg_type.typlen`). Note that negative values
    /// denote variable-width types.
    pub type_size: i16,

    /// The type modifier (see `pg_attribute.atttypmod`). The meaning of the
    /// modifier is type-specific.
    pub type_modifier: i32,

    /// The raw format code declared for the field; validated during
    /// translation into a [`PgColumn`][crate::PgColumn].
    pub format: i16,
}

/// One event in a result stream.
#[derive(Debug)]
pub enum StreamEvent {
    /// A new set of rows is about to be returned; carries their descriptors.
    ///
    /// Only the text protocol produces this mid-stream (one per statement of
    /// a multi-statement simple query).
    Descriptors(Vec<Field>),

    /// One row, as raw column values in descriptor order. An absent value is
    /// a SQL `NULL`; an empty value is an empty string.
    Row(Vec<Option<Bytes>>),

    /// A command completed; carries its textual completion tag.
    Complete(Bytes),
}

/// The result stream of a single operation.
///
/// The consumer polls for the next event only after it has finished with the
/// previous one; the poll is the per-row continue signal, so at most one row
/// is in flight.
pub type EventStream<'c> = BoxStream<'c, Result<StreamEvent, ConnectionError>>;

/// The initial response to [`RawConnection::start_query`].
pub struct QueryStart<'c> {
    /// Descriptors for the rows the stream will carry; empty for a command
    /// that returns no rows.
    pub columns: Vec<Field>,

    /// The remaining events of this execution.
    pub rows: EventStream<'c>,
}

/// The response to [`RawConnection::prepare`].
#[derive(Debug)]
pub struct PrepareOk {
    /// The server-side handle for the compiled statement.
    pub handle: StatementHandle,

    /// The type of each statement parameter.
    pub parameters: Vec<Oid>,

    /// Descriptors for the statement's result columns; `None` if the backend
    /// reported that executing the statement returns no data.
    pub columns: Option<Vec<Field>>,
}

/// The operations this crate requires from an established connection.
///
/// Implementations own the socket and the wire codec; they are expected to
/// serialize operations and never interleave responses. All methods take
/// `&mut self` so the borrow checker enforces one outstanding operation.
pub trait RawConnection: Send {
    /// Send an ad-hoc parameterized query and begin streaming its results.
    fn start_query<'c>(
        &'c mut self,
        sql: &'c str,
        arguments: &'c PgArguments,
    ) -> BoxFuture<'c, Result<QueryStart<'c>, ConnectionError>>;

    /// Parse and describe a statement under the given name.
    fn prepare<'c>(
        &'c mut self,
        name: &'c str,
        sql: &'c str,
    ) -> BoxFuture<'c, Result<PrepareOk, ConnectionError>>;

    /// Execute a previously prepared statement.
    fn execute<'c>(
        &'c mut self,
        statement: StatementHandle,
        arguments: &'c PgArguments,
    ) -> BoxFuture<'c, Result<EventStream<'c>, ConnectionError>>;

    /// Run a query through the text protocol.
    ///
    /// Connections are not required to support this; the default declines.
    fn simple_query<'c>(
        &'c mut self,
        sql: &'c str,
    ) -> BoxFuture<'c, Result<EventStream<'c>, ConnectionError>> {
        let _ = sql;

        Box::pin(async { Err(ConnectionError::Unsupported("simple query protocol")) })
    }
}
