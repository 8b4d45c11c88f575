//! Callback-driven query execution over a raw PostgreSQL wire-protocol
//! connection.
//!
//! This crate sits between a row-at-a-time query API and a lower-level
//! connection that speaks the PostgreSQL protocol (the [`RawConnection`]
//! seam). It dispatches requests, translates each streamed row into a
//! [`PgRow`] addressable by column name or position, caches per-statement
//! column metadata in a [`PgStatement`] so repeated executions avoid
//! re-deriving it, and normalizes the connection's internal failures into
//! the public [`Error`] type.
//!
//! It does not parse wire bytes, pool connections, or retry; those belong to
//! the connection implementation and the caller respectively.

#[macro_use]
mod error;

mod arguments;
mod client;
mod column;
mod command;
mod connection;
mod ext;
mod logger;
mod notice;
mod query_result;
mod row;
mod statement;
mod type_id;
mod value;

pub use arguments::PgArguments;
pub use client::PgClient;
pub use column::{ColumnIndex, PgColumn};
pub use command::{MetadataCallback, PgCommand, RowCallback};
pub use connection::{EventStream, Field, PrepareOk, QueryStart, RawConnection, StreamEvent};
pub use error::{BoxDynError, ConnectionError, Error, PgDatabaseError, Result};
pub use ext::ustr::UStr;
pub use logger::LogSettings;
pub use notice::{PgNotice, PgNoticeSeverity};
pub use query_result::PgQueryResult;
pub use row::PgRow;
pub use statement::{PgStatement, PgStatementMetadata, StatementHandle};
pub use type_id::Oid;
pub use value::PgValueFormat;
