use std::sync::Arc;
use std::time::Duration;

use futures_util::TryStreamExt;
use log::LevelFilter;

use crate::arguments::PgArguments;
use crate::command::{MetadataCallback, PgCommand, RowCallback};
use crate::connection::{EventStream, PrepareOk, QueryStart, RawConnection, StreamEvent};
use crate::error::{BoxDynError, Error, Result};
use crate::logger::{LogSettings, QueryLogger};
use crate::query_result::PgQueryResult;
use crate::row::PgRow;
use crate::statement::{PgStatement, PgStatementMetadata};

/// Dispatches commands over an underlying connection.
///
/// `dispatch` takes `&mut self`, so one request is in flight at a time; the
/// underlying connection is relied on to serialize its operations and never
/// interleave responses.
pub struct PgClient<C: RawConnection> {
    connection: C,
    log_settings: LogSettings,
}

impl<C: RawConnection> PgClient<C> {
    pub fn new(connection: C) -> Self {
        Self { connection, log_settings: LogSettings::default() }
    }

    /// Set the log level for executed statements.
    pub fn log_statements(&mut self, level: LevelFilter) -> &mut Self {
        self.log_settings.log_statements(level);
        self
    }

    /// Set the log level and duration threshold for slow statements.
    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) -> &mut Self {
        self.log_settings.log_slow_statements(level, duration);
        self
    }

    /// Consume the client, returning the underlying connection.
    pub fn into_inner(self) -> C {
        self.connection
    }

    /// Run one command to completion.
    ///
    /// Resolves exactly once: with the command's final result, or with the
    /// first failure encountered. A failure mid-stream stops row delivery at
    /// that point; rows already handed to the row callback stand.
    pub async fn dispatch(&mut self, command: PgCommand<'_>) -> Result<PgQueryResult> {
        match command {
            PgCommand::Query { sql, arguments, mut on_metadata, mut on_row } => {
                let mut logger = QueryLogger::new(sql, self.log_settings.clone());

                let QueryStart { columns, rows } =
                    self.connection.start_query(sql, &arguments).await?;

                // the table is built once here and shared by every row below
                let metadata = Arc::new(PgStatementMetadata::from_fields(columns, Vec::new())?);

                let result =
                    run_stream(rows, Some(metadata), false, &mut on_row, &mut logger).await?;

                on_metadata(&result);

                Ok(result)
            }

            PgCommand::SimpleQuery { sql, mut on_row } => {
                let mut logger = QueryLogger::new(sql, self.log_settings.clone());

                let rows = self.connection.simple_query(sql).await?;

                // the text protocol describes each result set in-stream
                run_stream(rows, None, true, &mut on_row, &mut logger).await
            }

            PgCommand::Prepare { sql, statement } => {
                let PrepareOk { handle, parameters, columns } =
                    self.connection.prepare(statement.name(), sql).await?;

                let metadata = match columns {
                    Some(fields) => PgStatementMetadata::from_fields(fields, parameters)?,

                    // executing this statement returns no data
                    None => PgStatementMetadata { parameters, ..Default::default() },
                };

                statement.set(handle, Arc::new(metadata))?;

                Ok(PgQueryResult::default())
            }

            PgCommand::Execute { statement, arguments, mut on_row } => {
                let inner = statement.get()?;
                let handle = inner.handle;

                // reuse the table cached at prepare time, no re-derivation
                let metadata = Arc::clone(&inner.metadata);

                let mut logger = QueryLogger::new(statement.name(), self.log_settings.clone());

                let rows = self.connection.execute(handle, &arguments).await?;

                run_stream(rows, Some(metadata), false, &mut on_row, &mut logger).await
            }
        }
    }

    /// Run an ad-hoc query, invoking `on_row` for each returned row.
    pub async fn query<F>(
        &mut self,
        sql: &str,
        arguments: PgArguments,
        on_row: F,
    ) -> Result<PgQueryResult>
    where
        F: FnMut(PgRow) -> std::result::Result<(), BoxDynError> + Send,
    {
        self.dispatch(PgCommand::Query {
            sql,
            arguments,
            on_metadata: noop_metadata(),
            on_row: Box::new(on_row),
        })
        .await
    }

    /// Run a query through the text protocol, if the connection supports it.
    pub async fn simple_query<F>(&mut self, sql: &str, on_row: F) -> Result<PgQueryResult>
    where
        F: FnMut(PgRow) -> std::result::Result<(), BoxDynError> + Send,
    {
        self.dispatch(PgCommand::SimpleQuery { sql, on_row: Box::new(on_row) })
            .await
    }

    /// Prepare `sql` under the statement's name, filling its cache slot.
    pub async fn prepare(&mut self, sql: &str, statement: &Arc<PgStatement>) -> Result<()> {
        self.dispatch(PgCommand::Prepare { sql, statement: Arc::clone(statement) })
            .await?;

        Ok(())
    }

    /// Execute a previously prepared statement.
    pub async fn execute<F>(
        &mut self,
        statement: &Arc<PgStatement>,
        arguments: PgArguments,
        on_row: F,
    ) -> Result<PgQueryResult>
    where
        F: FnMut(PgRow) -> std::result::Result<(), BoxDynError> + Send,
    {
        self.dispatch(PgCommand::Execute {
            statement: Arc::clone(statement),
            arguments,
            on_row: Box::new(on_row),
        })
        .await
    }
}

fn noop_metadata() -> MetadataCallback<'static> {
    Box::new(|_| {})
}

/// Drive one result stream to completion.
///
/// Pulls the next event only after the row callback has returned, so at most
/// one row is in flight. Returning early on any failure drops the stream;
/// nothing further is consumed or translated.
async fn run_stream(
    mut events: EventStream<'_>,
    mut metadata: Option<Arc<PgStatementMetadata>>,
    redescribe: bool,
    on_row: &mut RowCallback<'_>,
    logger: &mut QueryLogger<'_>,
) -> Result<PgQueryResult> {
    let mut result: Option<PgQueryResult> = None;

    while let Some(event) = events.try_next().await? {
        match event {
            StreamEvent::Descriptors(fields) => {
                if !redescribe {
                    return Err(err_protocol!(
                        "unexpected row description; the statement's columns are already known"
                    ));
                }

                metadata = Some(Arc::new(PgStatementMetadata::from_fields(fields, Vec::new())?));
            }

            StreamEvent::Row(values) => {
                let metadata = metadata
                    .as_ref()
                    .ok_or_else(|| err_protocol!("received a data row before a row description"))?;

                let row = PgRow::from_values(values, metadata)?;

                logger.increment_rows_returned();

                on_row(row).map_err(Error::RowCallback)?;
            }

            StreamEvent::Complete(tag) => {
                let complete = PgQueryResult::parse(tag)?;

                logger.increase_rows_affected(complete.rows_affected());

                match &mut result {
                    Some(result) => result.extend([complete]),
                    None => result = Some(complete),
                }
            }
        }
    }

    result.ok_or_else(|| err_protocol!("result stream ended without a completion tag"))
}
