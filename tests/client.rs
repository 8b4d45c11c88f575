use std::collections::VecDeque;
use std::num::{NonZeroI16, NonZeroI32};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};

use pgpipe::{
    ConnectionError, Error, EventStream, Field, Oid, PgArguments, PgClient, PgCommand, PgNotice,
    PgNoticeSeverity, PgRow, PgStatement, PrepareOk, QueryStart, RawConnection, StatementHandle,
    StreamEvent,
};

/// One scripted response per expected operation, consumed in order.
enum Script {
    Query(Vec<Field>, Vec<Result<StreamEvent, ConnectionError>>),
    Prepare(Result<PrepareOk, ConnectionError>),
    Execute(Vec<Result<StreamEvent, ConnectionError>>),
    SimpleQuery(Vec<Result<StreamEvent, ConnectionError>>),
}

#[derive(Default)]
struct MockConnection {
    scripts: VecDeque<Script>,
    prepared_names: Vec<String>,
    events_pulled: Arc<AtomicUsize>,
}

impl MockConnection {
    fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self { scripts: scripts.into_iter().collect(), ..Default::default() }
    }

    fn pulled(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.events_pulled)
    }

    fn stream(&self, events: Vec<Result<StreamEvent, ConnectionError>>) -> EventStream<'static> {
        let pulled = Arc::clone(&self.events_pulled);

        stream::iter(events)
            .inspect(move |_| {
                pulled.fetch_add(1, Ordering::SeqCst);
            })
            .boxed()
    }
}

impl RawConnection for MockConnection {
    fn start_query<'c>(
        &'c mut self,
        _sql: &'c str,
        _arguments: &'c PgArguments,
    ) -> BoxFuture<'c, Result<QueryStart<'c>, ConnectionError>> {
        let response = match self.scripts.pop_front() {
            Some(Script::Query(columns, events)) => {
                Ok(QueryStart { columns, rows: self.stream(events) })
            }
            _ => panic!("unscripted start_query"),
        };

        Box::pin(async move { response })
    }

    fn prepare<'c>(
        &'c mut self,
        name: &'c str,
        _sql: &'c str,
    ) -> BoxFuture<'c, Result<PrepareOk, ConnectionError>> {
        self.prepared_names.push(name.to_owned());

        let response = match self.scripts.pop_front() {
            Some(Script::Prepare(response)) => response,
            _ => panic!("unscripted prepare"),
        };

        Box::pin(async move { response })
    }

    fn execute<'c>(
        &'c mut self,
        _statement: StatementHandle,
        _arguments: &'c PgArguments,
    ) -> BoxFuture<'c, Result<EventStream<'c>, ConnectionError>> {
        let response = match self.scripts.pop_front() {
            Some(Script::Execute(events)) => Ok(self.stream(events)),
            _ => panic!("unscripted execute"),
        };

        Box::pin(async move { response })
    }

    fn simple_query<'c>(
        &'c mut self,
        _sql: &'c str,
    ) -> BoxFuture<'c, Result<EventStream<'c>, ConnectionError>> {
        let response = match self.scripts.pop_front() {
            Some(Script::SimpleQuery(events)) => Ok(self.stream(events)),
            _ => panic!("unscripted simple_query"),
        };

        Box::pin(async move { response })
    }
}

/// A connection that implements only the required operations; used to
/// exercise the trait's default behavior.
struct MinimalConnection;

impl RawConnection for MinimalConnection {
    fn start_query<'c>(
        &'c mut self,
        _sql: &'c str,
        _arguments: &'c PgArguments,
    ) -> BoxFuture<'c, Result<QueryStart<'c>, ConnectionError>> {
        unimplemented!()
    }

    fn prepare<'c>(
        &'c mut self,
        _name: &'c str,
        _sql: &'c str,
    ) -> BoxFuture<'c, Result<PrepareOk, ConnectionError>> {
        unimplemented!()
    }

    fn execute<'c>(
        &'c mut self,
        _statement: StatementHandle,
        _arguments: &'c PgArguments,
    ) -> BoxFuture<'c, Result<EventStream<'c>, ConnectionError>> {
        unimplemented!()
    }
}

fn field(name: &str, type_id: u32) -> Field {
    Field {
        name: name.into(),
        relation_id: NonZeroI32::new(16384),
        relation_attribute_no: NonZeroI16::new(1),
        type_id: Oid(type_id),
        type_size: -1,
        type_modifier: -1,
        format: 1,
    }
}

fn row(values: &[Option<&'static [u8]>]) -> Result<StreamEvent, ConnectionError> {
    Ok(StreamEvent::Row(values.iter().map(|v| v.map(Bytes::from_static)).collect()))
}

fn complete(tag: &'static str) -> Result<StreamEvent, ConnectionError> {
    Ok(StreamEvent::Complete(Bytes::from_static(tag.as_bytes())))
}

#[tokio::test]
async fn it_translates_rows_and_reports_completion() {
    let conn = MockConnection::new([Script::Query(
        vec![field("id", 23), field("name", 25), field("active", 16)],
        vec![
            row(&[Some(b"1"), Some(b"a"), Some(b"t")]),
            row(&[Some(b"2"), Some(b"b"), Some(b"f")]),
            complete("SELECT 2"),
        ],
    )]);

    let mut client = PgClient::new(conn);

    let mut rows: Vec<PgRow> = Vec::new();
    let mut metadata_calls = 0;

    let result = client
        .dispatch(PgCommand::Query {
            sql: "SELECT id, name, active FROM users",
            arguments: PgArguments::new(),
            on_metadata: Box::new(|result| {
                metadata_calls += 1;
                assert_eq!(result.command(), "SELECT");
                assert_eq!(result.rows_affected(), 2);
            }),
            on_row: Box::new(|row| {
                rows.push(row);
                Ok(())
            }),
        })
        .await
        .unwrap();

    assert_eq!(metadata_calls, 1);
    assert_eq!(result.command(), "SELECT");
    assert_eq!(result.rows_affected(), 2);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 3);
    assert_eq!(rows[0].try_get_raw("name").unwrap(), Some(&Bytes::from_static(b"a")));
    assert_eq!(rows[1].try_get_raw("name").unwrap(), Some(&Bytes::from_static(b"b")));

    // name lookup resolves to the same value as the position it names
    for row in &rows {
        for column in row.columns() {
            assert_eq!(
                row.try_get_raw(column.name()).unwrap(),
                row.try_get_raw(column.ordinal()).unwrap()
            );
        }
    }

    // every row shares the metadata built once from the initial descriptors
    assert_eq!(rows[0].columns().as_ptr(), rows[1].columns().as_ptr());
}

#[tokio::test]
async fn it_stops_the_stream_when_a_row_callback_fails() {
    let conn = MockConnection::new([Script::Query(
        vec![field("n", 23)],
        vec![
            row(&[Some(b"1")]),
            row(&[Some(b"2")]),
            row(&[Some(b"3")]),
            complete("SELECT 3"),
        ],
    )]);
    let pulled = conn.pulled();

    let mut client = PgClient::new(conn);

    let mut delivered = 0;
    let err = client
        .query("SELECT n FROM t", PgArguments::new(), |_row| {
            delivered += 1;

            if delivered == 2 {
                return Err("boom".into());
            }

            Ok(())
        })
        .await
        .unwrap_err();

    // the callback ran exactly twice and the cause is carried through
    assert_eq!(delivered, 2);
    assert!(matches!(&err, Error::RowCallback(cause) if cause.to_string() == "boom"));

    // the third row was never pulled from the connection, let alone translated
    assert_eq!(pulled.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn it_reuses_prepared_metadata_across_executions() {
    let columns = vec![field("id", 23), field("name", 25)];

    let conn = MockConnection::new([
        Script::Prepare(Ok(PrepareOk {
            handle: StatementHandle::new(42),
            parameters: vec![Oid(23)],
            columns: Some(columns),
        })),
        Script::Execute(vec![row(&[Some(b"1"), Some(b"a")]), complete("SELECT 1")]),
        Script::Execute(vec![row(&[Some(b"2"), Some(b"b")]), complete("SELECT 1")]),
    ]);

    let mut client = PgClient::new(conn);
    let statement = Arc::new(PgStatement::new("q1"));

    client.prepare("SELECT id, name FROM users WHERE id = $1", &statement).await.unwrap();

    assert_eq!(statement.handle().unwrap(), StatementHandle::new(42));
    assert_eq!(statement.metadata().unwrap().parameters(), &[Oid(23)]);

    let mut tables = Vec::new();

    for _ in 0..2 {
        let mut args = PgArguments::new();
        args.add(&b"1"[..]);

        client
            .execute(&statement, args, |row| {
                tables.push(row.columns().as_ptr() as usize);
                Ok(())
            })
            .await
            .unwrap();
    }

    // both executions translated rows against the table cached at prepare
    // time; nothing was re-derived
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0], tables[1]);
    assert_eq!(tables[0], statement.columns().unwrap().as_ptr() as usize);

    let conn = client.into_inner();
    assert_eq!(conn.prepared_names, ["q1"]);
}

#[tokio::test]
async fn it_fails_execute_before_prepare() {
    let mut client = PgClient::new(MockConnection::new([]));
    let statement = Arc::new(PgStatement::new("later"));

    let err = client
        .execute(&statement, PgArguments::new(), |_| Ok(()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StatementNotPrepared(name) if name == "later"));
}

#[tokio::test]
async fn it_fails_a_second_prepare_of_the_same_statement() {
    let prepare_ok = || {
        Script::Prepare(Ok(PrepareOk {
            handle: StatementHandle::new(1),
            parameters: Vec::new(),
            columns: None,
        }))
    };

    let mut client = PgClient::new(MockConnection::new([prepare_ok(), prepare_ok()]));
    let statement = Arc::new(PgStatement::new("once"));

    client.prepare("SELECT 1", &statement).await.unwrap();

    let err = client.prepare("SELECT 1", &statement).await.unwrap_err();
    assert!(matches!(err, Error::StatementAlreadyPrepared(name) if name == "once"));

    // the first write stands
    assert_eq!(statement.handle().unwrap(), StatementHandle::new(1));
}

#[tokio::test]
async fn it_executes_a_rowless_prepared_statement() {
    let conn = MockConnection::new([
        Script::Prepare(Ok(PrepareOk {
            handle: StatementHandle::new(9),
            parameters: vec![Oid(25)],
            columns: None,
        })),
        Script::Execute(vec![complete("INSERT 0 1")]),
    ]);

    let mut client = PgClient::new(conn);
    let statement = Arc::new(PgStatement::new("ins"));

    client.prepare("INSERT INTO t VALUES ($1)", &statement).await.unwrap();
    assert!(statement.columns().unwrap().is_empty());

    let result = client
        .execute(&statement, PgArguments::new(), |_| panic!("no rows expected"))
        .await
        .unwrap();

    assert_eq!(result.rows_affected(), 1);
}

#[tokio::test]
async fn it_declines_simple_queries_by_default() {
    let mut client = PgClient::new(MinimalConnection);

    let err = client.simple_query("SELECT 1", |_| Ok(())).await.unwrap_err();

    assert!(matches!(err, Error::Unsupported("simple query protocol")));
}

#[tokio::test]
async fn it_aggregates_multi_statement_simple_queries() {
    let conn = MockConnection::new([Script::SimpleQuery(vec![
        Ok(StreamEvent::Descriptors(vec![field("a", 23)])),
        row(&[Some(b"1")]),
        complete("SELECT 1"),
        Ok(StreamEvent::Descriptors(vec![field("b", 25), field("c", 25)])),
        row(&[Some(b"x"), Some(b"y")]),
        row(&[Some(b"z"), None]),
        complete("SELECT 2"),
    ])]);

    let mut client = PgClient::new(conn);

    let mut names: Vec<String> = Vec::new();
    let result = client
        .simple_query("SELECT a FROM t1; SELECT b, c FROM t2", |row| {
            names.extend(row.columns().iter().map(|c| c.name().to_owned()));
            Ok(())
        })
        .await
        .unwrap();

    // each result set was translated against its own descriptor set
    assert_eq!(names, ["a", "b", "c", "b", "c"]);

    // counts sum; the last command tag wins
    assert_eq!(result.command(), "SELECT");
    assert_eq!(result.rows_affected(), 3);
}

#[tokio::test]
async fn it_rejects_a_row_before_any_descriptors() {
    let conn = MockConnection::new([Script::SimpleQuery(vec![
        row(&[Some(b"1")]),
        complete("SELECT 1"),
    ])]);

    let mut client = PgClient::new(conn);

    let err = client.simple_query("SELECT 1", |_| Ok(())).await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn it_rejects_redescription_of_a_prepared_statement() {
    let conn = MockConnection::new([
        Script::Prepare(Ok(PrepareOk {
            handle: StatementHandle::new(3),
            parameters: Vec::new(),
            columns: Some(vec![field("id", 23)]),
        })),
        Script::Execute(vec![
            Ok(StreamEvent::Descriptors(vec![field("other", 25)])),
            complete("SELECT 0"),
        ]),
    ]);

    let mut client = PgClient::new(conn);
    let statement = Arc::new(PgStatement::new("s"));

    client.prepare("SELECT id FROM t", &statement).await.unwrap();

    let err = client
        .execute(&statement, PgArguments::new(), |_| Ok(()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn it_rejects_a_row_with_the_wrong_number_of_values() {
    let conn = MockConnection::new([Script::Query(
        vec![field("a", 23), field("b", 25), field("c", 16)],
        vec![row(&[Some(b"1"), Some(b"2")]), complete("SELECT 1")],
    )]);

    let mut client = PgClient::new(conn);

    let err = client
        .query("SELECT a, b, c FROM t", PgArguments::new(), |_| Ok(()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ColumnCountMismatch { expected: 3, received: 2 }));
}

#[tokio::test]
async fn it_fails_a_stream_that_ends_without_a_completion_tag() {
    let conn = MockConnection::new([Script::Query(
        vec![field("a", 23)],
        vec![row(&[Some(b"1")])],
    )]);

    let mut client = PgClient::new(conn);

    let mut delivered = 0;
    let err = client
        .query("SELECT a FROM t", PgArguments::new(), |_| {
            delivered += 1;
            Ok(())
        })
        .await
        .unwrap_err();

    // the row was still delivered before the truncation was noticed
    assert_eq!(delivered, 1);
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn it_normalizes_backend_errors() {
    let notice = PgNotice::new(PgNoticeSeverity::Error, "42703", "column \"nam\" does not exist")
        .with_field(b'H', "Perhaps you meant to reference the column \"users.name\".")
        .with_field(b'P', "8");

    let conn = MockConnection::new([Script::Query(
        vec![field("nam", 25)],
        vec![Err(ConnectionError::Backend(notice))],
    )]);

    let mut client = PgClient::new(conn);

    let err = client
        .query("SELECT nam FROM users", PgArguments::new(), |_| Ok(()))
        .await
        .unwrap_err();

    match err {
        Error::Database(db) => {
            assert_eq!(db.code(), "42703");
            assert_eq!(db.message(), "column \"nam\" does not exist");
            assert_eq!(db.position(), Some(8));
            assert_eq!(
                db.hint(),
                Some("Perhaps you meant to reference the column \"users.name\".")
            );
        }

        other => panic!("expected Error::Database, got {other:?}"),
    }
}

#[tokio::test]
async fn it_dispatches_rowless_commands() {
    let conn = MockConnection::new([Script::Query(
        Vec::new(),
        vec![complete("CREATE TABLE")],
    )]);

    let mut client = PgClient::new(conn);

    let result = client
        .query("CREATE TABLE t (id int4)", PgArguments::new(), |_| {
            panic!("no rows expected")
        })
        .await
        .unwrap();

    assert_eq!(result.rows_affected(), 0);
}

#[tokio::test]
async fn it_rejects_descriptors_with_unknown_format_codes() {
    let mut bad = field("a", 23);
    bad.format = 3;

    let conn = MockConnection::new([Script::Query(vec![bad], vec![complete("SELECT 0")])]);

    let mut client = PgClient::new(conn);

    let err = client
        .query("SELECT a FROM t", PgArguments::new(), |_| Ok(()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol(_)));
}
