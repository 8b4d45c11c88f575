use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::column::PgColumn;
use crate::connection::Field;
use crate::error::{Error, Result};
use crate::ext::ustr::UStr;
use crate::type_id::Oid;

/// The column metadata for one query shape.
///
/// Built once per execution (or once per prepared statement) and shared,
/// read-only, by every row produced from it. The name map is the authority
/// for name-to-position resolution.
#[derive(Debug, Default)]
pub struct PgStatementMetadata {
    pub(crate) columns: Vec<PgColumn>,
    pub(crate) column_names: HashMap<UStr, usize>,
    pub(crate) parameters: Vec<Oid>,
}

impl PgStatementMetadata {
    pub(crate) fn from_fields(fields: Vec<Field>, parameters: Vec<Oid>) -> Result<Self> {
        let mut columns = Vec::with_capacity(fields.len());
        let mut column_names = HashMap::with_capacity(fields.len());

        for (ordinal, field) in fields.into_iter().enumerate() {
            let column = PgColumn::from_field(ordinal, field)?;

            column_names.insert(column.name.clone(), ordinal);
            columns.push(column);
        }

        Ok(Self { columns, column_names, parameters })
    }

    pub fn columns(&self) -> &[PgColumn] {
        &self.columns
    }

    /// The type of each statement parameter, if known.
    pub fn parameters(&self) -> &[Oid] {
        &self.parameters
    }
}

/// An opaque server-side identifier for a compiled statement, assigned by
/// the connection at prepare time and passed back verbatim on execute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StatementHandle(u32);

impl StatementHandle {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
pub(crate) struct StatementInner {
    pub(crate) handle: StatementHandle,
    pub(crate) metadata: Arc<PgStatementMetadata>,
}

/// A named prepared statement, owned by the caller.
///
/// Created empty, passed to a prepare command which fills the cache slot
/// exactly once, then passed back on each execute. The slot is a single
/// assignment cell: the write made by the prepare is visible to any execute
/// issued after the prepare's future resolves, and later reads return the
/// identical handle and metadata table.
#[derive(Debug)]
pub struct PgStatement {
    name: UStr,
    inner: OnceCell<StatementInner>,
}

impl PgStatement {
    pub fn new(name: impl Into<UStr>) -> Self {
        Self { name: name.into(), inner: OnceCell::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this statement has been prepared.
    pub fn is_prepared(&self) -> bool {
        self.inner.get().is_some()
    }

    /// The server-side handle, if this statement has been prepared.
    pub fn handle(&self) -> Result<StatementHandle> {
        Ok(self.get()?.handle)
    }

    /// The column metadata, if this statement has been prepared.
    pub fn metadata(&self) -> Result<&Arc<PgStatementMetadata>> {
        Ok(&self.get()?.metadata)
    }

    pub fn columns(&self) -> Result<&[PgColumn]> {
        Ok(&self.get()?.metadata.columns)
    }

    pub(crate) fn get(&self) -> Result<&StatementInner> {
        self.inner
            .get()
            .ok_or_else(|| Error::StatementNotPrepared(self.name.to_string()))
    }

    pub(crate) fn set(
        &self,
        handle: StatementHandle,
        metadata: Arc<PgStatementMetadata>,
    ) -> Result<()> {
        self.inner
            .set(StatementInner { handle, metadata })
            .map_err(|_| Error::StatementAlreadyPrepared(self.name.to_string()))
    }
}
