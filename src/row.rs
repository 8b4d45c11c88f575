use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use bytes::Bytes;

use crate::column::{ColumnIndex, PgColumn};
use crate::error::{Error, Result};
use crate::statement::PgStatementMetadata;

/// A single row from a query, addressable by column position or name.
///
/// Every row of one execution shares the same metadata table; only the
/// values are per-row.
pub struct PgRow {
    pub(crate) values: Vec<Option<Bytes>>,
    pub(crate) metadata: Arc<PgStatementMetadata>,
}

impl PgRow {
    /// Pair raw column values with their shared metadata.
    ///
    /// The backend promises one value per described column; rather than
    /// trust that, a mismatch is reported as a typed error so a malformed
    /// row can never be observed truncated.
    pub(crate) fn from_values(
        values: Vec<Option<Bytes>>,
        metadata: &Arc<PgStatementMetadata>,
    ) -> Result<Self> {
        if values.len() != metadata.columns.len() {
            return Err(Error::ColumnCountMismatch {
                expected: metadata.columns.len(),
                received: values.len(),
            });
        }

        Ok(Self { values, metadata: Arc::clone(metadata) })
    }

    pub fn columns(&self) -> &[PgColumn] {
        &self.metadata.columns
    }

    /// The number of columns in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The descriptor for a column, by position or name.
    pub fn column<I>(&self, index: I) -> Result<&PgColumn>
    where
        I: ColumnIndex<Self>,
    {
        Ok(&self.metadata.columns[index.index(self)?])
    }

    /// The raw value of a column, by position or name.
    ///
    /// `None` is a SQL `NULL`. No decoding is performed; the bytes are in
    /// the representation declared by the column's format code.
    pub fn try_get_raw<I>(&self, index: I) -> Result<Option<&Bytes>>
    where
        I: ColumnIndex<Self>,
    {
        Ok(self.values[index.index(self)?].as_ref())
    }
}

impl ColumnIndex<PgRow> for usize {
    fn index(&self, row: &PgRow) -> Result<usize> {
        if *self >= row.len() {
            return Err(Error::ColumnIndexOutOfBounds { index: *self, len: row.len() });
        }

        Ok(*self)
    }
}

impl ColumnIndex<PgRow> for &'_ str {
    fn index(&self, row: &PgRow) -> Result<usize> {
        row.metadata
            .column_names
            .get(*self)
            .ok_or_else(|| Error::ColumnNotFound((*self).into()))
            .copied()
    }
}

impl Debug for PgRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PgRow ")?;

        let mut debug_map = f.debug_map();
        for (value, column) in self.values.iter().zip(&self.metadata.columns) {
            debug_map.entry(&column.name, value);
        }

        debug_map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::PgRow;
    use crate::connection::Field;
    use crate::error::Error;
    use crate::statement::PgStatementMetadata;
    use crate::type_id::Oid;
    use bytes::Bytes;
    use std::sync::Arc;

    fn metadata(names: &[&str]) -> Arc<PgStatementMetadata> {
        let fields = names
            .iter()
            .map(|name| Field {
                name: (*name).into(),
                relation_id: None,
                relation_attribute_no: None,
                type_id: Oid(25),
                type_size: -1,
                type_modifier: -1,
                format: 0,
            })
            .collect();

        Arc::new(PgStatementMetadata::from_fields(fields, Vec::new()).unwrap())
    }

    #[test]
    fn it_preserves_positional_order() {
        let metadata = metadata(&["a", "b", "c"]);
        let row = PgRow::from_values(
            vec![Some(Bytes::from_static(b"1")), None, Some(Bytes::from_static(b"3"))],
            &metadata,
        )
        .unwrap();

        assert_eq!(row.len(), 3);
        assert_eq!(row.try_get_raw(0).unwrap(), Some(&Bytes::from_static(b"1")));
        assert_eq!(row.try_get_raw(1).unwrap(), None);
        assert_eq!(row.try_get_raw(2).unwrap(), Some(&Bytes::from_static(b"3")));
    }

    #[test]
    fn it_resolves_names_through_the_shared_table() {
        let metadata = metadata(&["id", "name"]);
        let row = PgRow::from_values(
            vec![Some(Bytes::from_static(b"1")), Some(Bytes::from_static(b"ada"))],
            &metadata,
        )
        .unwrap();

        // name lookup and positional lookup agree, for every column
        for column in row.columns() {
            assert_eq!(
                row.try_get_raw(column.name()).unwrap(),
                row.try_get_raw(column.ordinal()).unwrap()
            );
        }

        assert!(matches!(
            row.try_get_raw("missing"),
            Err(Error::ColumnNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn it_rejects_a_cardinality_mismatch() {
        let metadata = metadata(&["a", "b", "c"]);

        let err = PgRow::from_values(vec![Some(Bytes::from_static(b"1"))], &metadata).unwrap_err();

        assert!(matches!(
            err,
            Error::ColumnCountMismatch { expected: 3, received: 1 }
        ));
    }

    #[test]
    fn it_bounds_checks_positional_access() {
        let metadata = metadata(&["a"]);
        let row = PgRow::from_values(vec![None], &metadata).unwrap();

        assert!(matches!(
            row.try_get_raw(1),
            Err(Error::ColumnIndexOutOfBounds { index: 1, len: 1 })
        ));
    }
}
