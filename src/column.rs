use std::num::{NonZeroI16, NonZeroI32};

use crate::connection::Field;
use crate::error::Result;
use crate::ext::ustr::UStr;
use crate::type_id::Oid;
use crate::value::PgValueFormat;

/// A validated descriptor for one output column of a query.
#[derive(Debug, Clone)]
pub struct PgColumn {
    pub(crate) ordinal: usize,
    pub(crate) name: UStr,
    pub(crate) relation_id: Option<NonZeroI32>,
    pub(crate) relation_attribute_no: Option<NonZeroI16>,
    pub(crate) type_id: Oid,
    pub(crate) type_size: i16,
    pub(crate) type_modifier: i32,
    pub(crate) format: PgValueFormat,
}

impl PgColumn {
    pub(crate) fn from_field(ordinal: usize, field: Field) -> Result<Self> {
        Ok(Self {
            ordinal,
            name: UStr::new(&field.name),
            relation_id: field.relation_id,
            relation_attribute_no: field.relation_attribute_no,
            type_id: field.type_id,
            type_size: field.type_size,
            type_modifier: field.type_modifier,
            format: PgValueFormat::from_i16(field.format)?,
        })
    }

    /// The zero-based position of this column within its row.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object ID of the table this column originates from, if it can be
    /// identified with one.
    pub fn relation_id(&self) -> Option<NonZeroI32> {
        self.relation_id
    }

    /// The attribute number of this column within its originating table, if
    /// it can be identified with one.
    pub fn relation_attribute_no(&self) -> Option<NonZeroI16> {
        self.relation_attribute_no
    }

    /// The object ID of this column's data type.
    pub fn type_id(&self) -> Oid {
        self.type_id
    }

    pub fn type_size(&self) -> i16 {
        self.type_size
    }

    pub fn type_modifier(&self) -> i32 {
        self.type_modifier
    }

    /// The wire representation of this column's values.
    pub fn format(&self) -> PgValueFormat {
        self.format
    }
}

/// A type that can resolve to a column position within `T`.
pub trait ColumnIndex<T> {
    /// Resolve to a column position, or fail if no such column exists.
    fn index(&self, container: &T) -> Result<usize>;
}
