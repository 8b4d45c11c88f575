use std::fmt;

/// A PostgreSQL object identifier, used for data types and system objects
/// such as the table a result column originates from.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Oid(
    /// The raw unsigned integer value sent over the wire
    pub u32,
);

impl Oid {
    /// Wrap a `u32` as an OID.
    pub const fn from_u32(oid: u32) -> Self {
        Self(oid)
    }

    /// Get the corresponding `u32` from the OID.
    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
