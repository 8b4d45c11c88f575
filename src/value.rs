use crate::error::Result;

/// The wire representation of a column value, as declared by the backend in
/// a row description.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i16)]
pub enum PgValueFormat {
    Text = 0,
    Binary = 1,
}

impl PgValueFormat {
    /// Interpret a raw format code from a row description.
    ///
    /// An unrecognized code is a protocol error. Earlier implementations
    /// silently treated anything non-zero as binary; mislabeling a column's
    /// representation corrupts every downstream read of it, so this is
    /// rejected instead.
    pub(crate) fn from_i16(format: i16) -> Result<Self> {
        match format {
            0 => Ok(Self::Text),
            1 => Ok(Self::Binary),

            _ => Err(err_protocol!("unknown value format: {}", format)),
        }
    }
}
