use bytes::Bytes;

/// The collection of bind values for one execution of a parameterized query.
///
/// Values are already encoded for the wire; this crate forwards them to the
/// connection opaquely and in order.
#[derive(Debug, Clone, Default)]
pub struct PgArguments {
    values: Vec<Option<Bytes>>,
}

impl PgArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an encoded parameter value.
    pub fn add(&mut self, value: impl Into<Bytes>) -> &mut Self {
        self.values.push(Some(value.into()));
        self
    }

    /// Append a SQL `NULL` parameter.
    pub fn add_null(&mut self) -> &mut Self {
        self.values.push(None);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The encoded values, in bind order.
    pub fn values(&self) -> &[Option<Bytes>] {
        &self.values
    }
}
