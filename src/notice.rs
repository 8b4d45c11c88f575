use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use bytestring::ByteString;

use crate::error::Error;

/// Severity of a [`PgNotice`].
///
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PgNoticeSeverity {
    Panic,
    Fatal,
    Error,
    Warning,
    Notice,
    Debug,
    Info,
    Log,
}

impl PgNoticeSeverity {
    #[inline]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Panic | Self::Fatal | Self::Error)
    }
}

impl FromStr for PgNoticeSeverity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "PANIC" => Self::Panic,
            "FATAL" => Self::Fatal,
            "ERROR" => Self::Error,
            "WARNING" => Self::Warning,
            "NOTICE" => Self::Notice,
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "LOG" => Self::Log,

            _ => {
                return Err(err_protocol!("unknown notice severity: {:?}", s));
            }
        })
    }
}

impl Display for PgNoticeSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Panic => "PANIC",
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Log => "LOG",
        })
    }
}

/// A notice or error response raised by the PostgreSQL backend.
///
/// The severity, SQLSTATE code, and primary message are always present.
/// Every other field the backend attached is retained, keyed by its
/// single-byte protocol tag, so nothing is lost when a notice is carried
/// into an [`Error`][crate::Error].
///
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>
#[derive(Clone)]
pub struct PgNotice {
    severity: PgNoticeSeverity,
    code: ByteString,
    message: ByteString,
    fields: Vec<(u8, ByteString)>,
}

impl PgNotice {
    /// Create a notice from its three mandatory fields.
    ///
    /// The connection building this is expected to attach any remaining
    /// fields from the backend response with [`with_field`][Self::with_field].
    pub fn new(
        severity: PgNoticeSeverity,
        code: impl Into<ByteString>,
        message: impl Into<ByteString>,
    ) -> Self {
        Self { severity, code: code.into(), message: message.into(), fields: Vec::new() }
    }

    /// Attach an optional field, keyed by its protocol tag byte.
    #[must_use]
    pub fn with_field(mut self, tag: u8, value: impl Into<ByteString>) -> Self {
        self.fields.push((tag, value.into()));
        self
    }

    pub const fn severity(&self) -> PgNoticeSeverity {
        self.severity
    }

    /// The SQLSTATE code for this notice.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The primary, human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.get(b'D')
    }

    pub fn hint(&self) -> Option<&str> {
        self.get(b'H')
    }

    /// Position within the original query string, in characters, counted
    /// from one.
    pub fn position(&self) -> Option<u32> {
        self.get(b'P').and_then(|s| s.parse().ok())
    }

    pub fn internal_position(&self) -> Option<u32> {
        self.get(b'p').and_then(|s| s.parse().ok())
    }

    pub fn internal_query(&self) -> Option<&str> {
        self.get(b'q')
    }

    #[doc(alias = "where")]
    pub fn context(&self) -> Option<&str> {
        self.get(b'W')
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.get(b's')
    }

    pub fn table_name(&self) -> Option<&str> {
        self.get(b't')
    }

    pub fn column_name(&self) -> Option<&str> {
        self.get(b'c')
    }

    pub fn data_type_name(&self) -> Option<&str> {
        self.get(b'd')
    }

    pub fn constraint_name(&self) -> Option<&str> {
        self.get(b'n')
    }

    pub fn file(&self) -> Option<&str> {
        self.get(b'F')
    }

    pub fn line(&self) -> Option<u32> {
        self.get(b'L').and_then(|s| s.parse().ok())
    }

    pub fn routine(&self) -> Option<&str> {
        self.get(b'R')
    }

    /// Look up any field by its protocol tag byte.
    pub fn get(&self, tag: u8) -> Option<&str> {
        match tag {
            b'S' | b'V' => None,
            b'C' => Some(&self.code),
            b'M' => Some(&self.message),

            _ => self
                .fields
                .iter()
                .find(|(field, _)| *field == tag)
                .map(|(_, value)| value.as_ref()),
        }
    }
}

impl Display for PgNotice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity(), self.code(), self.message())
    }
}

impl Debug for PgNotice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("PgNotice");

        // the mandatory fields come first
        dbg.field("severity", &self.severity());
        dbg.field("code", &self.code());
        dbg.field("message", &self.message());

        // then whatever the backend attached, in the order it sent them
        for (tag, value) in &self.fields {
            let name = match tag {
                b'W' => "context",
                b'D' => "detail",
                b'H' => "hint",
                b'P' => "position",
                b'p' => "internal_position",
                b'q' => "internal_query",
                b's' => "schema_name",
                b't' => "table_name",
                b'c' => "column_name",
                b'd' => "data_type_name",
                b'n' => "constraint_name",
                b'F' => "file",
                b'L' => "line",
                b'R' => "routine",

                _ => continue,
            };

            dbg.field(name, &<ByteString as AsRef<str>>::as_ref(value));
        }

        dbg.finish()
    }
}
