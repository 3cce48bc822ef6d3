//! Procedure-Call Result Model
//!
//! Decodes the response envelope: status, the server-side exception block,
//! zero or more result tables, the info string and the echoed client handle.
//! Tables are self-describing (column schema + rows) and can be re-encoded,
//! which the tests lean on.

use tracing::warn;

use crate::protocol::codec::{WireReader, WireWriter};
use crate::protocol::error::{VoltResult, WireError};
use crate::protocol::types::PROC_OK;
use crate::protocol::value::{self, Value};

/// One column of a result table.
#[derive(Debug, Clone)]
pub struct VoltColumn {
    pub type_tag: i8,
    pub name: String,
}

impl VoltColumn {
    pub fn new(type_tag: i8, name: impl Into<String>) -> Self {
        Self {
            type_tag,
            name: name.into(),
        }
    }
}

impl PartialEq for VoltColumn {
    /// Same type and name - except that a column with no name matches
    /// anything. The server omits column names on some empty result sets.
    fn eq(&self, other: &Self) -> bool {
        if self.name.is_empty() || other.name.is_empty() {
            return true;
        }
        self.type_tag == other.type_tag && self.name == other.name
    }
}

/// Definition and content of one result table.
#[derive(Debug, Clone, Default)]
pub struct VoltTable {
    pub columns: Vec<VoltColumn>,
    pub rows: Vec<Vec<Value>>,
}

impl PartialEq for VoltTable {
    fn eq(&self, other: &Self) -> bool {
        if !self.rows.is_empty() {
            return self.columns == other.columns && self.rows == other.rows;
        }
        self.rows == other.rows
    }
}

impl VoltTable {
    /// Decode one table off the reservoir:
    /// total length, header (length, column count, types, names), then the
    /// row count and each length-prefixed row.
    pub fn decode(reader: &mut WireReader) -> VoltResult<Self> {
        let _table_len = reader.read_i32()?;
        let _header_len = reader.read_i32()?;

        let column_count = reader.read_i16()?;
        if column_count < 0 {
            return Err(WireError::Malformed(format!(
                "negative column count {column_count}"
            )));
        }
        let mut columns = Vec::with_capacity(column_count as usize);
        for _ in 0..column_count {
            columns.push(VoltColumn::new(reader.read_i8()?, String::new()));
        }
        for column in &mut columns {
            column.name = reader.read_string()?.unwrap_or_default();
        }

        let row_count = reader.read_i32()?;
        if row_count < 0 {
            return Err(WireError::Malformed(format!(
                "negative row count {row_count}"
            )));
        }
        let mut rows = Vec::with_capacity(row_count as usize);
        for _ in 0..row_count {
            let _row_len = reader.read_i32()?;
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                row.push(value::read_value(reader, column.type_tag)?);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Encode the table onto an accumulator. Header and rows are built in
    /// their own buffers first so every length prefix is computed from
    /// finished content, then spliced into the outer message.
    pub fn encode(&self, writer: &mut WireWriter) -> VoltResult<()> {
        if self.columns.len() > i16::MAX as usize {
            return Err(WireError::Domain(format!(
                "too many columns: {}",
                self.columns.len()
            )));
        }

        let mut header = WireWriter::new(writer.order());
        header.write_i16(self.columns.len() as i16);
        for column in &self.columns {
            header.write_i8(column.type_tag);
        }
        for column in &self.columns {
            header.write_string(Some(&column.name));
        }

        let mut body = WireWriter::new(writer.order());
        body.write_i32(header.len() as i32);
        body.write_raw(header.as_bytes());

        body.write_i32(self.rows.len() as i32);
        for row in &self.rows {
            let mut row_buf = WireWriter::new(writer.order());
            for (column, v) in self.columns.iter().zip(row) {
                value::write_value(&mut row_buf, column.type_tag, v)?;
            }
            body.write_i32(row_buf.len() as i32);
            body.write_raw(row_buf.as_bytes());
        }

        body.prepend_length();
        writer.write_raw(body.as_bytes());
        Ok(())
    }
}

/// Serializable exception kinds the server can attach to a response.
pub mod exception_kind {
    pub const NONE: i8 = 0;
    pub const EE: i8 = 1;
    pub const SQL: i8 = 2;
    pub const CONSTRAINT_FAILURE: i8 = 3;
    pub const GENERIC: i8 = 4;
}

/// A server-side exception carried on a response. This is data, not a
/// control-flow break: the response still arrives with its tables.
#[derive(Debug, Clone, PartialEq)]
pub enum VoltException {
    None,
    Ee {
        message: String,
        error_code: i32,
    },
    Sql {
        message: String,
        sql_state: String,
    },
    ConstraintFailure {
        message: String,
        sql_state: String,
        constraint_type: i32,
        table_id: i32,
        tuple: Vec<u8>,
    },
    Generic {
        message: String,
    },
    Unknown {
        kind: i8,
        message: String,
    },
}

impl VoltException {
    pub fn is_none(&self) -> bool {
        matches!(self, VoltException::None)
    }

    /// Decode the exception block: an i16 total length (0 = no exception),
    /// then a kind byte and its payload. The message on this path is
    /// i16-length-prefixed, unlike general STRINGs; that quirk is part of
    /// the format.
    pub fn decode(reader: &mut WireReader) -> VoltResult<Self> {
        let length = reader.read_i16()?;
        if length == 0 {
            return Ok(VoltException::None);
        }
        if length < 0 {
            return Err(WireError::Malformed(format!(
                "negative exception block length {length}"
            )));
        }

        let kind = reader.read_i8()?;
        if kind == exception_kind::NONE {
            return Ok(VoltException::None);
        }

        let message_len = reader.read_i16()?;
        if message_len < 0 {
            return Err(WireError::Malformed(format!(
                "negative exception message length {message_len}"
            )));
        }
        let raw = reader.read_bytes(message_len as usize)?;
        let message = String::from_utf8_lossy(&raw).into_owned();

        match kind {
            exception_kind::EE => {
                let error_code = reader.read_i32()?;
                warn!(error_code, %message, "execution engine exception");
                Ok(VoltException::Ee {
                    message,
                    error_code,
                })
            }
            exception_kind::SQL => {
                let sql_state = read_sql_state(reader)?;
                warn!(%sql_state, %message, "sql exception");
                Ok(VoltException::Sql { message, sql_state })
            }
            exception_kind::CONSTRAINT_FAILURE => {
                let sql_state = read_sql_state(reader)?;
                let constraint_type = reader.read_i32()?;
                let table_id = reader.read_i32()?;
                let buffer_size = reader.read_i32()?;
                if buffer_size < 0 {
                    return Err(WireError::Malformed(format!(
                        "negative constraint tuple size {buffer_size}"
                    )));
                }
                let tuple = reader.read_bytes(buffer_size as usize)?;
                warn!(constraint_type, table_id, %message, "constraint failure");
                Ok(VoltException::ConstraintFailure {
                    message,
                    sql_state,
                    constraint_type,
                    table_id,
                    tuple,
                })
            }
            exception_kind::GENERIC => {
                warn!(%message, "generic server exception");
                Ok(VoltException::Generic { message })
            }
            other => {
                // skip whatever the unrecognized payload carries and move on
                let skip = length as i64 - 3 - 2 - message_len as i64;
                if skip > 0 {
                    reader.read_bytes(skip as usize)?;
                }
                warn!(kind = other, %message, "unknown server exception kind");
                Ok(VoltException::Unknown {
                    kind: other,
                    message,
                })
            }
        }
    }
}

fn read_sql_state(reader: &mut WireReader) -> VoltResult<String> {
    let raw = reader.read_bytes(5)?;
    Ok(raw.iter().map(|&b| b as char).collect())
}

/// A decoded procedure-call response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub version: i8,
    pub status: i8,
    pub roundtrip_time_ms: i32,
    pub exception: VoltException,
    pub tables: Vec<VoltTable>,
    pub info: Option<String>,
    pub client_handle: i64,
}

impl Response {
    /// Decode the envelope in its fixed order from a fully buffered message.
    pub fn decode(reader: &mut WireReader) -> VoltResult<Self> {
        let version = reader.read_i8()?;
        let status = reader.read_i8()?;
        let roundtrip_time_ms = reader.read_i32()?;
        let exception = VoltException::decode(reader)?;

        let table_count = reader.read_i16()?;
        if table_count < 0 {
            return Err(WireError::Malformed(format!(
                "negative table count {table_count}"
            )));
        }
        let mut tables = Vec::with_capacity(table_count as usize);
        for _ in 0..table_count {
            tables.push(VoltTable::decode(reader)?);
        }

        let info = reader.read_string()?;
        let client_handle = reader.read_i64()?;

        Ok(Self {
            version,
            status,
            roundtrip_time_ms,
            exception,
            tables,
            info,
            client_handle,
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status == PROC_OK
    }

    /// First result table, if any.
    pub fn table(&self) -> Option<&VoltTable> {
        self.tables.first()
    }
}
