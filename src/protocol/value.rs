//! Tagged Values and Type Dispatch
//!
//! One `Value` variant per dispatchable wire type, and a single match per
//! direction in place of the runtime-keyed method maps the protocol grew up
//! with. MONEY and VOLTTABLE tags exist on the wire but are not scalar
//! values: money has a dedicated codec reader, tables are decoded by the
//! result model. Presenting either here is `UnsupportedType`.

use chrono::{DateTime, Utc};

use super::codec::{WireReader, WireWriter};
use super::decimal::Decimal;
use super::error::{VoltResult, WireError};
use super::types::{ARRAY, tag_name, wire_type};

/// A typed scalar value off (or for) the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f64),
    /// `None` is the NULL string.
    String(Option<String>),
    Timestamp(DateTime<Utc>),
    /// `None` is the NULL decimal sentinel.
    Decimal(Option<Decimal>),
    /// Decimal carried as text on the wire.
    DecimalString(Option<Decimal>),
}

impl Value {
    /// The wire-type tag this value serializes under.
    pub fn tag(&self) -> i8 {
        match self {
            Value::Null => wire_type::NULL,
            Value::TinyInt(_) => wire_type::TINYINT,
            Value::SmallInt(_) => wire_type::SMALLINT,
            Value::Integer(_) => wire_type::INTEGER,
            Value::BigInt(_) => wire_type::BIGINT,
            Value::Float(_) => wire_type::FLOAT,
            Value::String(_) => wire_type::STRING,
            Value::Timestamp(_) => wire_type::TIMESTAMP,
            Value::Decimal(_) => wire_type::DECIMAL,
            Value::DecimalString(_) => wire_type::DECIMAL_STRING,
        }
    }

    /// Widen any integer variant to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Integer(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(Some(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Value::Decimal(Some(d)) | Value::DecimalString(Some(d)) => Some(d),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// NULL in any of its per-type spellings.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::String(None) | Value::Decimal(None) | Value::DecimalString(None)
        )
    }
}

/// Tags the scalar dispatcher services.
pub fn is_dispatchable(tag: i8) -> bool {
    matches!(
        tag,
        wire_type::NULL
            | wire_type::TINYINT
            | wire_type::SMALLINT
            | wire_type::INTEGER
            | wire_type::BIGINT
            | wire_type::FLOAT
            | wire_type::STRING
            | wire_type::TIMESTAMP
            | wire_type::DECIMAL
            | wire_type::DECIMAL_STRING
    )
}

/// Read one value of the given wire type.
pub fn read_value(reader: &mut WireReader, tag: i8) -> VoltResult<Value> {
    match tag {
        wire_type::NULL => Ok(Value::Null),
        wire_type::TINYINT => Ok(Value::TinyInt(reader.read_i8()?)),
        wire_type::SMALLINT => Ok(Value::SmallInt(reader.read_i16()?)),
        wire_type::INTEGER => Ok(Value::Integer(reader.read_i32()?)),
        wire_type::BIGINT => Ok(Value::BigInt(reader.read_i64()?)),
        wire_type::FLOAT => Ok(Value::Float(reader.read_f64()?)),
        wire_type::STRING => Ok(Value::String(reader.read_string()?)),
        wire_type::TIMESTAMP => Ok(Value::Timestamp(reader.read_timestamp()?)),
        wire_type::DECIMAL => Ok(Value::Decimal(reader.read_decimal()?)),
        wire_type::DECIMAL_STRING => Ok(Value::DecimalString(reader.read_decimal_string()?)),
        other => Err(WireError::UnsupportedType(other)),
    }
}

/// Write one value under the declared wire type. The declared tag must match
/// the value's own kind; NULL writes nothing.
pub fn write_value(writer: &mut WireWriter, tag: i8, value: &Value) -> VoltResult<()> {
    match (tag, value) {
        (wire_type::NULL, Value::Null) => {
            writer.write_null();
            Ok(())
        }
        (wire_type::TINYINT, Value::TinyInt(v)) => {
            writer.write_i8(*v);
            Ok(())
        }
        (wire_type::SMALLINT, Value::SmallInt(v)) => {
            writer.write_i16(*v);
            Ok(())
        }
        (wire_type::INTEGER, Value::Integer(v)) => {
            writer.write_i32(*v);
            Ok(())
        }
        (wire_type::BIGINT, Value::BigInt(v)) => {
            writer.write_i64(*v);
            Ok(())
        }
        (wire_type::FLOAT, Value::Float(v)) => {
            writer.write_f64(*v);
            Ok(())
        }
        (wire_type::STRING, Value::String(v)) => {
            writer.write_string(v.as_deref());
            Ok(())
        }
        (wire_type::TIMESTAMP, Value::Timestamp(t)) => {
            writer.write_timestamp(t);
            Ok(())
        }
        (wire_type::DECIMAL, Value::Decimal(v)) => writer.write_decimal(v.as_ref()),
        (wire_type::DECIMAL_STRING, Value::DecimalString(v)) => {
            writer.write_decimal_string(v.as_ref());
            Ok(())
        }
        (tag, _) if !is_dispatchable(tag) => Err(WireError::UnsupportedType(tag)),
        (tag, value) => Err(WireError::Domain(format!(
            "{} value cannot be written as wire type {}",
            tag_name(value.tag()),
            tag_name(tag)
        ))),
    }
}

/// Read a leading tag byte, then the value it announces.
pub fn read_tagged(reader: &mut WireReader) -> VoltResult<Value> {
    let tag = reader.read_i8()?;
    read_value(reader, tag)
}

/// Write the tag byte, then the value.
pub fn write_tagged(writer: &mut WireWriter, tag: i8, value: &Value) -> VoltResult<()> {
    if !is_dispatchable(tag) {
        return Err(WireError::UnsupportedType(tag));
    }
    writer.write_i8(tag);
    write_value(writer, tag, value)
}

/// Write an i16 element count, then each element under the scalar writer.
/// An empty slice writes nothing at all.
pub fn write_array(writer: &mut WireWriter, tag: i8, values: &[Value]) -> VoltResult<()> {
    if values.is_empty() {
        return Ok(());
    }
    if !is_dispatchable(tag) {
        return Err(WireError::UnsupportedType(tag));
    }
    if values.len() > i16::MAX as usize {
        return Err(WireError::Domain(format!(
            "too many array elements: {} (the limit is {})",
            values.len(),
            i16::MAX
        )));
    }
    writer.write_i16(values.len() as i16);
    for value in values {
        write_value(writer, tag, value)?;
    }
    Ok(())
}

/// Write the ARRAY marker, the element tag, then the counted elements.
pub fn write_tagged_array(writer: &mut WireWriter, tag: i8, values: &[Value]) -> VoltResult<()> {
    if !is_dispatchable(tag) {
        return Err(WireError::UnsupportedType(tag));
    }
    writer.write_i8(ARRAY);
    writer.write_i8(tag);
    write_array(writer, tag, values)
}
