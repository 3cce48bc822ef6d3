//! VoltDB Wire-Type Tags and Protocol Constants
//!
//! Every value on the wire is identified by a one-byte type tag. The set is
//! closed; presenting anything else to the dispatcher is an error.

/// VoltDB wire-type tags
#[allow(dead_code)]
pub mod wire_type {
    pub const NULL: i8 = 1;
    pub const TINYINT: i8 = 3; // int8
    pub const SMALLINT: i8 = 4; // int16
    pub const INTEGER: i8 = 5; // int32
    pub const BIGINT: i8 = 6; // int64
    pub const FLOAT: i8 = 8; // float64
    pub const STRING: i8 = 9;
    pub const TIMESTAMP: i8 = 11; // 8 byte microsecond epoch
    pub const MONEY: i8 = 20; // 8 byte long, units of 1/10000
    pub const VOLTTABLE: i8 = 21;
    pub const DECIMAL: i8 = 22; // 16 byte fixed point
    pub const DECIMAL_STRING: i8 = 23;
}

/// Pseudo-tag marking an array-shaped parameter in an invocation.
pub const ARRAY: i8 = -99;

/// Length prefix value that encodes a NULL string.
pub const NULL_STRING_INDICATOR: i32 = -1;

/// The 16-byte DECIMAL NULL sentinel: the minimum signed 128-bit integer.
pub const NULL_DECIMAL_INDICATOR: [u8; 16] = [
    0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Fractional digits carried by every wire DECIMAL.
pub const DEFAULT_DECIMAL_SCALE: u32 = 12;

/// Maximum total significant digits of a DECIMAL.
pub const MAX_DECIMAL_PRECISION: u32 = 38;

/// Maximum digits left of the decimal point.
pub const MAX_DECIMAL_WHOLE_DIGITS: u32 = 26;

/// Procedure status code for success.
pub const PROC_OK: i8 = 0;

/// Map a wire-type tag to a human-readable name
pub fn tag_name(tag: i8) -> &'static str {
    match tag {
        wire_type::NULL => "null",
        wire_type::TINYINT => "tinyint",
        wire_type::SMALLINT => "smallint",
        wire_type::INTEGER => "integer",
        wire_type::BIGINT => "bigint",
        wire_type::FLOAT => "float",
        wire_type::STRING => "string",
        wire_type::TIMESTAMP => "timestamp",
        wire_type::MONEY => "money",
        wire_type::VOLTTABLE => "volttable",
        wire_type::DECIMAL => "decimal",
        wire_type::DECIMAL_STRING => "decimal string",
        ARRAY => "array marker",
        _ => "unknown",
    }
}
