//! Wire Protocol (pure layer)
//!
//! No I/O here - just values to bytes and back. The driver layer owns the
//! socket and feeds these codecs.

pub mod codec;
pub mod decimal;
pub mod error;
pub mod types;
pub mod value;

pub use codec::{ByteOrder, WireReader, WireWriter};
pub use decimal::{Decimal, ParseDecimalError};
pub use error::{VoltResult, WireError};
pub use types::{
    ARRAY, DEFAULT_DECIMAL_SCALE, NULL_DECIMAL_INDICATOR, NULL_STRING_INDICATOR, PROC_OK, tag_name,
    wire_type,
};
pub use value::Value;
