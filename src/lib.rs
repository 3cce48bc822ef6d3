//! # volt-client
//!
//! Synchronous wire-protocol client for VoltDB-style distributed SQL
//! databases. Typed stored-procedure invocations go out as length-framed
//! binary messages; responses come back as decoded result tables.
//!
//! ## Architecture
//!
//! ```text
//! Value / Param → WireWriter → framed bytes → TCP → node
//! node → TCP → reservoir → WireReader → Response / VoltTable
//! ```
//!
//! ### Protocol layer (pure, sync)
//! - `WireWriter` / `WireReader` - the scalar codec over in-memory buffers
//! - `Value` - tagged sum over the wire types, match-based dispatch
//! - `Decimal` - exact 128-bit fixed point, scale 12
//! - No I/O, no sockets - bytes in, bytes out
//!
//! ### Driver layer (blocking I/O)
//! - `Transport` - one length-prefixed message per exchange
//! - `Session` - login handshake, strict request/response procedure calls
//! - `Response` / `VoltTable` - the decoded result model
//!
//! The engine is single-threaded per session; run one session per worker
//! for parallelism. Connection policy (DNS, reconnect, TLS, pooling) is the
//! caller's business.
//!
//! ## Example
//!
//! ```ignore
//! use volt_client::{Config, Param, Procedure, Session, Value, wire_type};
//!
//! let config = Config {
//!     host: Some("db-node".to_string()),
//!     port: Some(21212),
//!     username: Some("ops".to_string()),
//!     password: Some("sekrit".to_string()),
//!     ..Config::default()
//! };
//! let mut session = Session::connect(&config)?;
//!
//! let insert = Procedure::new("Insert", vec![wire_type::STRING, wire_type::INTEGER]);
//! let response = session.call(
//!     &insert,
//!     &[
//!         Param::Scalar(Value::String(Some("hello".to_string()))),
//!         Param::Scalar(Value::Integer(1)),
//!     ],
//!     1,
//! )?;
//! assert!(response.is_ok());
//! ```

pub mod driver;
pub mod protocol;

pub use driver::{
    ByteStream, Config, Param, Procedure, Response, Session, Transport, VoltColumn, VoltException,
    VoltTable, exception_kind,
};
pub use protocol::{
    ARRAY, ByteOrder, DEFAULT_DECIMAL_SCALE, Decimal, NULL_DECIMAL_INDICATOR,
    NULL_STRING_INDICATOR, PROC_OK, ParseDecimalError, Value, VoltResult, WireError, WireReader,
    WireWriter, tag_name, wire_type,
};
