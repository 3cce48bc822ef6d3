//! Driver Module (blocking I/O layer)
//!
//! Everything that touches the socket lives here:
//! - `transport.rs` - framed message exchange, accumulator + reservoir
//! - `session.rs` - login handshake and procedure calls
//! - `response.rs` - the decoded response envelope and result tables

mod response;
mod session;
mod transport;

pub use response::{Response, VoltColumn, VoltException, VoltTable, exception_kind};
pub use session::{Config, Param, Procedure, Session};
pub use transport::{ByteStream, Transport};
