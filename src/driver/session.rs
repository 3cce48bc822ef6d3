//! Session
//!
//! The connected, authenticated conversation with one database node: the
//! login handshake, then strict request/response procedure calls. One
//! session per worker - nothing here is shareable across threads.

use std::net::TcpStream;
use std::time::Duration;

use sha1::{Digest, Sha1};
use tracing::debug;

use super::response::Response;
use super::transport::{ByteStream, Transport};
use crate::protocol::codec::ByteOrder;
use crate::protocol::error::{VoltResult, WireError};
use crate::protocol::value::{self, Value};

/// Connection settings for one session.
///
/// `host`/`port` left unset means offline codec mode: the in-memory encoders
/// work, anything touching the socket fails `Disconnected`. Authentication
/// runs only when both `username` and `password` are supplied.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub input_byte_order: ByteOrder,
}

/// A parameter to a procedure call: one scalar, or a sequence of scalars.
/// Strings are always scalars, never sequences of characters.
#[derive(Debug, Clone)]
pub enum Param {
    Scalar(Value),
    Vector(Vec<Value>),
}

/// A named stored procedure and its declared parameter types.
#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: String,
    pub param_types: Vec<i8>,
}

impl Procedure {
    pub fn new(name: impl Into<String>, param_types: Vec<i8>) -> Self {
        Self {
            name: name.into(),
            param_types,
        }
    }
}

/// An authenticated wire session with one database node.
pub struct Session<S: ByteStream = TcpStream> {
    transport: Transport<S>,
    poisoned: bool,
    host_id: i32,
    connection_id: i64,
    cluster_start_micros: i64,
    leader_address: i32,
}

impl Session<TcpStream> {
    /// Connect per the config: TCP with `TCP_NODELAY`, then the login
    /// handshake when credentials are present. Without host and port the
    /// session comes up in offline codec mode.
    pub fn connect(config: &Config) -> VoltResult<Self> {
        let (host, port) = match (&config.host, config.port) {
            (Some(host), Some(port)) => (host.as_str(), port),
            _ => {
                return Ok(Self::from_transport(Transport::offline(
                    config.input_byte_order,
                )));
            }
        };

        let stream = TcpStream::connect((host, port)).map_err(WireError::from_io)?;
        stream.set_nodelay(true).map_err(WireError::from_io)?;
        debug!(host, port, "connected");

        let mut session = Self::over(stream, config.input_byte_order);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            session.authenticate(username, password)?;
        }
        Ok(session)
    }
}

impl<S: ByteStream> Session<S> {
    /// Run the session over an already-established stream.
    pub fn over(stream: S, order: ByteOrder) -> Self {
        Self::from_transport(Transport::new(Some(stream), order))
    }

    /// Offline codec mode: no socket, big-endian default.
    pub fn offline() -> Self {
        Self::from_transport(Transport::offline(ByteOrder::default()))
    }

    fn from_transport(transport: Transport<S>) -> Self {
        Self {
            transport,
            poisoned: false,
            host_id: 0,
            connection_id: 0,
            cluster_start_micros: 0,
            leader_address: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Host id reported by the login handshake.
    pub fn host_id(&self) -> i32 {
        self.host_id
    }

    /// Connection id reported by the login handshake.
    pub fn connection_id(&self) -> i64 {
        self.connection_id
    }

    /// Cluster start time (microsecond epoch) from the login handshake.
    pub fn cluster_start_micros(&self) -> i64 {
        self.cluster_start_micros
    }

    /// Leader inet address from the login handshake.
    pub fn leader_address(&self) -> i32 {
        self.leader_address
    }

    /// Per-connection byte-order override; applies to everything that
    /// follows on this stream.
    pub fn set_input_byte_order(&mut self, mode: u8) {
        self.transport.set_input_byte_order(mode);
    }

    /// Deadline for response reads. Expiry surfaces as `Timeout` and poisons
    /// the session.
    pub fn set_read_deadline(&mut self, deadline: Option<Duration>) -> VoltResult<()> {
        self.transport.set_read_deadline(deadline)
    }

    /// Direct access to the write accumulator, for hand-built messages.
    pub fn writer_mut(&mut self) -> &mut crate::protocol::codec::WireWriter {
        self.transport.writer_mut()
    }

    /// Direct access to the read reservoir.
    pub fn reader_mut(&mut self) -> &mut crate::protocol::codec::WireReader {
        self.transport.reader_mut()
    }

    /// Gate every wire operation: fail fast once poisoned, poison on fatal
    /// errors, and drop any partial accumulator a failed encode left behind.
    fn run<T>(&mut self, op: impl FnOnce(&mut Self) -> VoltResult<T>) -> VoltResult<T> {
        if self.poisoned {
            return Err(WireError::Disconnected(
                "session poisoned by an earlier protocol error".to_string(),
            ));
        }
        match op(self) {
            Err(e) => {
                if e.poisons() {
                    self.poisoned = true;
                }
                self.transport.writer_mut().clear();
                Err(e)
            }
            ok => ok,
        }
    }

    /// Login handshake. A length-preceded username and password digest go
    /// out even when authentication is turned off server-side.
    pub fn authenticate(&mut self, username: &str, password: &str) -> VoltResult<()> {
        self.run(|s| s.authenticate_inner(username, password))
    }

    fn authenticate_inner(&mut self, username: &str, password: &str) -> VoltResult<()> {
        let writer = self.transport.writer_mut();
        writer.write_u8(0); // protocol version
        writer.write_string(Some(username));
        // 20 raw digest bytes, no length prefix
        let digest = Sha1::digest(password.as_bytes());
        writer.write_raw(digest.as_slice());
        writer.prepend_length();
        self.transport.flush()?;

        self.transport.buffer_for_read()?;
        let reader = self.transport.reader_mut();
        let _server_version = reader.read_u8()?;
        if reader.read_u8()? != 0 {
            return Err(WireError::AuthFailed);
        }
        self.host_id = reader.read_i32()?;
        self.connection_id = reader.read_i64()?;
        self.cluster_start_micros = reader.read_i64()?;
        self.leader_address = reader.read_i32()?;

        // cluster build string, length-counted, unused
        let reader = self.transport.reader_mut();
        let build_len = reader.read_i32()?;
        if build_len < 0 {
            return Err(WireError::Malformed(format!(
                "negative build string length {build_len}"
            )));
        }
        reader.read_bytes(build_len as usize)?;

        debug!(
            username,
            host_id = self.host_id,
            connection_id = self.connection_id,
            "authenticated"
        );
        Ok(())
    }

    /// Invoke a procedure and wait for its response.
    pub fn call(
        &mut self,
        procedure: &Procedure,
        params: &[Param],
        client_handle: i64,
    ) -> VoltResult<Response> {
        self.run(|s| {
            s.invoke(procedure, params, client_handle)?;
            s.transport.buffer_for_read()?;
            Response::decode(s.transport.reader_mut())
        })
    }

    /// Invoke a procedure and deliberately discard the response. The caller
    /// must not issue another call until the peer's reply is drained or the
    /// connection is abandoned.
    pub fn call_no_response(
        &mut self,
        procedure: &Procedure,
        params: &[Param],
        client_handle: i64,
    ) -> VoltResult<()> {
        self.run(|s| s.invoke(procedure, params, client_handle))
    }

    fn invoke(
        &mut self,
        procedure: &Procedure,
        params: &[Param],
        client_handle: i64,
    ) -> VoltResult<()> {
        if params.len() != procedure.param_types.len() {
            return Err(WireError::Domain(format!(
                "procedure {} declares {} parameters, {} supplied",
                procedure.name,
                procedure.param_types.len(),
                params.len()
            )));
        }
        if params.len() > i16::MAX as usize {
            return Err(WireError::Domain(format!(
                "too many parameters: {} (the limit is {})",
                params.len(),
                i16::MAX
            )));
        }

        let writer = self.transport.writer_mut();
        writer.write_u8(0); // invocation version
        writer.write_string(Some(&procedure.name));
        writer.write_i64(client_handle);
        writer.write_i16(params.len() as i16);
        for (tag, param) in procedure.param_types.iter().zip(params) {
            match param {
                Param::Scalar(v) => value::write_tagged(writer, *tag, v)?,
                Param::Vector(vs) => value::write_tagged_array(writer, *tag, vs)?,
            }
        }
        writer.prepend_length();
        self.transport.flush()?;
        debug!(procedure = %procedure.name, client_handle, "invocation sent");
        Ok(())
    }

    /// Tear the connection down. The session is unusable afterwards.
    pub fn close(&mut self) -> VoltResult<()> {
        self.transport.close()
    }
}
