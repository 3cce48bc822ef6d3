//! Blocking Transport
//!
//! Owns the byte stream plus the two in-memory buffers: the write
//! accumulator messages are built in, and the read reservoir holding exactly
//! one fully framed inbound message. Framing is a 4-byte length prefix
//! (payload only) in the stream's configured byte order.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use bytes::BytesMut;

use crate::protocol::codec::{ByteOrder, WireReader, WireWriter};
use crate::protocol::error::{VoltResult, WireError};

/// Blocking byte stream the engine drives. TCP with `TCP_NODELAY` is the
/// intended substrate; tests substitute scripted in-memory streams.
pub trait ByteStream: Read + Write {
    /// Deadline for subsequent reads; `None` blocks indefinitely.
    fn set_read_deadline(&mut self, deadline: Option<Duration>) -> io::Result<()>;

    /// Tear the stream down. Best effort.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for TcpStream {
    fn set_read_deadline(&mut self, deadline: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(deadline)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        TcpStream::shutdown(self, std::net::Shutdown::Both)
    }
}

/// Framed transport over one byte stream.
///
/// Constructed without a stream it runs in offline codec mode: everything
/// in-memory works, `flush` and `buffer_for_read` fail `Disconnected`.
pub struct Transport<S: ByteStream> {
    stream: Option<S>,
    writer: WireWriter,
    reader: WireReader,
}

impl<S: ByteStream> Transport<S> {
    pub fn new(stream: Option<S>, order: ByteOrder) -> Self {
        Self {
            stream,
            writer: WireWriter::new(order),
            reader: WireReader::new(order),
        }
    }

    pub fn offline(order: ByteOrder) -> Self {
        Self::new(None, order)
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn writer_mut(&mut self) -> &mut WireWriter {
        &mut self.writer
    }

    pub fn reader_mut(&mut self) -> &mut WireReader {
        &mut self.reader
    }

    /// One-shot per-connection byte-order override: `1` selects
    /// little-endian, anything else big-endian. Applies to all subsequent
    /// reads and writes, frame length prefixes included.
    pub fn set_input_byte_order(&mut self, mode: u8) {
        let order = ByteOrder::from_wire(mode);
        self.writer.set_order(order);
        self.reader.set_order(order);
    }

    pub fn set_read_deadline(&mut self, deadline: Option<Duration>) -> VoltResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| WireError::Disconnected("not connected to a server".to_string()))?;
        stream.set_read_deadline(deadline).map_err(WireError::from_io)
    }

    /// Send the accumulator as one contiguous write and reset it.
    pub fn flush(&mut self) -> VoltResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| WireError::Disconnected("not connected to a server".to_string()))?;
        let out = self.writer.take();
        stream.write_all(&out).map_err(WireError::from_io)?;
        stream.flush().map_err(WireError::from_io)?;
        Ok(())
    }

    /// Fully buffer one length-prefixed inbound message into the reservoir
    /// and rewind the read cursor. Both the 4-byte prefix and the payload
    /// loop until complete; a zero-length read mid-frame means the peer went
    /// away.
    pub fn buffer_for_read(&mut self) -> VoltResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| WireError::Disconnected("not connected to a server".to_string()))?;

        let mut prefix = [0u8; 4];
        read_full(stream, &mut prefix)?;
        let len = match self.reader.order() {
            ByteOrder::Big => i32::from_be_bytes(prefix),
            ByteOrder::Little => i32::from_le_bytes(prefix),
        };
        if len < 0 {
            return Err(WireError::Malformed(format!("negative frame length {len}")));
        }

        let mut payload = BytesMut::zeroed(len as usize);
        read_full(stream, &mut payload)?;
        self.reader.reset(payload);
        Ok(())
    }

    pub fn close(&mut self) -> VoltResult<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream.shutdown().map_err(WireError::from_io)?;
        }
        self.stream = None;
        Ok(())
    }
}

fn read_full<S: Read + ?Sized>(stream: &mut S, buf: &mut [u8]) -> VoltResult<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).map_err(WireError::from_io)?;
        if n == 0 {
            return Err(WireError::Disconnected("connection broken".to_string()));
        }
        filled += n;
    }
    Ok(())
}
