//! End-to-end wire exchanges over a scripted in-memory stream: the login
//! handshake, procedure-call framing byte for byte, response decoding, and
//! session poisoning.

use std::io::{self, Read, Write};
use std::time::Duration;

use pretty_assertions::assert_eq;
use sha1::{Digest, Sha1};
use volt_client::{
    ByteOrder, ByteStream, Param, Procedure, Session, Value, VoltColumn, VoltException, VoltTable,
    WireError, WireWriter, wire_type,
};

/// Hands out scripted input, records everything written.
struct MemoryStream {
    input: io::Cursor<Vec<u8>>,
    output: Vec<u8>,
}

impl MemoryStream {
    fn new(input: Vec<u8>) -> Self {
        Self {
            input: io::Cursor::new(input),
            output: Vec::new(),
        }
    }
}

impl Read for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for MemoryStream {
    fn set_read_deadline(&mut self, _deadline: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

/// Every read hits the deadline.
struct StalledStream;

impl Read for StalledStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "deadline elapsed"))
    }
}

impl Write for StalledStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for StalledStream {
    fn set_read_deadline(&mut self, _deadline: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

fn auth_success_frame(host_id: i32, connection_id: i64) -> Vec<u8> {
    let mut w = WireWriter::new(ByteOrder::Big);
    w.write_u8(1); // server version
    w.write_u8(0); // auth ok
    w.write_i32(host_id);
    w.write_i64(connection_id);
    w.write_i64(1_273_000_000_000_000); // cluster start
    w.write_i32(0x7F00_0001); // leader address
    let build = b"v9.9 community";
    w.write_i32(build.len() as i32);
    w.write_raw(build);
    w.prepend_length();
    w.take().to_vec()
}

fn empty_response_frame(status: i8, roundtrip: i32, info: &str, handle: i64) -> Vec<u8> {
    let mut w = WireWriter::new(ByteOrder::Big);
    w.write_i8(0); // version
    w.write_i8(status);
    w.write_i32(roundtrip);
    w.write_i16(0); // no exception
    w.write_i16(0); // no tables
    w.write_string(Some(info));
    w.write_i64(handle);
    w.prepend_length();
    w.take().to_vec()
}

#[test]
fn procedure_call_wire_bytes() {
    let mut sent = Vec::new();
    {
        let mut session = Session::over(ProbeStream::new(&mut sent), ByteOrder::Big);
        let procedure = Procedure::new("Foo", vec![wire_type::INTEGER]);
        session
            .call_no_response(&procedure, &[Param::Scalar(Value::Integer(42))], 1)
            .unwrap();
    }

    // length prefix, version, "Foo", handle 1, one INTEGER parameter 42
    let expected: Vec<u8> = vec![
        0x00, 0x00, 0x00, 0x17, // frame length (23 payload bytes)
        0x00, // invocation version
        0x00, 0x00, 0x00, 0x03, 0x46, 0x6F, 0x6F, // "Foo"
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // client handle
        0x00, 0x01, // parameter count
        0x05, 0x00, 0x00, 0x00, 0x2A, // tagged INTEGER 42
    ];
    assert_eq!(sent, expected);
}

#[test]
fn array_parameter_framing() {
    let mut stream_probe = Vec::new();
    {
        let mut session = Session::over(ProbeStream::new(&mut stream_probe), ByteOrder::Big);
        let procedure = Procedure::new("Batch", vec![wire_type::TINYINT]);
        session
            .call_no_response(
                &procedure,
                &[Param::Vector(vec![
                    Value::TinyInt(1),
                    Value::TinyInt(2),
                    Value::TinyInt(3),
                ])],
                7,
            )
            .unwrap();
    }
    // payload: version + "Batch" + handle + count + marker/tag/count/elements
    let mut expected = WireWriter::new(ByteOrder::Big);
    expected.write_u8(0);
    expected.write_string(Some("Batch"));
    expected.write_i64(7);
    expected.write_i16(1);
    expected.write_i8(-99);
    expected.write_i8(wire_type::TINYINT);
    expected.write_i16(3);
    expected.write_i8(1);
    expected.write_i8(2);
    expected.write_i8(3);
    expected.prepend_length();
    assert_eq!(stream_probe, expected.as_bytes());
}

/// Stream that mirrors writes into an external buffer the test keeps.
struct ProbeStream<'a> {
    sink: &'a mut Vec<u8>,
    input: io::Cursor<Vec<u8>>,
}

impl<'a> ProbeStream<'a> {
    fn new(sink: &'a mut Vec<u8>) -> Self {
        Self {
            sink,
            input: io::Cursor::new(Vec::new()),
        }
    }

    fn with_input(sink: &'a mut Vec<u8>, input: Vec<u8>) -> Self {
        Self {
            sink,
            input: io::Cursor::new(input),
        }
    }
}

impl Read for ProbeStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for ProbeStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStream for ProbeStream<'_> {
    fn set_read_deadline(&mut self, _deadline: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn login_handshake() {
    let mut sent = Vec::new();
    {
        let input = auth_success_frame(3, 888);
        let mut session = Session::over(ProbeStream::with_input(&mut sent, input), ByteOrder::Big);
        session.authenticate("scott", "tiger").unwrap();
        assert_eq!(session.host_id(), 3);
        assert_eq!(session.connection_id(), 888);
        assert_eq!(session.cluster_start_micros(), 1_273_000_000_000_000);
        assert_eq!(session.leader_address(), 0x7F00_0001);
        assert!(!session.is_poisoned());
    }

    // version byte, counted username, then the raw 20-byte password digest
    let mut expected = WireWriter::new(ByteOrder::Big);
    expected.write_u8(0);
    expected.write_string(Some("scott"));
    expected.write_raw(Sha1::digest(b"tiger").as_slice());
    expected.prepend_length();
    assert_eq!(sent, expected.as_bytes());
}

#[test]
fn auth_rejection_poisons_session() {
    let mut frame = WireWriter::new(ByteOrder::Big);
    frame.write_u8(1);
    frame.write_u8(1); // auth status != 0
    frame.prepend_length();

    let mut session = Session::over(MemoryStream::new(frame.take().to_vec()), ByteOrder::Big);
    assert!(matches!(
        session.authenticate("scott", "wrong"),
        Err(WireError::AuthFailed)
    ));
    assert!(session.is_poisoned());

    let procedure = Procedure::new("Foo", vec![]);
    assert!(matches!(
        session.call_no_response(&procedure, &[], 1),
        Err(WireError::Disconnected(_))
    ));
}

#[test]
fn call_and_decode_response() {
    let input = empty_response_frame(1, 7, "ok", 9);
    let mut session = Session::over(MemoryStream::new(input), ByteOrder::Big);
    let procedure = Procedure::new("Status", vec![]);
    let response = session.call(&procedure, &[], 9).unwrap();

    assert_eq!(response.status, 1);
    assert_eq!(response.roundtrip_time_ms, 7);
    assert_eq!(response.exception, VoltException::None);
    assert!(response.tables.is_empty());
    assert_eq!(response.info.as_deref(), Some("ok"));
    assert_eq!(response.client_handle, 9);
    assert!(!session.is_poisoned());
}

#[test]
fn response_with_table_round_trips() {
    let table = VoltTable {
        columns: vec![
            VoltColumn::new(wire_type::BIGINT, "id"),
            VoltColumn::new(wire_type::STRING, "label"),
        ],
        rows: vec![
            vec![Value::BigInt(17), Value::String(Some("alpha".to_string()))],
            vec![Value::BigInt(18), Value::String(None)],
        ],
    };

    let mut w = WireWriter::new(ByteOrder::Big);
    w.write_i8(0);
    w.write_i8(0);
    w.write_i32(2);
    w.write_i16(0);
    w.write_i16(1);
    table.encode(&mut w).unwrap();
    w.write_string(Some(""));
    w.write_i64(5);
    w.prepend_length();

    let mut session = Session::over(MemoryStream::new(w.take().to_vec()), ByteOrder::Big);
    let procedure = Procedure::new("Select", vec![]);
    let response = session.call(&procedure, &[], 5).unwrap();

    assert!(response.is_ok());
    assert_eq!(response.tables.len(), 1);
    assert_eq!(response.tables[0], table);
    assert_eq!(
        response.tables[0].rows[0][1],
        Value::String(Some("alpha".to_string()))
    );
}

#[test]
fn truncated_response_poisons_session() {
    // frame announces 10 payload bytes, stream ends after 2
    let input = vec![0x00, 0x00, 0x00, 0x0A, 0x01, 0x02];
    let mut session = Session::over(MemoryStream::new(input), ByteOrder::Big);
    let procedure = Procedure::new("Foo", vec![]);
    assert!(matches!(
        session.call(&procedure, &[], 1),
        Err(WireError::Disconnected(_))
    ));
    assert!(session.is_poisoned());
}

#[test]
fn read_deadline_expiry_is_timeout() {
    let mut session = Session::over(StalledStream, ByteOrder::Big);
    let procedure = Procedure::new("Slow", vec![]);
    assert!(matches!(
        session.call(&procedure, &[], 1),
        Err(WireError::Timeout)
    ));
    assert!(session.is_poisoned());
}

#[test]
fn domain_error_leaves_session_usable() {
    let input = empty_response_frame(0, 1, "later", 2);
    let mut session = Session::over(MemoryStream::new(input), ByteOrder::Big);

    // declared INTEGER, supplied string: rejected before anything is sent
    let procedure = Procedure::new("Foo", vec![wire_type::INTEGER]);
    assert!(matches!(
        session.call_no_response(&procedure, &[Param::Scalar(Value::String(None))], 1),
        Err(WireError::Domain(_))
    ));
    assert!(!session.is_poisoned());

    // the partial accumulator was discarded; the next call starts clean
    let ok = Procedure::new("Bar", vec![]);
    let response = session.call(&ok, &[], 2).unwrap();
    assert_eq!(response.client_handle, 2);
}

#[test]
fn unsupported_parameter_type_is_caller_visible() {
    let mut session = Session::over(MemoryStream::new(Vec::new()), ByteOrder::Big);
    let procedure = Procedure::new("Foo", vec![wire_type::VOLTTABLE]);
    assert!(matches!(
        session.call_no_response(&procedure, &[Param::Scalar(Value::Null)], 1),
        Err(WireError::UnsupportedType(t)) if t == wire_type::VOLTTABLE
    ));
    assert!(!session.is_poisoned());
}

#[test]
fn little_endian_session_round_trip() {
    let mut w = WireWriter::new(ByteOrder::Little);
    w.write_i8(0);
    w.write_i8(0);
    w.write_i32(4);
    w.write_i16(0);
    w.write_i16(0);
    w.write_string(Some("le"));
    w.write_i64(11);
    w.prepend_length();

    let mut session = Session::over(MemoryStream::new(w.take().to_vec()), ByteOrder::Big);
    session.set_input_byte_order(1);
    let procedure = Procedure::new("Foo", vec![]);
    let response = session.call(&procedure, &[], 11).unwrap();
    assert_eq!(response.info.as_deref(), Some("le"));
    assert_eq!(response.client_handle, 11);
}

#[test]
fn offline_session_fails_flush_only() {
    let mut session = Session::<MemoryStream>::offline();
    assert!(!session.is_connected());

    // in-memory codec still works
    session.writer_mut().write_string(Some("draft"));
    assert_eq!(session.writer_mut().len(), 9);

    let procedure = Procedure::new("Foo", vec![]);
    assert!(matches!(
        session.call_no_response(&procedure, &[], 1),
        Err(WireError::Disconnected(_))
    ));
}
