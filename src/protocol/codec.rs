//! Primitive Wire Codec
//!
//! Encode/decode for the scalar wire types against in-memory byte buffers.
//! This is pure, synchronous computation - no I/O.
//!
//! `WireWriter` appends to a growable accumulator; `WireReader` consumes one
//! fully buffered message through a cursor. Both carry the stream's byte
//! order, which defaults to big-endian and can be switched once per
//! connection.

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

use super::decimal::Decimal;
use super::error::{VoltResult, WireError};
use super::types::{NULL_DECIMAL_INDICATOR, NULL_STRING_INDICATOR};

/// Multi-byte primitive byte order for one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

impl ByteOrder {
    /// Byte-order selector from the stream-entry declaration: `1` selects
    /// little-endian, any other value big-endian.
    pub fn from_wire(mode: u8) -> Self {
        if mode == 1 {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }
}

/// Write side of the codec: a growable byte accumulator.
///
/// Messages are built here in full, framed with [`WireWriter::prepend_length`],
/// and handed to the transport as one contiguous buffer.
#[derive(Debug)]
pub struct WireWriter {
    buf: BytesMut,
    order: ByteOrder,
}

impl WireWriter {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            order,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Current size of the accumulator in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Drain the accumulator, leaving it empty for the next message.
    pub fn take(&mut self) -> BytesMut {
        self.buf.split()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        match self.order {
            ByteOrder::Big => self.buf.put_i16(v),
            ByteOrder::Little => self.buf.put_i16_le(v),
        }
    }

    pub fn write_i32(&mut self, v: i32) {
        match self.order {
            ByteOrder::Big => self.buf.put_i32(v),
            ByteOrder::Little => self.buf.put_i32_le(v),
        }
    }

    pub fn write_i64(&mut self, v: i64) {
        match self.order {
            ByteOrder::Big => self.buf.put_i64(v),
            ByteOrder::Little => self.buf.put_i64_le(v),
        }
    }

    /// Write an IEEE-754 double preserving the exact bit pattern, NaN
    /// payloads and zero signs included.
    pub fn write_f64(&mut self, v: f64) {
        let bits = v.to_bits();
        match self.order {
            ByteOrder::Big => self.buf.put_u64(bits),
            ByteOrder::Little => self.buf.put_u64_le(bits),
        }
    }

    /// NULL occupies zero bytes; nullability lives in the schema.
    pub fn write_null(&mut self) {}

    /// Splice raw bytes onto the end of the accumulator.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// `None` emits the NULL length indicator and nothing else; otherwise a
    /// 4-byte UTF-8 byte length followed by the bytes.
    pub fn write_string(&mut self, v: Option<&str>) {
        match v {
            None => self.write_i32(NULL_STRING_INDICATOR),
            Some(s) => {
                self.write_i32(s.len() as i32);
                self.buf.extend_from_slice(s.as_bytes());
            }
        }
    }

    /// Microseconds since the epoch; sub-microsecond precision is discarded.
    pub fn write_timestamp(&mut self, t: &DateTime<Utc>) {
        self.write_i64(t.timestamp_micros());
    }

    /// 16-byte sign-magnitude fixed point, or the NULL sentinel.
    pub fn write_decimal(&mut self, v: Option<&Decimal>) -> VoltResult<()> {
        match v {
            None => {
                self.buf.extend_from_slice(&NULL_DECIMAL_INDICATOR);
                Ok(())
            }
            Some(d) => {
                let raw = d.to_wire_bytes()?;
                self.buf.extend_from_slice(&raw);
                Ok(())
            }
        }
    }

    /// The decimal rendered as text through the STRING encoding.
    pub fn write_decimal_string(&mut self, v: Option<&Decimal>) {
        match v {
            None => self.write_string(None),
            Some(d) => self.write_string(Some(&d.to_string())),
        }
    }

    /// Insert the total current buffer size as a 4-byte length at offset 0.
    /// The prefix does not count its own four bytes.
    pub fn prepend_length(&mut self) {
        let len = self.buf.len() as i32;
        let mut framed = BytesMut::with_capacity(self.buf.len() + 4);
        match self.order {
            ByteOrder::Big => framed.put_i32(len),
            ByteOrder::Little => framed.put_i32_le(len),
        }
        framed.extend_from_slice(&self.buf);
        self.buf = framed;
    }
}

/// Read side of the codec: a cursor over one fully buffered message.
#[derive(Debug)]
pub struct WireReader {
    buf: BytesMut,
    pos: usize,
    order: ByteOrder,
}

impl WireReader {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: BytesMut::new(),
            pos: 0,
            order,
        }
    }

    /// Overwrite the reservoir with a new message and rewind the cursor.
    pub fn reset(&mut self, message: BytesMut) {
        self.buf = message;
        self.pos = 0;
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Bytes left between the cursor and the end of the message.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> VoltResult<&[u8]> {
        if self.remaining() < n {
            return Err(WireError::ShortRead {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> VoltResult<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Consume `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> VoltResult<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_u8(&mut self) -> VoltResult<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> VoltResult<i8> {
        Ok(self.take_array::<1>()?[0] as i8)
    }

    pub fn read_i16(&mut self) -> VoltResult<i16> {
        let raw = self.take_array::<2>()?;
        Ok(match self.order {
            ByteOrder::Big => i16::from_be_bytes(raw),
            ByteOrder::Little => i16::from_le_bytes(raw),
        })
    }

    pub fn read_i32(&mut self) -> VoltResult<i32> {
        let raw = self.take_array::<4>()?;
        Ok(match self.order {
            ByteOrder::Big => i32::from_be_bytes(raw),
            ByteOrder::Little => i32::from_le_bytes(raw),
        })
    }

    pub fn read_i64(&mut self) -> VoltResult<i64> {
        let raw = self.take_array::<8>()?;
        Ok(match self.order {
            ByteOrder::Big => i64::from_be_bytes(raw),
            ByteOrder::Little => i64::from_le_bytes(raw),
        })
    }

    pub fn read_f64(&mut self) -> VoltResult<f64> {
        let raw = self.take_array::<8>()?;
        let bits = match self.order {
            ByteOrder::Big => u64::from_be_bytes(raw),
            ByteOrder::Little => u64::from_le_bytes(raw),
        };
        Ok(f64::from_bits(bits))
    }

    /// Length-prefixed UTF-8 string; a length of -1 is NULL.
    pub fn read_string(&mut self) -> VoltResult<Option<String>> {
        let len = self.read_i32()?;
        if len == NULL_STRING_INDICATOR {
            return Ok(None);
        }
        if len < 0 {
            return Err(WireError::Malformed(format!("negative string length {len}")));
        }
        let raw = self.take(len as usize)?;
        let s = std::str::from_utf8(raw)
            .map_err(|e| WireError::Malformed(format!("invalid UTF-8 in string: {e}")))?;
        Ok(Some(s.to_string()))
    }

    pub fn read_timestamp(&mut self) -> VoltResult<DateTime<Utc>> {
        let micros = self.read_i64()?;
        DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| WireError::Malformed(format!("timestamp out of range: {micros}")))
    }

    pub fn read_decimal(&mut self) -> VoltResult<Option<Decimal>> {
        let raw = self.take_array::<16>()?;
        Decimal::from_wire_bytes(&raw)
    }

    /// A decimal carried as text; scale and precision limits are enforced on
    /// the way in.
    pub fn read_decimal_string(&mut self) -> VoltResult<Option<Decimal>> {
        match self.read_string()? {
            None => Ok(None),
            Some(s) => {
                let d: Decimal = s
                    .parse()
                    .map_err(|e| WireError::Malformed(format!("invalid decimal string: {e}")))?;
                d.check_string_limits()?;
                Ok(Some(d))
            }
        }
    }

    /// Fixed-point currency: a 64-bit count of 1/10000 units.
    pub fn read_money(&mut self) -> VoltResult<i64> {
        self.read_i64()
    }

    fn read_array_len(&mut self) -> VoltResult<usize> {
        let n = self.read_i16()?;
        if n < 0 {
            return Err(WireError::Malformed(format!("negative array count {n}")));
        }
        Ok(n as usize)
    }

    pub fn read_i8_array(&mut self) -> VoltResult<Vec<i8>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_i8()?);
        }
        Ok(out)
    }

    pub fn read_i16_array(&mut self) -> VoltResult<Vec<i16>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_i16()?);
        }
        Ok(out)
    }

    pub fn read_i32_array(&mut self) -> VoltResult<Vec<i32>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_i32()?);
        }
        Ok(out)
    }

    pub fn read_i64_array(&mut self) -> VoltResult<Vec<i64>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_i64()?);
        }
        Ok(out)
    }

    pub fn read_f64_array(&mut self) -> VoltResult<Vec<f64>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_f64()?);
        }
        Ok(out)
    }

    pub fn read_string_array(&mut self) -> VoltResult<Vec<Option<String>>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_string()?);
        }
        Ok(out)
    }

    pub fn read_timestamp_array(&mut self) -> VoltResult<Vec<DateTime<Utc>>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_timestamp()?);
        }
        Ok(out)
    }

    pub fn read_decimal_array(&mut self) -> VoltResult<Vec<Option<Decimal>>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_decimal()?);
        }
        Ok(out)
    }

    pub fn read_decimal_string_array(&mut self) -> VoltResult<Vec<Option<Decimal>>> {
        let n = self.read_array_len()?;
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.read_decimal_string()?);
        }
        Ok(out)
    }
}
