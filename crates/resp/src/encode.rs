//! RESP2 encoder.
//!
//! [`RespEncoder`] appends the wire form of a value to a `BytesMut`;
//! [`Encoder`] drives it against an `io::Write` sink.

use std::io::Write;

use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::error::EncodeError;
use crate::types::Value;
use crate::utils::*;

/// Trait for encoding RESP values into a byte buffer.
pub trait RespEncoder {
	fn encode_to(&self, buf: &mut BytesMut);

	/// Exact number of bytes [`encode_to`](RespEncoder::encode_to) appends.
	fn encoded_len(&self) -> usize;

	fn encode(&self) -> Bytes {
		let mut buf = BytesMut::with_capacity(self.encoded_len());
		self.encode_to(&mut buf);
		buf.freeze()
	}
}

impl RespEncoder for Value {
	fn encode_to(&self, buf: &mut BytesMut) {
		match self {
			Value::SimpleString(s) => encode_line(buf, SIMPLE_STRING, s),
			Value::Error(e) => encode_line(buf, ERROR, e),
			Value::Integer(i) => encode_integer(buf, *i),
			Value::BulkString(s) => encode_bulk_string(buf, s),
			Value::Array(arr) => encode_array(buf, arr),
			Value::Null => encode_null(buf),
		}
	}

	fn encoded_len(&self) -> usize {
		match self {
			Value::SimpleString(s) | Value::Error(s) => 1 + s.len() + CRLF.len(),
			Value::Integer(i) => 1 + integer_len(*i) + CRLF.len(),
			Value::BulkString(s) => length_prefix_len(s.len()) + s.len() + CRLF.len(),
			Value::Array(arr) => {
				length_prefix_len(arr.len()) + arr.iter().map(Value::encoded_len).sum::<usize>()
			}
			Value::Null => NULL_BULK.len() + CRLF.len(),
		}
	}
}

/// Marker, decimal length and CRLF.
#[inline]
fn length_prefix_len(length: usize) -> usize {
	1 + digits_in_number(length as u64) + CRLF.len()
}

/// Simple strings and errors are written verbatim; a CR or LF inside them
/// corrupts the framing.
#[inline]
fn encode_line(buf: &mut BytesMut, marker: u8, s: &[u8]) {
	buf.put_u8(marker);
	buf.put_slice(s);
	buf.put_slice(CRLF);
}

#[inline]
fn encode_integer(buf: &mut BytesMut, i: i64) {
	buf.put_u8(INTEGER);
	buf.put_slice(i.to_string().as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_length(buf: &mut BytesMut, marker: u8, length: usize) {
	buf.put_u8(marker);
	buf.put_slice(length.to_string().as_bytes());
	buf.put_slice(CRLF);
}

#[inline]
fn encode_bulk_string(buf: &mut BytesMut, s: &[u8]) {
	encode_length(buf, BULK_STRING, s.len());
	buf.put_slice(s);
	buf.put_slice(CRLF);
}

// Each element brings its own CRLF, so the array header is the only
// terminator the array itself writes.
fn encode_array(buf: &mut BytesMut, arr: &[Value]) {
	encode_length(buf, ARRAY, arr.len());
	for value in arr {
		value.encode_to(buf);
	}
}

#[inline]
fn encode_null(buf: &mut BytesMut) {
	buf.put_slice(NULL_BULK);
	buf.put_slice(CRLF);
}

/// Writes one value per [`encode`](Encoder::encode) call to the wrapped sink.
///
/// A value is staged whole in an encoder-owned buffer, written in one pass
/// and flushed once, so array elements never reach the sink piecemeal.
pub struct Encoder<W> {
	writer: W,
	buf: BytesMut,
}

impl<W: Write> Encoder<W> {
	pub fn new(writer: W) -> Self {
		Self {
			writer,
			buf: BytesMut::new(),
		}
	}

	pub fn get_ref(&self) -> &W {
		&self.writer
	}

	pub fn get_mut(&mut self) -> &mut W {
		&mut self.writer
	}

	pub fn into_inner(self) -> W {
		self.writer
	}

	pub fn encode(&mut self, value: &Value) -> Result<(), EncodeError> {
		self.buf.clear();
		self.buf.reserve(value.encoded_len());
		value.encode_to(&mut self.buf);

		self.writer.write_all(&self.buf)?;
		self.writer.flush()?;
		Ok(())
	}
}
