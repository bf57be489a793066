//! Streaming RESP2 decoder over a buffered byte stream.

use std::io::BufRead;
use std::io::ErrorKind;

use bytes::Bytes;
use bytes::BytesMut;
use log::debug;
use log::trace;
use memchr::memchr;

use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::types::Value;
use crate::utils::*;

/// Upper bound on element slots reserved up front for an array. The declared
/// count comes off the wire and is not trusted for allocation.
const MAX_ARRAY_PREALLOC: usize = 1024;

/// Decodes one RESP2 value per [`decode`](Decoder::decode) call from the
/// wrapped stream.
///
/// Every value consumes its own trailing CRLF, so after a successful call the
/// stream is positioned on the first byte of the next frame. Wrap raw
/// sockets or files in a [`std::io::BufReader`]; `&[u8]` can be used as-is.
pub struct Decoder<R> {
	reader: R,
	config: DecoderConfig,
	line: Vec<u8>,
	aligned: bool,
}

impl<R: BufRead> Decoder<R> {
	pub fn new(reader: R) -> Self {
		Self::with_config(reader, DecoderConfig::default())
	}

	pub fn with_config(reader: R, config: DecoderConfig) -> Self {
		Self {
			reader,
			config,
			line: Vec::new(),
			aligned: true,
		}
	}

	pub fn config(&self) -> &DecoderConfig {
		&self.config
	}

	pub fn get_ref(&self) -> &R {
		&self.reader
	}

	pub fn get_mut(&mut self) -> &mut R {
		&mut self.reader
	}

	pub fn into_inner(self) -> R {
		self.reader
	}

	/// Whether the stream sits on a frame boundary after the last
	/// [`decode`](Decoder::decode) call.
	///
	/// True after a success, and after a top-level integer frame whose token
	/// was rejected once its terminator had been consumed. Any other failure
	/// leaves the stream at an unknown offset inside a frame.
	pub fn is_aligned(&self) -> bool {
		self.aligned
	}

	/// Decode exactly one complete value, including its terminator.
	pub fn decode(&mut self) -> Result<Value, DecodeError> {
		self.aligned = false;
		match self.decode_value(0) {
			Ok(value) => {
				self.aligned = true;
				trace!("decoded {} frame", value.kind());
				Ok(value)
			}
			Err(e) => {
				debug!("failed to decode frame (aligned: {}): {}", self.aligned, e);
				Err(e)
			}
		}
	}

	/// `depth` counts the arrays enclosing the value being decoded.
	fn decode_value(&mut self, depth: usize) -> Result<Value, DecodeError> {
		let marker = self.read_byte()?.ok_or(DecodeError::UnexpectedEnd)?;

		match marker {
			SIMPLE_STRING => {
				self.read_line()?;
				Ok(Value::SimpleString(self.take_line()))
			}
			ERROR => {
				self.read_line()?;
				Ok(Value::Error(self.take_line()))
			}
			INTEGER => {
				self.read_line()?;
				match parse_integer(&self.line) {
					Ok(i) => Ok(Value::Integer(i)),
					Err(e) => {
						// The token's CRLF is already consumed.
						self.aligned = depth == 0;
						Err(e)
					}
				}
			}
			BULK_STRING => self.decode_bulk_string(),
			ARRAY => self.decode_array(depth + 1),
			other => Err(DecodeError::UnknownType(other)),
		}
	}

	fn decode_bulk_string(&mut self) -> Result<Value, DecodeError> {
		let length = self.read_length()?;

		if length == NULL_LEN {
			return Ok(Value::Null);
		}
		let length = usize::try_from(length).map_err(|_| DecodeError::InvalidLength(length))?;
		if length > self.config.max_bulk_len {
			return Err(DecodeError::InvalidLength(length as i64));
		}

		let payload = self.read_payload(length)?;
		self.read_terminator()?;
		Ok(Value::BulkString(payload))
	}

	fn decode_array(&mut self, depth: usize) -> Result<Value, DecodeError> {
		if depth > self.config.max_depth {
			return Err(DecodeError::DepthExceeded(self.config.max_depth));
		}

		let length = self.read_length()?;
		let length = usize::try_from(length).map_err(|_| DecodeError::InvalidLength(length))?;

		let mut elements = Vec::with_capacity(length.min(MAX_ARRAY_PREALLOC));
		for _ in 0..length {
			elements.push(self.decode_value(depth)?);
		}
		Ok(Value::Array(elements))
	}

	/// Length prefixes share the integer token rules.
	fn read_length(&mut self) -> Result<i64, DecodeError> {
		self.read_line()?;
		parse_integer(&self.line)
	}

	fn take_line(&mut self) -> Bytes {
		Bytes::from(std::mem::take(&mut self.line))
	}

	fn read_byte(&mut self) -> Result<Option<u8>, DecodeError> {
		loop {
			let byte = match self.reader.fill_buf() {
				Ok(buf) => buf.first().copied(),
				Err(e) if e.kind() == ErrorKind::Interrupted => continue,
				Err(e) => return Err(e.into()),
			};
			if byte.is_some() {
				self.reader.consume(1);
			}
			return Ok(byte);
		}
	}

	/// Scan up to the next CRLF, leaving everything before it in `self.line`.
	///
	/// A CR or LF that is not part of a CRLF pair stays in the line. At most
	/// `max_line_len` bytes plus the CRLF are buffered.
	fn read_line(&mut self) -> Result<(), DecodeError> {
		self.line.clear();
		let limit = self.config.line_limit();

		loop {
			let room = limit.saturating_sub(self.line.len());
			if room == 0 {
				return Err(DecodeError::LineTooLong(self.config.max_line_len));
			}

			let (consumed, done) = {
				let available = match self.reader.fill_buf() {
					Ok(buf) => buf,
					Err(e) if e.kind() == ErrorKind::Interrupted => continue,
					Err(e) => return Err(e.into()),
				};
				if available.is_empty() {
					return Err(DecodeError::MalformedTerminator { found: None });
				}

				let window = &available[..available.len().min(room)];
				match memchr(b'\n', window) {
					Some(pos) => {
						self.line.extend_from_slice(&window[..=pos]);
						(pos + 1, self.line.ends_with(CRLF))
					}
					None => {
						self.line.extend_from_slice(window);
						(window.len(), false)
					}
				}
			};
			self.reader.consume(consumed);

			if done {
				self.line.truncate(self.line.len() - CRLF.len());
				return Ok(());
			}
		}
	}

	/// Copy exactly `length` raw bytes, at most `chunk_size` per step.
	fn read_payload(&mut self, length: usize) -> Result<Bytes, DecodeError> {
		let chunk_size = self.config.chunk_size.max(1);
		let mut payload = BytesMut::with_capacity(length.min(chunk_size));

		while payload.len() < length {
			let wanted = (length - payload.len()).min(chunk_size);
			let taken = {
				let available = match self.reader.fill_buf() {
					Ok(buf) => buf,
					Err(e) if e.kind() == ErrorKind::Interrupted => continue,
					Err(e) => return Err(e.into()),
				};
				if available.is_empty() {
					return Err(DecodeError::UnexpectedEnd);
				}
				let n = available.len().min(wanted);
				payload.extend_from_slice(&available[..n]);
				n
			};
			self.reader.consume(taken);
		}

		Ok(payload.freeze())
	}

	/// Both terminator bytes must be present before they are checked, so a
	/// short stream reports `UnexpectedEnd` rather than a bad terminator.
	fn read_terminator(&mut self) -> Result<(), DecodeError> {
		let first = self.read_byte()?.ok_or(DecodeError::UnexpectedEnd)?;
		let second = self.read_byte()?.ok_or(DecodeError::UnexpectedEnd)?;

		match [first, second] {
			[b'\r', b'\n'] => Ok(()),
			[b'\r', other] | [other, _] => Err(DecodeError::MalformedTerminator {
				found: Some(other),
			}),
		}
	}
}
