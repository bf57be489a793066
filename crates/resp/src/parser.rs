//! Frame parsing over an accumulating `BytesMut`, for callers that read the
//! socket themselves (for example with tokio) and feed the bytes in.

use bytes::Buf;
use bytes::BytesMut;
use memchr::memmem;

use crate::config::DecoderConfig;
use crate::decode::Decoder;
use crate::error::DecodeError;
use crate::types::Value;
use crate::utils::*;

/// Result of a parsing attempt.
#[derive(Debug)]
pub enum ParseOutcome {
	/// A complete frame was parsed and removed from the buffer.
	Complete(Value),
	/// The buffer holds only a prefix of a frame. Nothing was consumed.
	Incomplete,
	/// The frame was malformed but has been removed from the buffer; the next
	/// byte starts a new frame.
	Rejected(DecodeError),
	/// The buffer no longer starts on a frame boundary. The connection it
	/// came from cannot be used any further.
	Error(DecodeError),
}

/// How far the buffered bytes have been checked for a complete frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Scan {
	/// Start of the first element not yet known to be fully buffered.
	offset: usize,
	/// Elements still expected by each open array, outermost first.
	pending: Vec<usize>,
}

enum Readiness {
	/// A whole frame is buffered, or the bytes can never form one.
	Ready,
	/// More bytes are needed before decoding is worthwhile.
	Need,
}

/// Parses complete frames off the front of a byte buffer.
///
/// Between calls the parser remembers how much of the pending frame it has
/// already checked, so each call only looks at newly arrived elements and a
/// bulk payload is copied once, when it is complete. Callers must only append
/// to the buffer between calls; `parse` does all the consuming.
#[derive(Debug, Clone, Default)]
pub struct FrameParser {
	config: DecoderConfig,
	scan: Scan,
}

impl FrameParser {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(config: DecoderConfig) -> Self {
		Self {
			config,
			scan: Scan::default(),
		}
	}

	/// Try to parse one frame from the front of `buf`.
	///
	/// Once a complete frame is buffered, the streaming [`Decoder`] runs over
	/// it once. Otherwise the call returns `Incomplete` without copying;
	/// callers append more data and call again.
	pub fn parse(&mut self, buf: &mut BytesMut) -> ParseOutcome {
		if buf.len() < self.scan.offset {
			self.scan = Scan::default();
		}
		if buf.is_empty() {
			return ParseOutcome::Incomplete;
		}
		if let Readiness::Need = self.scan_frame(buf) {
			return ParseOutcome::Incomplete;
		}
		self.scan = Scan::default();

		let mut decoder = Decoder::with_config(&buf[..], self.config);
		let result = decoder.decode();
		let aligned = decoder.is_aligned();
		let consumed = buf.len() - decoder.into_inner().len();

		match result {
			Ok(value) => {
				buf.advance(consumed);
				ParseOutcome::Complete(value)
			}
			Err(e) if e.is_incomplete() => ParseOutcome::Incomplete,
			Err(e) if aligned => {
				buf.advance(consumed);
				ParseOutcome::Rejected(e)
			}
			Err(e) => ParseOutcome::Error(e),
		}
	}

	/// Walk the frame structure from where the last call stopped, without
	/// copying. Anything malformed is left for the decoder to report.
	fn scan_frame(&mut self, buf: &[u8]) -> Readiness {
		let config = self.config;
		let line_limit = config.line_limit();
		let scan = &mut self.scan;

		loop {
			let pos = scan.offset;
			let Some(&marker) = buf.get(pos) else {
				return Readiness::Need;
			};

			let line_start = pos + 1;
			let window_end = buf.len().min(line_start.saturating_add(line_limit));
			let line_end = match memmem::find(&buf[line_start..window_end], CRLF) {
				Some(i) => line_start + i,
				None if window_end - line_start < line_limit => return Readiness::Need,
				None => return Readiness::Ready,
			};
			let line = &buf[line_start..line_end];
			let next = line_end + CRLF.len();

			let end = match marker {
				SIMPLE_STRING | ERROR | INTEGER => next,
				BULK_STRING => match parse_integer(line) {
					Ok(NULL_LEN) => next,
					Ok(n) => match usize::try_from(n) {
						Ok(len) if len <= config.max_bulk_len => {
							let end = next.saturating_add(len).saturating_add(CRLF.len());
							if end > buf.len() {
								return Readiness::Need;
							}
							end
						}
						_ => return Readiness::Ready,
					},
					Err(_) => return Readiness::Ready,
				},
				ARRAY => {
					if scan.pending.len() >= config.max_depth {
						return Readiness::Ready;
					}
					match parse_integer(line).ok().and_then(|n| usize::try_from(n).ok()) {
						Some(0) => next,
						Some(count) => {
							scan.pending.push(count);
							scan.offset = next;
							continue;
						}
						None => return Readiness::Ready,
					}
				}
				_ => return Readiness::Ready,
			};
			scan.offset = end;

			// Close every array this element completes.
			loop {
				match scan.pending.last_mut() {
					None => return Readiness::Ready,
					Some(remaining) => {
						*remaining -= 1;
						if *remaining > 0 {
							break;
						}
						scan.pending.pop();
					}
				}
			}
		}
	}
}

/// Convenience function for one-off parsing with default limits.
///
/// An incomplete frame is reported as [`DecodeError::UnexpectedEnd`] and
/// leaves `buf` untouched. Use [`FrameParser`] to tell the cases apart.
pub fn parse(buf: &mut BytesMut) -> Result<Value, DecodeError> {
	match FrameParser::new().parse(buf) {
		ParseOutcome::Complete(value) => Ok(value),
		ParseOutcome::Incomplete => Err(DecodeError::UnexpectedEnd),
		ParseOutcome::Rejected(e) | ParseOutcome::Error(e) => Err(e),
	}
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;
	use rstest::rstest;

	use super::*;
	use crate::encode::RespEncoder;

	#[test]
	fn test_parse_simple_string() {
		let mut buf = BytesMut::from(&b"+OK\r\n"[..]);
		let value = parse(&mut buf).unwrap();
		assert_eq!(value, Value::SimpleString(Bytes::from("OK")));
		assert!(buf.is_empty());
	}

	#[test]
	fn test_parse_array() {
		let mut buf = BytesMut::from(&b"*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n"[..]);
		let value = parse(&mut buf).unwrap();

		if let Value::Array(arr) = value {
			assert_eq!(arr.len(), 2);
			assert_eq!(arr[0], Value::BulkString(Bytes::from("foo")));
			assert_eq!(arr[1], Value::BulkString(Bytes::from("bar")));
		} else {
			panic!("Expected Array, got {:?}", value);
		}
	}

	#[test]
	fn test_parse_leaves_trailing_bytes() {
		let mut buf = BytesMut::from(&b":1\r\n:2\r\n"[..]);
		assert_eq!(parse(&mut buf).unwrap(), Value::integer(1));
		assert_eq!(&buf[..], b":2\r\n");
	}

	#[test]
	fn test_every_prefix_is_incomplete() {
		let frame = b"*3\r\n$3\r\nSET\r\n$-1\r\n*1\r\n+ok\r\n";
		let mut parser = FrameParser::new();

		for end in 0..frame.len() {
			let mut buf = BytesMut::from(&frame[..end]);
			assert!(
				matches!(parser.parse(&mut buf), ParseOutcome::Incomplete),
				"prefix of length {} was not incomplete",
				end
			);
			assert_eq!(buf.len(), end, "incomplete parse consumed bytes");
		}

		let mut buf = BytesMut::from(&frame[..]);
		assert!(matches!(parser.parse(&mut buf), ParseOutcome::Complete(_)));
		assert!(buf.is_empty());
	}

	#[test]
	fn test_rejected_integer_is_skipped() {
		let mut buf = BytesMut::from(&b":nope\r\n+PING\r\n"[..]);
		let mut parser = FrameParser::new();

		assert!(matches!(
			parser.parse(&mut buf),
			ParseOutcome::Rejected(DecodeError::InvalidInteger(_))
		));
		assert_eq!(&buf[..], b"+PING\r\n");
		assert!(matches!(parser.parse(&mut buf), ParseOutcome::Complete(_)));
	}

	#[rstest]
	#[case(b"?\r\n")]
	#[case(b"$-3\r\n")]
	#[case(b"*1\r\n:x\r\n")]
	#[case(b"$3\r\nfooXY")]
	fn test_desync_is_error(#[case] input: &[u8]) {
		let mut buf = BytesMut::from(input);
		assert!(matches!(
			FrameParser::new().parse(&mut buf),
			ParseOutcome::Error(_)
		));
	}

	#[test]
	fn test_depth_limit_applies() {
		let mut parser = FrameParser::with_config(DecoderConfig::default().with_max_depth(1));
		let mut buf = BytesMut::from(&b"*1\r\n*0\r\n"[..]);
		assert!(matches!(
			parser.parse(&mut buf),
			ParseOutcome::Error(DecodeError::DepthExceeded(1))
		));
	}

	#[test]
	fn test_parse_incomplete_is_unexpected_end() {
		let mut buf = BytesMut::from(&b"$5\r\nhel"[..]);
		assert!(matches!(parse(&mut buf), Err(DecodeError::UnexpectedEnd)));
		assert_eq!(buf.len(), 7);
	}

	#[test]
	fn test_large_bulk_in_small_chunks() {
		let payload: Vec<u8> = (0..8 << 20).map(|i: u32| (i % 251) as u8).collect();
		let wire = Value::BulkString(Bytes::from(payload.clone())).encode();

		let mut parser = FrameParser::new();
		let mut buf = BytesMut::new();
		let mut chunks = wire.chunks(16 * 1024).peekable();

		while let Some(chunk) = chunks.next() {
			buf.extend_from_slice(chunk);
			let outcome = parser.parse(&mut buf);
			if chunks.peek().is_some() {
				assert!(matches!(outcome, ParseOutcome::Incomplete));
				// A bulk header is the only element checked, so the scan
				// never moves past it.
				assert_eq!(parser.scan, Scan::default());
			} else {
				match outcome {
					ParseOutcome::Complete(Value::BulkString(b)) => assert_eq!(b, payload),
					other => panic!("Expected Complete(BulkString), got {:?}", other),
				}
			}
		}
		assert!(buf.is_empty());
	}

	#[test]
	fn test_scan_resumes_after_buffered_elements() {
		let mut parser = FrameParser::new();
		let mut buf = BytesMut::from(&b"*3\r\n$3\r\nfoo\r\n*1\r\n:1\r\n$3\r\nba"[..]);

		assert!(matches!(parser.parse(&mut buf), ParseOutcome::Incomplete));
		assert_eq!(parser.scan.offset, 21);
		assert_eq!(parser.scan.pending, vec![1]);

		buf.extend_from_slice(b"r\r\n+next\r\n");
		assert_eq!(
			match parser.parse(&mut buf) {
				ParseOutcome::Complete(v) => v,
				other => panic!("Expected Complete, got {:?}", other),
			},
			Value::array(vec![
				Value::bulk_string("foo"),
				Value::array(vec![Value::integer(1)]),
				Value::bulk_string("bar"),
			])
		);
		assert_eq!(parser.scan, Scan::default());
		assert!(matches!(parser.parse(&mut buf), ParseOutcome::Complete(_)));
	}

	#[test]
	fn test_scan_restarts_on_shorter_buffer() {
		let mut parser = FrameParser::new();
		let mut buf = BytesMut::from(&b"*2\r\n:1\r\n"[..]);
		assert!(matches!(parser.parse(&mut buf), ParseOutcome::Incomplete));

		let mut other = BytesMut::from(&b"+OK\r\n"[..]);
		assert!(matches!(
			parser.parse(&mut other),
			ParseOutcome::Complete(Value::SimpleString(_))
		));
	}

	#[test]
	fn test_unterminated_line_is_bounded() {
		let config = DecoderConfig::default().with_max_line_len(16);
		let mut parser = FrameParser::with_config(config);

		let mut buf = BytesMut::from(&b"+aaaaaaaaaa"[..]);
		assert!(matches!(parser.parse(&mut buf), ParseOutcome::Incomplete));

		buf.extend_from_slice(&[b'a'; 64]);
		assert!(matches!(
			parser.parse(&mut buf),
			ParseOutcome::Error(DecodeError::LineTooLong(16))
		));
		assert_eq!(buf.len(), 75);
	}

	#[test]
	fn test_long_length_line_is_bounded() {
		let config = DecoderConfig::default().with_max_line_len(8);
		let mut parser = FrameParser::with_config(config);
		let mut buf = BytesMut::from(&b"*1\r\n$00000000000000000001\r\nx\r\n"[..]);
		assert!(matches!(
			parser.parse(&mut buf),
			ParseOutcome::Error(DecodeError::LineTooLong(8))
		));
	}
}
