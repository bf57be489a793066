//! Error types for RESP decoding and encoding.

use thiserror::Error;

/// Main error type for RESP operations.
#[derive(Error, Debug)]
pub enum RespError {
	#[error("Decode error: {0}")]
	Decode(#[from] DecodeError),

	#[error("Encode error: {0}")]
	Encode(#[from] EncodeError),
}

/// Errors that can occur while decoding a frame.
#[derive(Error, Debug)]
pub enum DecodeError {
	/// The leading byte is not one of `+ - : $ *`
	#[error("Unknown type marker: 0x{0:02X}")]
	UnknownType(u8),

	/// CRLF was not found where the framing requires one. `found` is the
	/// first offending byte, or `None` when the stream ended during the scan.
	#[error("Malformed terminator: expected CRLF, found {}", describe_found(.found))]
	MalformedTerminator { found: Option<u8> },

	/// Token is empty, not decimal, or does not fit in 64 bits
	#[error("Invalid integer: {0:?}")]
	InvalidInteger(String),

	/// Length is negative (other than the bulk string null marker) or over
	/// the configured limit
	#[error("Invalid length: {0}")]
	InvalidLength(i64),

	/// Stream closed in the middle of a value
	#[error("Unexpected end of stream")]
	UnexpectedEnd,

	/// Arrays nested deeper than the configured limit
	#[error("Nesting depth exceeds limit of {0}")]
	DepthExceeded(usize),

	/// A simple string, error or length line ran past the configured limit
	/// without reaching its CRLF
	#[error("Line exceeds limit of {0} bytes")]
	LineTooLong(usize),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

fn describe_found(found: &Option<u8>) -> String {
	match found {
		Some(b) => format!("0x{b:02X}"),
		None => "end of stream".to_string(),
	}
}

impl DecodeError {
	/// Whether the failure was caused by running out of input rather than by
	/// bytes that can never form a valid frame.
	pub fn is_incomplete(&self) -> bool {
		matches!(
			self,
			DecodeError::UnexpectedEnd | DecodeError::MalformedTerminator { found: None }
		)
	}
}

/// Errors that can occur while encoding a value.
#[derive(Error, Debug)]
pub enum EncodeError {
	#[error("Failed to write to sink: {0}")]
	Sink(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(DecodeError::UnexpectedEnd, true)]
	#[case(DecodeError::MalformedTerminator { found: None }, true)]
	#[case(DecodeError::MalformedTerminator { found: Some(b'x') }, false)]
	#[case(DecodeError::UnknownType(b'?'), false)]
	#[case(DecodeError::InvalidInteger("12a".into()), false)]
	#[case(DecodeError::InvalidLength(-2), false)]
	#[case(DecodeError::DepthExceeded(4), false)]
	#[case(DecodeError::LineTooLong(16), false)]
	fn test_is_incomplete(#[case] err: DecodeError, #[case] expected: bool) {
		assert_eq!(err.is_incomplete(), expected);
	}

	#[test]
	fn test_display() {
		assert_eq!(
			DecodeError::UnknownType(b'!').to_string(),
			"Unknown type marker: 0x21"
		);
		assert_eq!(
			DecodeError::MalformedTerminator { found: None }.to_string(),
			"Malformed terminator: expected CRLF, found end of stream"
		);
		assert_eq!(
			DecodeError::MalformedTerminator { found: Some(b'a') }.to_string(),
			"Malformed terminator: expected CRLF, found 0x61"
		);
		assert_eq!(
			DecodeError::InvalidInteger("abc".into()).to_string(),
			"Invalid integer: \"abc\""
		);
		assert_eq!(
			DecodeError::LineTooLong(1024).to_string(),
			"Line exceeds limit of 1024 bytes"
		);
	}

	#[test]
	fn test_resp_error_from() {
		let err: RespError = DecodeError::UnexpectedEnd.into();
		assert!(matches!(err, RespError::Decode(DecodeError::UnexpectedEnd)));
		assert_eq!(err.to_string(), "Decode error: Unexpected end of stream");
	}
}
