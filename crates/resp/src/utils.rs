//! Framing constants and token helpers shared by the decoder and encoder.

use crate::error::DecodeError;

/// CRLF line ending
pub const CRLF: &[u8] = b"\r\n";

/// Type markers for RESP2
pub const SIMPLE_STRING: u8 = b'+';
pub const ERROR: u8 = b'-';
pub const INTEGER: u8 = b':';
pub const BULK_STRING: u8 = b'$';
pub const ARRAY: u8 = b'*';

/// Wire form of the null bulk string, without its terminator.
pub const NULL_BULK: &[u8] = b"$-1";

/// Bulk string length that denotes Null.
pub const NULL_LEN: i64 = -1;

/// Parse a signed decimal token.
///
/// Accepts an optional leading `-` followed by at least one ASCII digit.
/// Anything else, including a leading `+` or surrounding whitespace, is
/// rejected, as is a value outside the `i64` range.
pub fn parse_integer(token: &[u8]) -> Result<i64, DecodeError> {
	let invalid = || DecodeError::InvalidInteger(String::from_utf8_lossy(token).into_owned());

	let (negative, digits) = match token.split_first() {
		Some((b'-', rest)) => (true, rest),
		_ => (false, token),
	};
	if digits.is_empty() {
		return Err(invalid());
	}

	// Accumulate toward the sign so that i64::MIN does not overflow.
	let mut value: i64 = 0;
	for &b in digits {
		if !b.is_ascii_digit() {
			return Err(invalid());
		}
		let digit = i64::from(b - b'0');
		value = value.checked_mul(10).ok_or_else(invalid)?;
		value = if negative {
			value.checked_sub(digit)
		} else {
			value.checked_add(digit)
		}
		.ok_or_else(invalid)?;
	}
	Ok(value)
}

/// Number of decimal digits needed to print `n`.
#[inline]
pub fn digits_in_number(mut n: u64) -> usize {
	let mut digits = 1;
	while n >= 10 {
		n /= 10;
		digits += 1;
	}
	digits
}

/// Length of the decimal form of `i`, sign included.
#[inline]
pub fn integer_len(i: i64) -> usize {
	let sign = usize::from(i < 0);
	sign + digits_in_number(i.unsigned_abs())
}
