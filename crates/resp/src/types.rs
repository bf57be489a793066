//! RESP2 value model.

use std::fmt;

use bytes::Bytes;

/// A single RESP2 value.
///
/// The set of variants is closed: every frame the decoder accepts maps to
/// exactly one of them and every variant has exactly one wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
	/// Simple string: `+OK\r\n`
	SimpleString(Bytes),

	/// Error: `-ERR message\r\n`
	Error(Bytes),

	/// Integer: `:1000\r\n`
	Integer(i64),

	/// Bulk string: `$6\r\nfoobar\r\n`
	BulkString(Bytes),

	/// Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
	Array(Vec<Value>),

	/// Null bulk string: `$-1\r\n`
	Null,
}

/// The variant of a [`Value`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
	SimpleString,
	Error,
	Integer,
	BulkString,
	Array,
	Null,
}

impl ValueKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ValueKind::SimpleString => "simple string",
			ValueKind::Error => "error",
			ValueKind::Integer => "integer",
			ValueKind::BulkString => "bulk string",
			ValueKind::Array => "array",
			ValueKind::Null => "null",
		}
	}
}

impl fmt::Display for ValueKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl Value {
	pub fn kind(&self) -> ValueKind {
		match self {
			Value::SimpleString(_) => ValueKind::SimpleString,
			Value::Error(_) => ValueKind::Error,
			Value::Integer(_) => ValueKind::Integer,
			Value::BulkString(_) => ValueKind::BulkString,
			Value::Array(_) => ValueKind::Array,
			Value::Null => ValueKind::Null,
		}
	}

	/// Check if the value is an error
	pub fn is_error(&self) -> bool {
		matches!(self, Value::Error(_))
	}

	/// Check if the value is null
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Borrow the text of a simple or bulk string, if it is valid UTF-8.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::SimpleString(s) | Value::BulkString(s) => std::str::from_utf8(s).ok(),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&Bytes> {
		match self {
			Value::SimpleString(b) | Value::BulkString(b) => Some(b),
			_ => None,
		}
	}

	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Value::Integer(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			Value::Array(a) => Some(a),
			_ => None,
		}
	}

	/// Convert to String with lossy UTF-8 conversion
	pub fn to_string_lossy(&self) -> Option<String> {
		match self {
			Value::SimpleString(s) | Value::BulkString(s) | Value::Error(s) => {
				Some(String::from_utf8_lossy(s).into_owned())
			}
			_ => None,
		}
	}

	pub fn into_array(self) -> Option<Vec<Value>> {
		match self {
			Value::Array(a) => Some(a),
			_ => None,
		}
	}

	// Convenience constructors

	pub fn simple_string(s: impl Into<Bytes>) -> Self {
		Value::SimpleString(s.into())
	}

	pub fn bulk_string(s: impl Into<Bytes>) -> Self {
		Value::BulkString(s.into())
	}

	pub fn error(e: impl Into<Bytes>) -> Self {
		Value::Error(e.into())
	}

	pub fn integer(i: i64) -> Self {
		Value::Integer(i)
	}

	pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
		Value::Array(items.into_iter().collect())
	}

	pub fn null() -> Self {
		Value::Null
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::BulkString(Bytes::copy_from_slice(s.as_bytes()))
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::BulkString(Bytes::from(s))
	}
}

impl From<&[u8]> for Value {
	fn from(b: &[u8]) -> Self {
		Value::BulkString(Bytes::copy_from_slice(b))
	}
}

impl From<Vec<u8>> for Value {
	fn from(v: Vec<u8>) -> Self {
		Value::BulkString(Bytes::from(v))
	}
}

impl From<Bytes> for Value {
	fn from(b: Bytes) -> Self {
		Value::BulkString(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Value::Integer(i)
	}
}

impl<T: Into<Value>> From<Vec<T>> for Value {
	fn from(v: Vec<T>) -> Self {
		Value::Array(v.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(o: Option<T>) -> Self {
		match o {
			Some(v) => v.into(),
			None => Value::Null,
		}
	}
}
