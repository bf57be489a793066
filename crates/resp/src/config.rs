//! Limits applied by the decoder to untrusted input.

/// Default maximum array nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default ceiling for a single bulk payload read step.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Default maximum declared bulk string length (512 MiB).
pub const DEFAULT_MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Default maximum length of a simple string, error or length line (64 KiB),
/// excluding its CRLF.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Decoder limits.
///
/// A top-level array is at depth 1; `max_depth = 0` rejects every array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
	pub max_depth: usize,
	pub chunk_size: usize,
	pub max_bulk_len: usize,
	pub max_line_len: usize,
}

impl Default for DecoderConfig {
	fn default() -> Self {
		Self {
			max_depth: DEFAULT_MAX_DEPTH,
			chunk_size: DEFAULT_CHUNK_SIZE,
			max_bulk_len: DEFAULT_MAX_BULK_LEN,
			max_line_len: DEFAULT_MAX_LINE_LEN,
		}
	}
}

impl DecoderConfig {
	pub fn with_max_depth(mut self, max_depth: usize) -> Self {
		self.max_depth = max_depth;
		self
	}

	/// A chunk size of zero is raised to one byte.
	pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
		self.chunk_size = chunk_size.max(1);
		self
	}

	pub fn with_max_bulk_len(mut self, max_bulk_len: usize) -> Self {
		self.max_bulk_len = max_bulk_len;
		self
	}

	pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
		self.max_line_len = max_line_len;
		self
	}

	/// Longest line the decoder buffers, terminator included.
	pub(crate) fn line_limit(&self) -> usize {
		self.max_line_len.saturating_add(crate::utils::CRLF.len())
	}
}
