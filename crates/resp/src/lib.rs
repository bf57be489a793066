//! # RESP - Redis Serialization Protocol codec
//!
//! A streaming decoder and an encoder for the RESP2 wire format.
//!
//! - [`Decoder`] reads one [`Value`] per call from any `BufRead` stream.
//! - [`Encoder`] writes one [`Value`] per call to any `Write` sink.
//! - [`FrameParser`] parses frames off an accumulating `BytesMut`, for async
//!   callers that do their own socket reads.
//!
//! ## Example
//!
//! ```rust
//! use resp::{Decoder, Encoder, Value};
//!
//! let mut decoder = Decoder::new(&b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n"[..]);
//! let request = decoder.decode().unwrap();
//! assert_eq!(request, Value::array(vec!["GET".into(), "key".into()]));
//!
//! let mut encoder = Encoder::new(Vec::new());
//! encoder.encode(&Value::Null).unwrap();
//! assert_eq!(encoder.into_inner(), b"$-1\r\n");
//! ```

mod config;
mod decode;
mod encode;
mod error;
mod parser;
mod types;
mod utils;

pub use config::DEFAULT_CHUNK_SIZE;
pub use config::DEFAULT_MAX_BULK_LEN;
pub use config::DEFAULT_MAX_DEPTH;
pub use config::DEFAULT_MAX_LINE_LEN;
pub use config::DecoderConfig;
pub use decode::Decoder;
pub use encode::Encoder;
pub use encode::RespEncoder;
pub use error::DecodeError;
pub use error::EncodeError;
pub use error::RespError;
pub use parser::FrameParser;
pub use parser::ParseOutcome;
pub use parser::parse;
pub use types::Value;
pub use types::ValueKind;
