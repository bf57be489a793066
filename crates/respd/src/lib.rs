//! respd: a small RESP2 server built on the `resp` codec.
//!
//! It answers `PING` and `ECHO` and applies the codec's framing outcomes to
//! live connections: malformed frames that leave the stream aligned get an
//! error reply, anything that desynchronizes the stream closes it.

pub mod cmd;
pub mod config;
pub mod server;

pub use config::Cli;
pub use config::ConfigError;
pub use config::ServerConfig;
pub use server::Server;
