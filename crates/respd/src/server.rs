use std::io::ErrorKind;
use std::net::SocketAddr;

use bytes::BytesMut;
use resp::DecoderConfig;
use resp::FrameParser;
use resp::ParseOutcome;
use resp::RespEncoder;
use resp::Value;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::cmd::ParsedCmd;
use crate::config::ServerConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct Server {
	listener: TcpListener,
	decoder_config: DecoderConfig,
}

impl Server {
	/// Bind the listening socket. Port 0 picks a free port; see
	/// [`Server::local_addr`].
	pub async fn bind(config: &ServerConfig) -> std::io::Result<Self> {
		let listener = TcpListener::bind(config.addr()).await?;
		Ok(Self {
			listener,
			decoder_config: config.decoder_config(),
		})
	}

	pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
		self.listener.local_addr()
	}

	pub async fn run(self) -> Result<(), BoxError> {
		info!("respd listening on {}", self.local_addr()?);

		loop {
			match self.listener.accept().await {
				Ok((socket, addr)) => {
					debug!("New client connected from {}", addr);
					let parser = FrameParser::with_config(self.decoder_config);

					tokio::spawn(async move {
						if let Err(e) = handle_client(socket, parser).await {
							error!("Error handling client {}: {}", addr, e);
						}
						debug!("Client {} disconnected", addr);
					});
				}
				Err(e) => {
					error!("Error accepting connection: {}", e);
				}
			}
		}
	}
}

fn protocol_error(detail: impl std::fmt::Display) -> Value {
	Value::error(format!("ERR Protocol error: {}", detail))
}

async fn handle_client(mut socket: TcpStream, mut parser: FrameParser) -> Result<(), BoxError> {
	let mut buffer = BytesMut::with_capacity(4096);
	let mut out = BytesMut::with_capacity(4096);

	loop {
		let n = match socket.read_buf(&mut buffer).await {
			Ok(n) => n,
			Err(e) if e.kind() == ErrorKind::ConnectionReset => {
				debug!("Connection reset by peer");
				return Ok(());
			}
			Err(e) => return Err(e.into()),
		};

		if n == 0 {
			if buffer.is_empty() {
				return Ok(());
			} else {
				return Err("Connection closed with incomplete data".into());
			}
		}

		loop {
			match parser.parse(&mut buffer) {
				ParseOutcome::Complete(value) => {
					let response = match ParsedCmd::try_from(value) {
						Ok(cmd) => {
							debug!(command = %cmd.name, args = cmd.args.len(), "Executing command");
							cmd.execute()
						}
						Err(e) => protocol_error(e),
					};
					response.encode_to(&mut out);
				}
				ParseOutcome::Incomplete => {
					break;
				}
				ParseOutcome::Rejected(e) => {
					warn!("Rejected malformed frame: {}", e);
					protocol_error(&e).encode_to(&mut out);
				}
				ParseOutcome::Error(e) => {
					protocol_error(&e).encode_to(&mut out);
					write_replies(&mut socket, &mut out).await?;
					return Err(e.into());
				}
			}
		}

		if !write_replies(&mut socket, &mut out).await? {
			return Ok(());
		}
	}
}

/// Send every buffered reply. Returns `false` if the peer has gone away.
async fn write_replies(socket: &mut TcpStream, out: &mut BytesMut) -> std::io::Result<bool> {
	if out.is_empty() {
		return Ok(true);
	}

	let result = socket.write_all(&out[..]).await;
	out.clear();
	match result {
		Ok(()) => Ok(true),
		Err(e) if matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::BrokenPipe) => {
			debug!("Connection reset by peer");
			Ok(false)
		}
		Err(e) => Err(e),
	}
}
