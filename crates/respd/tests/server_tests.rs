use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use resp::FrameParser;
use resp::ParseOutcome;
use resp::RespEncoder;
use resp::Value;
use respd::Server;
use respd::ServerConfig;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server() -> SocketAddr {
    start_server_with(ServerConfig::default()).await
}

async fn start_server_with(config: ServerConfig) -> SocketAddr {
    let config = ServerConfig { port: 0, ..config };
    let server = Server::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

struct Client {
    stream: TcpStream,
    buffer: BytesMut,
    parser: FrameParser,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        Self {
            stream: TcpStream::connect(addr).await.unwrap(),
            buffer: BytesMut::new(),
            parser: FrameParser::new(),
        }
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).await.unwrap();
    }

    async fn command(&mut self, parts: &[&str]) -> Value {
        let request = Value::array(parts.iter().map(|p| Value::bulk_string(p.to_string())));
        self.send_raw(&request.encode()).await;
        self.reply().await
    }

    async fn reply(&mut self) -> Value {
        loop {
            if let ParseOutcome::Complete(value) = self.parser.parse(&mut self.buffer) {
                return value;
            }
            let n = timeout(TIMEOUT, self.stream.read_buf(&mut self.buffer))
                .await
                .expect("timed out waiting for reply")
                .unwrap();
            assert!(n > 0, "server closed the connection before replying");
        }
    }

    /// Wait for the server to close its side. A reset counts as closed.
    async fn expect_closed(&mut self) {
        let mut rest = Vec::new();
        let result = timeout(TIMEOUT, self.stream.read_to_end(&mut rest))
            .await
            .expect("connection was not closed");
        match result {
            Ok(n) => assert_eq!(n, 0, "unexpected trailing bytes: {:?}", rest),
            Err(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
        }
    }
}

#[tokio::test]
async fn test_ping() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(client.command(&["PING"]).await, Value::simple_string("PONG"));
    assert_eq!(
        client.command(&["PING", "hello"]).await,
        Value::bulk_string("hello")
    );
}

#[tokio::test]
async fn test_echo_and_errors() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    assert_eq!(
        client.command(&["ECHO", "hello world"]).await,
        Value::bulk_string("hello world")
    );
    assert_eq!(
        client.command(&["ECHO"]).await,
        Value::error("ERR wrong number of arguments for 'echo' command")
    );
    assert_eq!(
        client.command(&["SET", "k", "v"]).await,
        Value::error("ERR unknown command 'SET'")
    );
}

#[tokio::test]
async fn test_pipelined_and_fragmented_requests() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send_raw(b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$3\r\nab").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.send_raw(b"c\r\n").await;

    assert_eq!(client.reply().await, Value::simple_string("PONG"));
    assert_eq!(client.reply().await, Value::bulk_string("abc"));
}

#[tokio::test]
async fn test_non_command_frame_is_answered() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send_raw(b"+PING\r\n").await;
    assert_eq!(
        client.reply().await,
        Value::error("ERR Protocol error: expected array of bulk strings")
    );
    assert_eq!(client.command(&["PING"]).await, Value::simple_string("PONG"));
}

#[tokio::test]
async fn test_rejected_frame_keeps_connection() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send_raw(b":12x\r\n").await;
    let reply = client.reply().await;
    assert!(reply.is_error());
    assert!(
        reply
            .to_string_lossy()
            .unwrap()
            .starts_with("ERR Protocol error: Invalid integer")
    );

    assert_eq!(client.command(&["PING"]).await, Value::simple_string("PONG"));
}

#[tokio::test]
async fn test_desync_closes_connection() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    // Bulk payload longer than its declared length
    client.send_raw(b"$3\r\nabcd\r\n").await;
    let reply = client.reply().await;
    assert!(reply.is_error());
    assert!(
        reply
            .to_string_lossy()
            .unwrap()
            .starts_with("ERR Protocol error: Malformed terminator")
    );

    client.expect_closed().await;
}

#[tokio::test]
async fn test_unknown_type_closes_connection() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send_raw(b"?\r\n").await;
    let reply = client.reply().await;
    assert_eq!(
        reply,
        Value::error("ERR Protocol error: Unknown type marker: 0x3F")
    );

    client.expect_closed().await;
}

#[tokio::test]
async fn test_overlong_line_closes_connection() {
    let addr = start_server_with(ServerConfig {
        max_line_len: 1024,
        ..ServerConfig::default()
    })
    .await;
    let mut client = Client::connect(addr).await;

    // No CRLF anywhere; the server must give up once the limit is passed
    let mut line = vec![b'+'];
    line.resize(1040, b'a');
    client.send_raw(&line).await;

    assert_eq!(
        client.reply().await,
        Value::error("ERR Protocol error: Line exceeds limit of 1024 bytes")
    );
    client.expect_closed().await;
}

#[tokio::test]
async fn test_line_within_limit_is_accepted() {
    let addr = start_server_with(ServerConfig {
        max_line_len: 16,
        ..ServerConfig::default()
    })
    .await;
    let mut client = Client::connect(addr).await;

    // Bulk payloads are bounded by their own limit, not the line limit
    let payload = "x".repeat(100);
    assert_eq!(
        client.command(&["ECHO", &payload]).await,
        Value::bulk_string(payload)
    );
}

#[tokio::test]
async fn test_clients_are_independent() {
    let addr = start_server().await;
    let mut first = Client::connect(addr).await;
    let mut second = Client::connect(addr).await;

    first.send_raw(b"$3\r\nabcd\r\n").await;
    first.reply().await;
    first.expect_closed().await;

    assert_eq!(second.command(&["PING"]).await, Value::simple_string("PONG"));
}
