use bytes::BytesMut;
use resp::FrameParser;
use resp::ParseOutcome;

fn main() {
	println!("--- RESP Streaming Parse Example ---");

	// Frames on the wire:
	// - "+OK\r\n"
	// - ":1000\r\n"
	// - "*2\r\n$3\r\nSET\r\n$3\r\nkey\r\n"
	// - ":12x\r\n" (rejected, stream stays usable)
	// - "+DONE\r\n"
	// delivered in arbitrary fragments.
	let data_chunks = vec![
		b"+O".as_slice(),
		b"K\r\n:1".as_slice(),
		b"00".as_slice(),
		b"0\r\n*2\r\n$3\r\nSE".as_slice(),
		b"T\r\n$3\r\nk".as_slice(),
		b"ey\r\n:12x\r\n+DO".as_slice(),
		b"NE\r\n".as_slice(),
	];

	let mut parser = FrameParser::new();
	let mut buffer = BytesMut::new();

	for (i, chunk) in data_chunks.iter().enumerate() {
		println!(
			"\n[Stream] Received chunk {}: {:?}",
			i,
			String::from_utf8_lossy(chunk)
		);

		buffer.extend_from_slice(chunk);

		loop {
			match parser.parse(&mut buffer) {
				ParseOutcome::Complete(value) => {
					println!("[Parser] Complete: {:?}", value);
				}
				ParseOutcome::Incomplete => {
					println!("[Parser] Incomplete, waiting for more data...");
					break;
				}
				ParseOutcome::Rejected(e) => {
					println!("[Parser] Rejected frame: {}", e);
				}
				ParseOutcome::Error(e) => {
					eprintln!("[Parser] Stream desynchronized: {}", e);
					return;
				}
			}
		}
	}
}
