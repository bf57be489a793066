use clap::Parser;
use respd::Cli;
use respd::Server;
use respd::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let args = Cli::parse();
	let config = ServerConfig::from_cli(args)?;

	telemetry::init(&config.log_level)?;

	let server = Server::bind(&config).await?;
	server.run().await
}
