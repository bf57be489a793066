use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
	#[error("Invalid log level: {0}")]
	InvalidLogLevel(String),

	#[error("Logger has not been initialized")]
	NotInitialized,

	#[error("Logger is already initialized")]
	AlreadyInitialized,

	#[error("Failed to reload log level: {0}")]
	ReloadFailed(String),
}
