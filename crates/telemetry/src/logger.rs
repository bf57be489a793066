use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TelemetryError;

const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Timestamps as "[YYYY-MM-DD HH:MM:SS.micros]" in local time
struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
	fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
		let now: chrono::DateTime<chrono::Local> = chrono::Local::now();
		write!(w, "{}", now.format("[%Y-%m-%d %H:%M:%S%.6f]"))
	}
}

type ReloadHandle = reload::Handle<EnvFilter, Registry>;

static RELOAD_HANDLE: OnceLock<ReloadHandle> = OnceLock::new();

fn normalize_level(level: &str) -> Result<String, TelemetryError> {
	let level_lower = level.trim().to_lowercase();
	if VALID_LEVELS.contains(&level_lower.as_str()) {
		Ok(level_lower)
	} else {
		Err(TelemetryError::InvalidLogLevel(level.to_string()))
	}
}

/// Install the global subscriber at `level`.
///
/// Codec crates log through the `log` facade; those records are bridged
/// into the same subscriber, so one filter governs both.
///
/// # Example
///
/// ```no_run
/// telemetry::init("info")?;
/// # Ok::<(), telemetry::TelemetryError>(())
/// ```
///
/// # Errors
///
/// Fails if `level` is not one of trace, debug, info, warn, error, or if a
/// global subscriber is already installed.
pub fn init(level: &str) -> Result<(), TelemetryError> {
	let level = normalize_level(level)?;

	let (filter_layer, reload_handle) = reload::Layer::new(EnvFilter::new(&level));

	tracing_subscriber::registry()
		.with(filter_layer)
		.with(
			fmt::layer()
				.with_timer(LocalTimestamp)
				.with_target(true)
				.with_thread_ids(true)
				.with_line_number(false)
				.with_file(false),
		)
		.try_init()
		.map_err(|_| TelemetryError::AlreadyInitialized)?;

	let _ = RELOAD_HANDLE.set(reload_handle);
	Ok(())
}

/// Change the active log level without restarting.
///
/// ```no_run
/// # use telemetry::logger::reload_log_level;
/// reload_log_level("debug")?;
/// # Ok::<(), telemetry::TelemetryError>(())
/// ```
///
/// # Errors
///
/// Fails if the level name is unknown, if [`init`] has not run, or if the
/// subscriber has been dropped.
pub fn reload_log_level(level: &str) -> Result<(), TelemetryError> {
	let level = normalize_level(level)?;

	let handle = RELOAD_HANDLE.get().ok_or(TelemetryError::NotInitialized)?;

	handle
		.reload(EnvFilter::new(&level))
		.map_err(|e| TelemetryError::ReloadFailed(e.to_string()))
}
