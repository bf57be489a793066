use bytes::Bytes;
use resp::Value;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CmdError {
	#[error("expected array of bulk strings")]
	NotACommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdType {
	Ping,
	Echo,
	Config,
}

impl std::str::FromStr for CmdType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_uppercase().as_str() {
			"PING" => Ok(CmdType::Ping),
			"ECHO" => Ok(CmdType::Echo),
			"CONFIG" => Ok(CmdType::Config),
			_ => Err(format!("unknown command '{}'", s)),
		}
	}
}

/// A request decoded into a command name and its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCmd {
	pub name: String,
	pub args: Vec<Bytes>,
}

impl TryFrom<Value> for ParsedCmd {
	type Error = CmdError;

	fn try_from(value: Value) -> Result<Self, Self::Error> {
		let mut items = value
			.into_array()
			.ok_or(CmdError::NotACommand)?
			.into_iter();

		let name = match items.next() {
			Some(Value::SimpleString(b) | Value::BulkString(b)) => {
				String::from_utf8_lossy(&b).into_owned()
			}
			_ => return Err(CmdError::NotACommand),
		};

		let args = items
			.map(|v| v.as_bytes().cloned().ok_or(CmdError::NotACommand))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(ParsedCmd { name, args })
	}
}

impl ParsedCmd {
	pub fn execute(&self) -> Value {
		let typ = match self.name.parse::<CmdType>() {
			Ok(typ) => typ,
			Err(msg) => return Value::error(format!("ERR {}", msg)),
		};

		match (typ, self.args.as_slice()) {
			(CmdType::Ping, []) => Value::simple_string("PONG"),
			(CmdType::Ping, [msg]) | (CmdType::Echo, [msg]) => Value::BulkString(msg.clone()),
			(CmdType::Config, [sub, rest @ ..]) => config_cmd(sub, rest),
			_ => wrong_arity(&self.name),
		}
	}
}

/// `CONFIG SET loglevel <level>` adjusts the running log filter; no other
/// parameter can be changed at runtime.
fn config_cmd(sub: &Bytes, args: &[Bytes]) -> Value {
	let sub = String::from_utf8_lossy(sub);
	if !sub.eq_ignore_ascii_case("SET") {
		return Value::error(format!("ERR unknown subcommand '{}'", sub));
	}

	let [param, value] = args else {
		return wrong_arity("config|set");
	};

	let param = String::from_utf8_lossy(param);
	if !param.eq_ignore_ascii_case("loglevel") {
		return Value::error(format!("ERR Unknown option '{}'", param));
	}

	match telemetry::reload_log_level(&String::from_utf8_lossy(value)) {
		Ok(()) => {
			info!("Log level changed to {}", String::from_utf8_lossy(value));
			Value::simple_string("OK")
		}
		Err(e) => Value::error(format!("ERR {}", e)),
	}
}

fn wrong_arity(name: &str) -> Value {
	Value::error(format!(
		"ERR wrong number of arguments for '{}' command",
		name.to_lowercase()
	))
}
