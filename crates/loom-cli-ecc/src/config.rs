// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration: TOML file, then `LOOM_ECC_*` environment
//! variables, then command-line flags. Later layers override earlier ones
//! field by field.
//!
//! ```toml
//! [server]
//! host = "ecc.example.com"
//! client_id = "300"
//! system_number = "00"
//! username = "RFC_USER"
//! password = "..."
//!
//! [service]
//! base_url = "https://127.0.0.1"
//! port = 9443
//!
//! [transport]
//! timeout_secs = 120
//! allow_untrusted_certificates = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use loom_ecc_client::{EccClientConfig, SecretString, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "https://127.0.0.1";

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub server: Option<ServerLayer>,
	#[serde(default)]
	pub service: Option<ServiceLayer>,
	#[serde(default)]
	pub transport: Option<TransportLayer>,
}

/// Backend system the provisioning service acts on.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerLayer {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub system_number: Option<String>,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub password: Option<SecretString>,
	#[serde(default)]
	pub is_testing_server: Option<bool>,
}

/// Where the provisioning service itself listens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportLayer {
	#[serde(default)]
	pub timeout_secs: Option<u64>,
	#[serde(default)]
	pub allow_untrusted_certificates: Option<bool>,
}

/// Fully resolved settings for one CLI run.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
	pub client: EccClientConfig,
	pub base_url: String,
	pub port: u16,
}

impl ConfigLayer {
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.server, other.server, ServerLayer::merge);
		merge_option(&mut self.service, other.service, ServiceLayer::merge);
		merge_option(&mut self.transport, other.transport, TransportLayer::merge);
	}

	pub fn server_mut(&mut self) -> &mut ServerLayer {
		self.server.get_or_insert_with(ServerLayer::default)
	}

	pub fn service_mut(&mut self) -> &mut ServiceLayer {
		self.service.get_or_insert_with(ServiceLayer::default)
	}

	pub fn transport_mut(&mut self) -> &mut TransportLayer {
		self.transport.get_or_insert_with(TransportLayer::default)
	}

	/// Applies defaults and checks required fields.
	pub fn finalize(self) -> Result<ResolvedConfig, ConfigError> {
		let server = self.server.unwrap_or_default();
		let service = self.service.unwrap_or_default();
		let transport = self.transport.unwrap_or_default();

		let host = required(server.host, "server.host")?;
		let client_id = required(server.client_id, "server.client_id")?;
		let system_number = required(server.system_number, "server.system_number")?;
		let username = required(server.username, "server.username")?;
		let password = server
			.password
			.ok_or_else(|| ConfigError::missing_field("server.password"))?;

		let base_url = service
			.base_url
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
		let port = match service.port {
			Some(0) => return Err(ConfigError::invalid_value("service.port", "must be non-zero")),
			Some(port) => port,
			None if base_url.starts_with("http://") => DEFAULT_HTTP_PORT,
			None => DEFAULT_HTTPS_PORT,
		};
		if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
			return Err(ConfigError::invalid_value(
				"service.base_url",
				format!("'{base_url}' must start with http:// or https://"),
			));
		}

		let mut client = EccClientConfig::new(host, client_id, system_number, username, password);
		if let Some(is_testing_server) = server.is_testing_server {
			client = client.with_testing_server(is_testing_server);
		}
		match transport.timeout_secs {
			Some(0) => {
				return Err(ConfigError::invalid_value(
					"transport.timeout_secs",
					"must be non-zero",
				))
			}
			Some(secs) => client = client.with_timeout(Duration::from_secs(secs)),
			None => {}
		}
		if let Some(allow) = transport.allow_untrusted_certificates {
			client = client.with_allow_untrusted_certificates(allow);
		}

		Ok(ResolvedConfig {
			client,
			base_url,
			port,
		})
	}
}

impl ServerLayer {
	fn merge(&mut self, other: ServerLayer) {
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.system_number.is_some() {
			self.system_number = other.system_number;
		}
		if other.username.is_some() {
			self.username = other.username;
		}
		if other.password.is_some() {
			self.password = other.password;
		}
		if other.is_testing_server.is_some() {
			self.is_testing_server = other.is_testing_server;
		}
	}
}

impl ServiceLayer {
	fn merge(&mut self, other: ServiceLayer) {
		if other.base_url.is_some() {
			self.base_url = other.base_url;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
	}
}

impl TransportLayer {
	fn merge(&mut self, other: TransportLayer) {
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		if other.allow_untrusted_certificates.is_some() {
			self.allow_untrusted_certificates = other.allow_untrusted_certificates;
		}
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
	value
		.filter(|v| !v.trim().is_empty())
		.ok_or_else(|| ConfigError::missing_field(field))
}

/// Loads a TOML layer. A missing file yields an empty layer unless
/// `required` is set.
pub fn load_file(path: &Path, required: bool) -> Result<ConfigLayer, ConfigError> {
	if !required && !path.exists() {
		debug!(path = %path.display(), "config file not found, skipping");
		return Ok(ConfigLayer::default());
	}

	debug!(path = %path.display(), "loading config file");
	let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
		path: path.to_path_buf(),
		source: e,
	})?;

	toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
		path: path.to_path_buf(),
		source: e,
	})
}

/// Builds a layer from `LOOM_ECC_*` variables.
pub fn load_env<I>(vars: I) -> Result<ConfigLayer, ConfigError>
where
	I: IntoIterator<Item = (String, String)>,
{
	let mut layer = ConfigLayer::default();

	for (key, value) in vars {
		if !key.starts_with("LOOM_ECC_") {
			continue;
		}

		let value = value.trim().to_string();
		if value.is_empty() {
			continue;
		}

		trace!(key = %key, "processing env var");

		match key.as_str() {
			"LOOM_ECC_HOST" => layer.server_mut().host = Some(value),
			"LOOM_ECC_CLIENT" => layer.server_mut().client_id = Some(value),
			"LOOM_ECC_SYSTEM_NUMBER" => layer.server_mut().system_number = Some(value),
			"LOOM_ECC_USERNAME" => layer.server_mut().username = Some(value),
			"LOOM_ECC_PASSWORD" => layer.server_mut().password = Some(SecretString::new(value)),
			"LOOM_ECC_TESTING_SERVER" => {
				layer.server_mut().is_testing_server = Some(parse_bool(&key, &value)?)
			}
			"LOOM_ECC_BASE_URL" => layer.service_mut().base_url = Some(value),
			"LOOM_ECC_PORT" => {
				let port = value
					.parse()
					.map_err(|e| ConfigError::invalid_value(&key, format!("{e}")))?;
				layer.service_mut().port = Some(port);
			}
			"LOOM_ECC_TIMEOUT_SECS" => {
				let secs = value
					.parse()
					.map_err(|e| ConfigError::invalid_value(&key, format!("{e}")))?;
				layer.transport_mut().timeout_secs = Some(secs);
			}
			"LOOM_ECC_ALLOW_UNTRUSTED_CERTS" => {
				layer.transport_mut().allow_untrusted_certificates = Some(parse_bool(&key, &value)?)
			}
			_ => {
				// Unknown LOOM_ECC_ variable, ignore
			}
		}
	}

	Ok(layer)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
	match value.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		other => Err(ConfigError::invalid_value(
			key,
			format!("'{other}' is not a boolean"),
		)),
	}
}

/// Loads the file layer (explicit path or XDG default), the environment
/// layer, and finally the CLI overrides.
pub fn load_config(
	explicit_path: Option<PathBuf>,
	cli: ConfigLayer,
) -> Result<ResolvedConfig, ConfigError> {
	let mut layer = match explicit_path {
		Some(path) => load_file(&path, true)?,
		None => load_file(&crate::paths::user_config_file()?, false)?,
	};
	layer.merge(load_env(std::env::vars())?);
	layer.merge(cli);
	layer.finalize()
}
