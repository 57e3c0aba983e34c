// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration.

use std::time::Duration;

use loom_common_http::ClientSettings;

use crate::secret::SecretString;
use crate::types::ServerIdentity;

/// Overall timeout applied by the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Port the provisioning service listens on for HTTPS.
pub const DEFAULT_HTTPS_PORT: u16 = 9443;

/// Port the provisioning service listens on for plain HTTP.
pub const DEFAULT_HTTP_PORT: u16 = 9090;

/// Configuration for an [`EccClient`](crate::EccClient).
///
/// The identity fields are copied verbatim into the [`ServerIdentity`] sent
/// with every request.
#[derive(Debug, Clone)]
pub struct EccClientConfig {
	/// Application server host of the backend system.
	pub host: String,
	/// Backend client (mandant), e.g. `300`.
	pub client_id: String,
	/// Backend system number, e.g. `00`.
	pub system_number: String,
	/// Technical user the service logs on with.
	pub username: String,
	pub password: SecretString,
	/// Sent as `isTestingServer`. Defaults to `true`.
	pub is_testing_server: bool,
	/// Overall timeout for the default transport.
	pub timeout: Duration,
	/// Accept self-signed or otherwise unverifiable TLS certificates.
	///
	/// Defaults to `true`: provisioning services are commonly deployed with
	/// self-signed certificates. Set to `false` to require a trusted chain.
	pub allow_untrusted_certificates: bool,
}

impl EccClientConfig {
	pub fn new(
		host: impl Into<String>,
		client_id: impl Into<String>,
		system_number: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<SecretString>,
	) -> Self {
		Self {
			host: host.into(),
			client_id: client_id.into(),
			system_number: system_number.into(),
			username: username.into(),
			password: password.into(),
			is_testing_server: true,
			timeout: DEFAULT_TIMEOUT,
			allow_untrusted_certificates: true,
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_allow_untrusted_certificates(mut self, allow: bool) -> Self {
		self.allow_untrusted_certificates = allow;
		self
	}

	pub fn with_testing_server(mut self, is_testing_server: bool) -> Self {
		self.is_testing_server = is_testing_server;
		self
	}

	/// Settings for the default reqwest transport.
	pub fn client_settings(&self) -> ClientSettings {
		ClientSettings {
			timeout: self.timeout,
			accept_invalid_certs: self.allow_untrusted_certificates,
			user_agent: None,
		}
	}

	/// Builds the identity embedded in every request.
	pub fn server_identity(&self) -> ServerIdentity {
		ServerIdentity {
			host: self.host.clone(),
			system_number: self.system_number.clone(),
			client_id: self.client_id.clone(),
			jco_user: self.username.clone(),
			jco_password: self.password.clone(),
			is_testing_server: self.is_testing_server,
		}
	}
}
