// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::warn;

/// Transport settings applied on top of the standard builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
	/// Overall per-request timeout, covering connect, send and body read.
	pub timeout: Duration,
	/// Accept TLS peers whose certificate chain cannot be verified
	/// (self-signed or issued by an untrusted CA).
	pub accept_invalid_certs: bool,
	/// Overrides the standard Loom User-Agent when set.
	pub user_agent: Option<String>,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(30),
			accept_invalid_certs: false,
			user_agent: None,
		}
	}
}

/// Creates a new HTTP client builder with the standard Loom User-Agent header.
///
/// Use this when you need to customize the client (e.g., set timeout).
///
/// # Example
/// ```ignore
/// let client = loom_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a new HTTP client builder with a custom User-Agent header.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	Client::builder().user_agent(user_agent.into())
}

/// Builds a client from [`ClientSettings`].
///
/// Fails only when the TLS backend cannot be initialised.
pub fn build_client(settings: &ClientSettings) -> Result<Client, reqwest::Error> {
	let builder = match &settings.user_agent {
		Some(ua) => builder_with_user_agent(ua.clone()),
		None => builder(),
	};

	if settings.accept_invalid_certs {
		warn!("TLS certificate verification is disabled for this client");
	}

	builder
		.timeout(settings.timeout)
		.danger_accept_invalid_certs(settings.accept_invalid_certs)
		.build()
}

/// Returns the standard Loom User-Agent string.
///
/// Format: `loom/{platform}/{version}`
pub fn user_agent() -> String {
	format!(
		"loom/{}-{}/{}",
		std::env::consts::OS,
		std::env::consts::ARCH,
		env!("CARGO_PKG_VERSION")
	)
}
