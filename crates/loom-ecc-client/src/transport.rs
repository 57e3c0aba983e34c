// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP transport seam.
//!
//! [`EccClient`](crate::EccClient) only needs to send one request and look at
//! the status before deciding whether to read the body, so the seam exposes a
//! response whose body is read lazily. Dropping a response releases the
//! underlying connection.

use std::fmt;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::Method;
use loom_common_http::ClientSettings;
use tracing::trace;

use crate::error::TransportError;

/// A fully built request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
	pub method: Method,
	pub url: String,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
}

/// A response whose status is known and whose body has not been read yet.
#[async_trait]
pub trait TransportResponse: Send {
	fn status(&self) -> u16;

	/// Reads the full body. Reading a second time yields an empty string.
	async fn text(&mut self) -> Result<String, TransportError>;
}

/// Sends a single request. Implementations must be shareable across tasks.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn send(
		&self,
		request: TransportRequest,
	) -> Result<Box<dyn TransportResponse>, TransportError>;
}

/// Default transport backed by a [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
	http_client: reqwest::Client,
}

impl ReqwestTransport {
	/// Wraps an existing client, keeping its timeout and TLS settings.
	pub fn new(http_client: reqwest::Client) -> Self {
		Self { http_client }
	}

	pub fn from_settings(settings: &ClientSettings) -> Result<Self, TransportError> {
		let http_client = loom_common_http::build_client(settings)?;
		Ok(Self::new(http_client))
	}
}

impl fmt::Debug for ReqwestTransport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReqwestTransport").finish_non_exhaustive()
	}
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn send(
		&self,
		request: TransportRequest,
	) -> Result<Box<dyn TransportResponse>, TransportError> {
		let mut builder = self.http_client.request(request.method, &request.url);
		if let Some(body) = request.body {
			builder = builder.header(CONTENT_TYPE, "application/json").body(body);
		}

		let response = builder.send().await?;
		trace!(status = %response.status(), "received response");

		Ok(Box::new(ReqwestResponse {
			status: response.status().as_u16(),
			inner: Some(response),
		}))
	}
}

struct ReqwestResponse {
	status: u16,
	inner: Option<reqwest::Response>,
}

#[async_trait]
impl TransportResponse for ReqwestResponse {
	fn status(&self) -> u16 {
		self.status
	}

	async fn text(&mut self) -> Result<String, TransportError> {
		match self.inner.take() {
			Some(response) => Ok(response.text().await?),
			None => Ok(String::new()),
		}
	}
}
