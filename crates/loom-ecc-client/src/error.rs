// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the ECC provisioning client.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures below the HTTP layer: no usable response was produced.
#[derive(Debug, Error)]
pub enum TransportError {
	/// The transport's own timeout elapsed.
	#[error("request timed out: {0}")]
	Timeout(#[source] BoxError),

	/// DNS resolution, TCP connect or TLS handshake failed.
	#[error("connection failed: {0}")]
	Connect(#[source] BoxError),

	/// Any other failure while sending the request or reading the response.
	#[error("HTTP transport error: {0}")]
	Http(#[source] BoxError),
}

impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			TransportError::Timeout(Box::new(e))
		} else if e.is_connect() {
			TransportError::Connect(Box::new(e))
		} else {
			TransportError::Http(Box::new(e))
		}
	}
}

/// Errors returned by every provisioning operation.
#[derive(Debug, Error)]
pub enum EccError {
	/// The call context was canceled or its deadline passed.
	#[error("request canceled or deadline exceeded")]
	RequestCanceled,

	/// The request body could not be serialized.
	#[error("failed to encode request body: {0}")]
	Encoding(#[from] serde_json::Error),

	/// The exchange failed before a response was available.
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),

	/// A response arrived with a status outside the endpoint's accepted set.
	#[error("unexpected status code {status}")]
	UnexpectedStatus {
		status: u16,
		/// Diagnostic excerpt of the response body, when one was captured.
		body: Option<String>,
	},
}

impl EccError {
	/// Returns the HTTP status for [`EccError::UnexpectedStatus`].
	pub fn status(&self) -> Option<u16> {
		match self {
			EccError::UnexpectedStatus { status, .. } => Some(*status),
			_ => None,
		}
	}

	pub fn is_canceled(&self) -> bool {
		matches!(self, EccError::RequestCanceled)
	}
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, EccError>;
