// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ECC provisioning client implementation.

use std::fmt;
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use tracing::{debug, instrument, trace, Level};

use crate::config::EccClientConfig;
use crate::context::CallContext;
use crate::error::{EccError, Result};
use crate::secret::redact_json;
use crate::transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
use crate::types::{AssignGroupsRequest, LockRequest, NewUser, RoleAssignment, ServerIdentity};

/// Longest body excerpt kept on [`EccError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// One remote capability: where it lives and which statuses mean success.
#[derive(Debug)]
struct Endpoint {
	method: Method,
	path: &'static str,
	accepted: &'static [u16],
	/// Keep a body excerpt on unexpected statuses.
	capture_error_body: bool,
}

impl Endpoint {
	fn url(&self, base_url: &str, port: u16) -> String {
		format!("{}:{}{}", base_url.trim_end_matches('/'), port, self.path)
	}

	fn accepts(&self, status: u16) -> bool {
		self.accepted.contains(&status)
	}
}

static ABOUT: Endpoint = Endpoint {
	method: Method::GET,
	path: "/about",
	accepted: &[200],
	capture_error_body: false,
};

static PING: Endpoint = Endpoint {
	method: Method::POST,
	path: "/ping",
	accepted: &[200],
	capture_error_body: true,
};

static LOCK: Endpoint = Endpoint {
	method: Method::POST,
	path: "/lock",
	accepted: &[200],
	capture_error_body: true,
};

static CREATE_USER: Endpoint = Endpoint {
	method: Method::POST,
	path: "/create_user",
	accepted: &[200, 201],
	capture_error_body: true,
};

static ASSIGN_GROUPS: Endpoint = Endpoint {
	method: Method::POST,
	path: "/assign_groups",
	accepted: &[200, 201],
	capture_error_body: true,
};

/// Client for an ECC provisioning service.
///
/// Constructed once per backend system; cheap to clone and safe to share
/// between tasks. The target service URL and port are supplied per call.
#[derive(Clone)]
pub struct EccClient {
	config: Arc<EccClientConfig>,
	transport: Arc<dyn Transport>,
}

impl EccClient {
	/// Creates a client with the default reqwest transport built from the
	/// config's timeout and certificate settings.
	pub fn new(config: EccClientConfig) -> Self {
		let transport = ReqwestTransport::from_settings(&config.client_settings())
			.expect("Failed to create HTTP client");
		Self::with_transport(config, Arc::new(transport))
	}

	/// Creates a client that sends through a caller-supplied reqwest client.
	pub fn with_http_client(config: EccClientConfig, http_client: reqwest::Client) -> Self {
		Self::with_transport(config, Arc::new(ReqwestTransport::new(http_client)))
	}

	pub fn with_transport(config: EccClientConfig, transport: Arc<dyn Transport>) -> Self {
		Self {
			config: Arc::new(config),
			transport,
		}
	}

	pub fn config(&self) -> &EccClientConfig {
		&self.config
	}

	/// The identity embedded in every request body.
	pub fn server_identity(&self) -> ServerIdentity {
		self.config.server_identity()
	}

	/// Fetches the service version from `GET /about` (plain text).
	#[instrument(skip(self, ctx))]
	pub async fn get_version(&self, ctx: &CallContext, base_url: &str, port: u16) -> Result<String> {
		let mut response = self.execute(ctx, base_url, port, &ABOUT, None).await?;
		let version = ctx.run(response.text()).await??;
		debug!(version = %version, "service version");
		Ok(version)
	}

	/// Checks that the service can reach the backend system.
	#[instrument(skip(self, ctx))]
	pub async fn ping(&self, ctx: &CallContext, base_url: &str, port: u16) -> Result<()> {
		let identity = self.server_identity();
		self.post(ctx, base_url, port, &PING, &identity).await
	}

	/// Locks an existing user.
	#[instrument(skip(self, ctx))]
	pub async fn lock(
		&self,
		ctx: &CallContext,
		base_url: &str,
		port: u16,
		username: &str,
	) -> Result<()> {
		let request = LockRequest {
			server: self.server_identity(),
			username: username.to_string(),
		};
		self.post(ctx, base_url, port, &LOCK, &request).await
	}

	/// Creates (or updates) a user. Both 200 and 201 count as success.
	#[instrument(skip(self, ctx, user), fields(username = %user.username))]
	pub async fn create_user(
		&self,
		ctx: &CallContext,
		base_url: &str,
		port: u16,
		user: NewUser,
	) -> Result<()> {
		let request = user.into_request(self.server_identity());
		self.post(ctx, base_url, port, &CREATE_USER, &request).await
	}

	/// Assigns groups to a user in the given order. Both 200 and 201 count as
	/// success; an empty list is forwarded as-is.
	#[instrument(skip(self, ctx, groups), fields(group_count = groups.len()))]
	pub async fn assign_user_groups(
		&self,
		ctx: &CallContext,
		base_url: &str,
		port: u16,
		username: &str,
		groups: Vec<RoleAssignment>,
	) -> Result<()> {
		let request = AssignGroupsRequest {
			server: self.server_identity(),
			username: username.to_string(),
			user_groups: groups,
		};
		self.post(ctx, base_url, port, &ASSIGN_GROUPS, &request).await
	}

	async fn post<T>(
		&self,
		ctx: &CallContext,
		base_url: &str,
		port: u16,
		endpoint: &Endpoint,
		payload: &T,
	) -> Result<()>
	where
		T: Serialize,
	{
		let value = serde_json::to_value(payload)?;
		if tracing::enabled!(Level::TRACE) {
			trace!(path = endpoint.path, body = %redact_json(&value), "request body");
		}
		let body = serde_json::to_vec(&value)?;

		// Success responses carry nothing we use; dropping releases them.
		self
			.execute(ctx, base_url, port, endpoint, Some(body))
			.await
			.map(drop)
	}

	async fn execute(
		&self,
		ctx: &CallContext,
		base_url: &str,
		port: u16,
		endpoint: &Endpoint,
		body: Option<Vec<u8>>,
	) -> Result<Box<dyn TransportResponse>> {
		if ctx.is_done() {
			debug!(path = endpoint.path, "context already done, not sending");
			return Err(EccError::RequestCanceled);
		}

		let request = TransportRequest {
			method: endpoint.method.clone(),
			url: endpoint.url(base_url, port),
			body,
		};
		debug!(method = %request.method, url = %request.url, "sending request");

		let mut response = ctx.run(self.transport.send(request)).await??;
		let status = response.status();
		debug!(status, "received response");

		if endpoint.accepts(status) {
			return Ok(response);
		}

		let body = if endpoint.capture_error_body {
			match ctx.run(response.text()).await {
				Ok(Ok(text)) => excerpt(&text),
				_ => None,
			}
		} else {
			None
		};

		Err(EccError::UnexpectedStatus { status, body })
	}
}

impl fmt::Debug for EccClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EccClient")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

fn excerpt(body: &str) -> Option<String> {
	let trimmed = body.trim();
	if trimmed.is_empty() {
		return None;
	}

	let sanitized: String = trimmed
		.chars()
		.filter(|c| !c.is_control() || *c == ' ')
		.take(MAX_ERROR_BODY_CHARS)
		.collect();
	if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
		Some(format!("{sanitized}..."))
	} else {
		Some(sanitized)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::TransportError;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	/// Answers every request with a fixed status and records what was sent.
	#[derive(Default)]
	struct StubTransport {
		status: u16,
		body: String,
		sends: AtomicUsize,
		body_reads: Arc<AtomicUsize>,
		requests: Mutex<Vec<TransportRequest>>,
	}

	impl StubTransport {
		fn new(status: u16, body: &str) -> Arc<Self> {
			Arc::new(Self {
				status,
				body: body.to_string(),
				..Default::default()
			})
		}

		fn sends(&self) -> usize {
			self.sends.load(Ordering::SeqCst)
		}

		fn body_reads(&self) -> usize {
			self.body_reads.load(Ordering::SeqCst)
		}

		fn last_request(&self) -> TransportRequest {
			self.requests.lock().unwrap().last().cloned().expect("no request sent")
		}
	}

	struct StubResponse {
		status: u16,
		body: String,
		reads: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl TransportResponse for StubResponse {
		fn status(&self) -> u16 {
			self.status
		}

		async fn text(&mut self) -> std::result::Result<String, TransportError> {
			self.reads.fetch_add(1, Ordering::SeqCst);
			Ok(std::mem::take(&mut self.body))
		}
	}

	#[async_trait]
	impl Transport for StubTransport {
		async fn send(
			&self,
			request: TransportRequest,
		) -> std::result::Result<Box<dyn TransportResponse>, TransportError> {
			self.sends.fetch_add(1, Ordering::SeqCst);
			self.requests.lock().unwrap().push(request);
			Ok(Box::new(StubResponse {
				status: self.status,
				body: self.body.clone(),
				reads: self.body_reads.clone(),
			}))
		}
	}

	fn client(transport: Arc<StubTransport>) -> EccClient {
		EccClient::with_transport(EccClientConfig::new("h", "300", "00", "u", "p"), transport)
	}

	const NON_SUCCESS: &[u16] = &[202, 204, 301, 400, 401, 403, 404, 409, 500, 502, 503];

	#[test]
	fn endpoint_url_joins_base_port_and_path() {
		assert_eq!(
			CREATE_USER.url("https://127.0.0.1", 9443),
			"https://127.0.0.1:9443/create_user"
		);
		assert_eq!(ABOUT.url("http://svc/", 9090), "http://svc:9090/about");
	}

	#[test]
	fn excerpt_truncates_and_drops_empty_bodies() {
		assert_eq!(excerpt("  \n"), None);
		assert_eq!(excerpt("bad request\n").as_deref(), Some("bad request"));

		let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
		let cut = excerpt(&long).unwrap();
		assert!(cut.ends_with("..."));
		assert_eq!(cut.len(), MAX_ERROR_BODY_CHARS + 3);
	}

	#[tokio::test]
	async fn get_version_returns_body_on_200() {
		let transport = StubTransport::new(200, "1.2.3");
		let version = client(transport.clone())
			.get_version(&CallContext::background(), "https://127.0.0.1", 9443)
			.await
			.unwrap();

		assert_eq!(version, "1.2.3");
		let request = transport.last_request();
		assert_eq!(request.method, Method::GET);
		assert_eq!(request.url, "https://127.0.0.1:9443/about");
		assert!(request.body.is_none());
	}

	#[tokio::test]
	async fn get_version_does_not_read_body_on_503() {
		let transport = StubTransport::new(503, "maintenance");
		let err = client(transport.clone())
			.get_version(&CallContext::background(), "https://127.0.0.1", 9443)
			.await
			.unwrap_err();

		assert!(matches!(err, EccError::UnexpectedStatus { status: 503, body: None }));
		assert_eq!(transport.body_reads(), 0);
	}

	#[tokio::test]
	async fn get_version_rejects_201() {
		let transport = StubTransport::new(201, "1.2.3");
		let err = client(transport)
			.get_version(&CallContext::background(), "https://h", 9443)
			.await
			.unwrap_err();
		assert_eq!(err.status(), Some(201));
	}

	#[tokio::test]
	async fn ping_and_lock_accept_only_200() {
		let ctx = CallContext::background();

		let ok = StubTransport::new(200, "");
		client(ok.clone()).ping(&ctx, "https://h", 9443).await.unwrap();
		client(ok.clone()).lock(&ctx, "https://h", 9443, "TESTUSER6").await.unwrap();
		assert_eq!(ok.sends(), 2);

		for &status in [201].iter().chain(NON_SUCCESS) {
			let transport = StubTransport::new(status, "");
			let ping = client(transport.clone()).ping(&ctx, "https://h", 9443).await;
			assert_eq!(ping.unwrap_err().status(), Some(status));

			let lock = client(transport).lock(&ctx, "https://h", 9443, "u").await;
			assert_eq!(lock.unwrap_err().status(), Some(status));
		}
	}

	#[tokio::test]
	async fn create_user_and_assign_groups_accept_200_and_201() {
		let ctx = CallContext::background();

		for status in [200, 201] {
			let transport = StubTransport::new(status, "");
			let c = client(transport.clone());
			c.create_user(&ctx, "https://h", 9443, NewUser::new("u1", "pw"))
				.await
				.unwrap();
			c.assign_user_groups(&ctx, "https://h", 9443, "u1", vec![RoleAssignment::new("G")])
				.await
				.unwrap();
			assert_eq!(transport.sends(), 2);
		}

		for &status in NON_SUCCESS {
			let transport = StubTransport::new(status, "");
			let c = client(transport);
			let create = c
				.create_user(&ctx, "https://h", 9443, NewUser::new("u1", "pw"))
				.await;
			assert_eq!(create.unwrap_err().status(), Some(status));

			let assign = c.assign_user_groups(&ctx, "https://h", 9443, "u1", vec![]).await;
			assert_eq!(assign.unwrap_err().status(), Some(status));
		}
	}

	#[tokio::test]
	async fn unexpected_status_captures_body_for_json_endpoints() {
		let transport = StubTransport::new(400, "user TESTUSER6 already locked");
		let err = client(transport.clone())
			.lock(&CallContext::background(), "https://h", 9443, "TESTUSER6")
			.await
			.unwrap_err();

		match err {
			EccError::UnexpectedStatus { status, body } => {
				assert_eq!(status, 400);
				assert_eq!(body.as_deref(), Some("user TESTUSER6 already locked"));
			}
			other => panic!("unexpected error: {other:?}"),
		}
		assert_eq!(transport.body_reads(), 1);
	}

	#[tokio::test]
	async fn success_bodies_are_ignored() {
		let transport = StubTransport::new(200, "{\"status\":\"ok\"}");
		client(transport.clone())
			.ping(&CallContext::background(), "https://h", 9443)
			.await
			.unwrap();
		assert_eq!(transport.body_reads(), 0);
	}

	#[tokio::test]
	async fn canceled_context_sends_nothing() {
		let transport = StubTransport::new(200, "1.2.3");
		let c = client(transport.clone());
		let ctx = CallContext::background();
		ctx.cancel();

		assert!(c.get_version(&ctx, "https://h", 9443).await.unwrap_err().is_canceled());
		assert!(c.ping(&ctx, "https://h", 9443).await.unwrap_err().is_canceled());
		assert!(c.lock(&ctx, "https://h", 9443, "u").await.unwrap_err().is_canceled());
		assert!(c
			.create_user(&ctx, "https://h", 9443, NewUser::new("u", "p"))
			.await
			.unwrap_err()
			.is_canceled());
		assert!(c
			.assign_user_groups(&ctx, "https://h", 9443, "u", vec![])
			.await
			.unwrap_err()
			.is_canceled());

		assert_eq!(transport.sends(), 0);
	}

	#[tokio::test]
	async fn every_body_embeds_configured_identity() {
		let transport = StubTransport::new(200, "");
		let c = client(transport.clone());
		let ctx = CallContext::background();

		c.ping(&ctx, "https://h", 9443).await.unwrap();
		c.lock(&ctx, "https://h", 9443, "u").await.unwrap();
		c.create_user(&ctx, "https://h", 9443, NewUser::new("u", "p"))
			.await
			.unwrap();
		c.assign_user_groups(&ctx, "https://h", 9443, "u", vec![])
			.await
			.unwrap();

		let expected = serde_json::json!({
			"host": "h",
			"systemNumber": "00",
			"client": "300",
			"jcoUser": "u",
			"jcoPassword": "p",
			"isTestingServer": true,
		});

		let requests = transport.requests.lock().unwrap();
		assert_eq!(requests.len(), 4);
		for (i, request) in requests.iter().enumerate() {
			let body: serde_json::Value =
				serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
			let identity = if i == 0 { &body } else { &body["server"] };
			assert_eq!(identity, &expected, "request {} to {}", i, request.url);
		}
	}

	#[test]
	fn debug_does_not_leak_password() {
		let c = client(StubTransport::new(200, ""));
		assert!(!format!("{c:?}").contains("\"p\""));
	}
}
