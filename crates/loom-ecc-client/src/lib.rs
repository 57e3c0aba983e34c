// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning client for ECC user-management services.
//!
//! The service exposes five fixed endpoints (version, ping, lock, create
//! user, assign groups). Every JSON request embeds the [`ServerIdentity`] of
//! the backend system the service should act on, built from the client's
//! [`EccClientConfig`].
//!
//! Each call is a single exchange bound to a [`CallContext`]; there are no
//! retries. A failed call leaves the remote outcome unknown to the caller.
//!
//! # Example
//!
//! ```no_run
//! use loom_ecc_client::{CallContext, EccClient, EccClientConfig, NewUser, RoleAssignment};
//!
//! # async fn run() -> loom_ecc_client::Result<()> {
//! let client = EccClient::new(EccClientConfig::new("ecc.example.com", "300", "00", "RFC_USER", "secret"));
//! let ctx = CallContext::background();
//!
//! let version = client.get_version(&ctx, "https://127.0.0.1", 9443).await?;
//! client.ping(&ctx, "https://127.0.0.1", 9443).await?;
//! client
//! 	.create_user(&ctx, "https://127.0.0.1", 9443, NewUser::new("JDOE", "Init123!").with_license_type("91"))
//! 	.await?;
//! client
//! 	.assign_user_groups(&ctx, "https://127.0.0.1", 9443, "JDOE", vec![RoleAssignment::new("/IPRO/MANAGER")])
//! 	.await?;
//! # let _ = version;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod secret;
pub mod transport;
pub mod types;

pub use client::EccClient;
pub use config::{EccClientConfig, DEFAULT_HTTPS_PORT, DEFAULT_HTTP_PORT, DEFAULT_TIMEOUT};
pub use context::CallContext;
pub use error::{EccError, Result, TransportError};
pub use secret::{SecretString, REDACTED};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use types::{
	AssignGroupsRequest, CreateUserRequest, LockRequest, NewUser, RoleAssignment, ServerIdentity,
};
pub use tokio_util::sync::CancellationToken;
