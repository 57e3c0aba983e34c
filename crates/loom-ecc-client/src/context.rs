// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-call cancellation and deadline.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{EccError, Result};

/// Cancellation scope for a single provisioning call.
///
/// A context is done once its token is canceled or its deadline has passed.
/// Operations refuse to start on a done context and abort an in-flight
/// exchange as soon as the context becomes done.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
	token: CancellationToken,
	deadline: Option<Instant>,
}

impl CallContext {
	/// A context that is never canceled and has no deadline.
	pub fn background() -> Self {
		Self::default()
	}

	/// A context driven by an existing cancellation token.
	pub fn with_token(token: CancellationToken) -> Self {
		Self {
			token,
			deadline: None,
		}
	}

	/// Sets a deadline, keeping the earlier one if a deadline already exists.
	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(existing) => existing.min(deadline),
			None => deadline,
		});
		self
	}

	pub fn with_timeout(self, timeout: Duration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	pub fn token(&self) -> &CancellationToken {
		&self.token
	}

	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Cancels this context and every clone sharing its token.
	pub fn cancel(&self) {
		self.token.cancel();
	}

	pub fn is_done(&self) -> bool {
		self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
	}

	/// Resolves once the context is canceled or the deadline passes.
	pub async fn done(&self) {
		match self.deadline {
			Some(deadline) => {
				tokio::select! {
					_ = self.token.cancelled() => {}
					_ = tokio::time::sleep_until(deadline) => {}
				}
			}
			None => self.token.cancelled().await,
		}
	}

	/// Drives `fut` to completion unless the context finishes first.
	///
	/// `fut` is never polled when the context is already done.
	pub async fn run<F>(&self, fut: F) -> Result<F::Output>
	where
		F: Future,
	{
		if self.is_done() {
			return Err(EccError::RequestCanceled);
		}

		tokio::select! {
			biased;
			_ = self.done() => Err(EccError::RequestCanceled),
			output = fut => Ok(output),
		}
	}
}
