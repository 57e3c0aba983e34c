// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Loom.
//!
//! This crate provides a pre-configured HTTP client builder with a consistent
//! User-Agent header, and a helper that applies per-service timeout and TLS
//! verification settings on top of it.

mod client;

pub use client::{
	build_client, builder, builder_with_user_agent, user_agent, ClientSettings,
};
