// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for backend passwords.
//!
//! ECC request bodies must carry passwords in clear text, so unlike a config
//! secret this type serializes its real value. What it guarantees is that the
//! value never shows up through `Debug`/`Display` (and therefore never in
//! `tracing` fields), and that the memory is zeroed on drop.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use zeroize::Zeroize;

/// The redaction placeholder used in all output.
pub const REDACTED: &str = "[REDACTED]";

/// JSON keys whose values are replaced by [`redact_json`].
const SENSITIVE_KEYS: &[&str] = &["password", "jcoPassword"];

/// A password that only leaves the process inside a request body.
#[derive(Zeroize, Default)]
#[zeroize(drop)]
pub struct SecretString {
	inner: String,
}

impl SecretString {
	pub fn new(inner: impl Into<String>) -> Self {
		Self {
			inner: inner.into(),
		}
	}

	/// Explicitly access the inner value.
	pub fn expose(&self) -> &str {
		&self.inner
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl Clone for SecretString {
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("SecretString").field(&REDACTED).finish()
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl Eq for SecretString {}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.inner)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretString::new)
	}
}

/// Returns a copy of `value` with every password field replaced by
/// [`REDACTED`], at any depth.
pub fn redact_json(value: &Value) -> Value {
	match value {
		Value::Object(map) => Value::Object(
			map
				.iter()
				.map(|(key, v)| {
					if SENSITIVE_KEYS.contains(&key.as_str()) {
						(key.clone(), Value::String(REDACTED.to_string()))
					} else {
						(key.clone(), redact_json(v))
					}
				})
				.collect(),
		),
		Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
		other => other.clone(),
	}
}
