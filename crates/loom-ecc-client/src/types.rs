// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the ECC provisioning service.
//!
//! Every request embeds a [`ServerIdentity`] describing the backend system the
//! service should act on. Requests are built fresh per call and dropped once
//! the call returns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::secret::SecretString;

/// Connection descriptor of the backend-of-record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerIdentity {
	pub host: String,
	pub system_number: String,
	#[serde(rename = "client")]
	pub client_id: String,
	pub jco_user: String,
	pub jco_password: SecretString,
	pub is_testing_server: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRequest {
	pub server: ServerIdentity,
	pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
	pub server: ServerIdentity,
	pub username: String,
	pub password: SecretString,
	#[serde(rename = "firstname")]
	pub first_name: String,
	#[serde(rename = "lastname")]
	pub last_name: String,
	pub license_type: String,
	pub parameters: HashMap<String, String>,
}

/// A time-bounded grant of a group (activity group / role) to a user.
///
/// Dates are opaque `MM/DD/YYYY` strings; they are not checked locally and a
/// malformed date is only rejected by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
	#[serde(rename = "group")]
	pub group_name: String,
	#[serde(default)]
	pub from_date: String,
	#[serde(default)]
	pub to_date: String,
}

impl RoleAssignment {
	/// An assignment with no explicit validity window.
	pub fn new(group_name: impl Into<String>) -> Self {
		Self {
			group_name: group_name.into(),
			..Default::default()
		}
	}

	pub fn valid_between(mut self, from_date: impl Into<String>, to_date: impl Into<String>) -> Self {
		self.from_date = from_date.into();
		self.to_date = to_date.into();
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignGroupsRequest {
	pub server: ServerIdentity,
	pub username: String,
	/// Order is preserved; an empty list is sent as `[]`.
	pub user_groups: Vec<RoleAssignment>,
}

/// Caller-facing description of an account to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
	pub username: String,
	pub password: SecretString,
	pub first_name: String,
	pub last_name: String,
	pub license_type: String,
	/// Extra attributes forwarded as-is.
	pub parameters: HashMap<String, String>,
}

impl NewUser {
	pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
			..Default::default()
		}
	}

	pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
		self.first_name = first_name.into();
		self.last_name = last_name.into();
		self
	}

	pub fn with_license_type(mut self, license_type: impl Into<String>) -> Self {
		self.license_type = license_type.into();
		self
	}

	pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.parameters.insert(key.into(), value.into());
		self
	}

	pub(crate) fn into_request(self, server: ServerIdentity) -> CreateUserRequest {
		CreateUserRequest {
			server,
			username: self.username,
			password: self.password,
			first_name: self.first_name,
			last_name: self.last_name,
			license_type: self.license_type,
			parameters: self.parameters,
		}
	}
}
