// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand implementations. Narration goes to stdout; diagnostics go
//! through `tracing`.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use loom_ecc_client::{CallContext, EccClient, NewUser, RoleAssignment, SecretString};
use tracing::info;

use crate::config::ResolvedConfig;

/// Everything needed to create a user from the command line.
#[derive(Debug, Clone)]
pub struct UserSpec {
	pub username: String,
	pub password: SecretString,
	pub first_name: String,
	pub last_name: String,
	pub license_type: String,
	pub parameters: HashMap<String, String>,
}

impl UserSpec {
	fn to_new_user(&self) -> NewUser {
		NewUser {
			username: self.username.clone(),
			password: self.password.clone(),
			first_name: self.first_name.clone(),
			last_name: self.last_name.clone(),
			license_type: self.license_type.clone(),
			parameters: self.parameters.clone(),
		}
	}
}

/// Target service plus a client bound to the configured backend.
pub struct Session {
	client: EccClient,
	base_url: String,
	port: u16,
}

impl Session {
	pub fn new(config: ResolvedConfig) -> Self {
		Self {
			client: EccClient::new(config.client),
			base_url: config.base_url,
			port: config.port,
		}
	}

	pub async fn version(&self, ctx: &CallContext) -> Result<()> {
		let version = self
			.client
			.get_version(ctx, &self.base_url, self.port)
			.await
			.context("Unable to connect with the ECC provisioning service")?;
		println!("The version is {version}");
		Ok(())
	}

	pub async fn ping(&self, ctx: &CallContext) -> Result<()> {
		self
			.client
			.ping(ctx, &self.base_url, self.port)
			.await
			.context("Unable to ping the ECC provisioning service")?;
		println!("Server is OK");
		Ok(())
	}

	pub async fn create_user(&self, ctx: &CallContext, user: &UserSpec) -> Result<()> {
		self
			.client
			.create_user(ctx, &self.base_url, self.port, user.to_new_user())
			.await
			.with_context(|| format!("Unable to create user {}", user.username))?;
		println!("Create user {} is OK", user.username);
		Ok(())
	}

	pub async fn assign_groups(
		&self,
		ctx: &CallContext,
		username: &str,
		groups: Vec<RoleAssignment>,
	) -> Result<()> {
		self
			.client
			.assign_user_groups(ctx, &self.base_url, self.port, username, groups)
			.await
			.with_context(|| format!("Unable to assign user groups for {username}"))?;
		println!("Assign user groups for {username} is OK");
		Ok(())
	}

	pub async fn lock(&self, ctx: &CallContext, username: &str) -> Result<()> {
		self
			.client
			.lock(ctx, &self.base_url, self.port, username)
			.await
			.with_context(|| format!("Unable to lock user {username}"))?;
		println!("Lock user {username} is OK");
		Ok(())
	}

	/// Runs the full provisioning sequence against one service, stopping at
	/// the first failure: version, ping, create user, assign groups, lock.
	pub async fn demo(
		&self,
		ctx: &CallContext,
		user: &UserSpec,
		groups: Vec<RoleAssignment>,
	) -> Result<()> {
		info!(base_url = %self.base_url, port = self.port, "starting provisioning sequence");

		println!("Now check if the server is up");
		self.version(ctx).await?;

		println!("Now ping the server");
		self.ping(ctx).await?;

		println!("Now create user {}", user.username);
		self.create_user(ctx, user).await?;

		println!("Now assign groups for user {}", user.username);
		self.assign_groups(ctx, &user.username, groups).await?;

		println!("Now lock user {}", user.username);
		self.lock(ctx, &user.username).await?;

		info!(username = %user.username, "provisioning sequence finished");
		Ok(())
	}
}

/// Parses `KEY=VALUE` pairs into a parameter map. Later keys win.
pub fn parse_parameters(pairs: &[String]) -> Result<HashMap<String, String>> {
	let mut parameters = HashMap::new();
	for pair in pairs {
		let Some((key, value)) = pair.split_once('=') else {
			bail!("invalid parameter '{pair}', expected KEY=VALUE");
		};
		if key.is_empty() {
			bail!("invalid parameter '{pair}', key is empty");
		}
		parameters.insert(key.to_string(), value.to_string());
	}
	Ok(parameters)
}

/// Parses `NAME[,FROM,TO]` group specs. Dates are passed through unchecked.
pub fn parse_groups(specs: &[String]) -> Result<Vec<RoleAssignment>> {
	specs
		.iter()
		.map(|spec| {
			let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
			match parts.as_slice() {
				[name] if !name.is_empty() => Ok(RoleAssignment::new(*name)),
				[name, from, to] if !name.is_empty() => {
					Ok(RoleAssignment::new(*name).valid_between(*from, *to))
				}
				_ => bail!("invalid group '{spec}', expected NAME or NAME,FROM,TO"),
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn strings(items: &[&str]) -> Vec<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn parameters_split_on_first_equals() {
		let params = parse_parameters(&strings(&["/BA1/F4_EXCH=Test", "EXPR=a=b"])).unwrap();
		assert_eq!(params["/BA1/F4_EXCH"], "Test");
		assert_eq!(params["EXPR"], "a=b");
	}

	#[test]
	fn parameters_require_key_and_equals() {
		assert!(parse_parameters(&strings(&["NOVALUE"])).is_err());
		assert!(parse_parameters(&strings(&["=x"])).is_err());
	}

	#[test]
	fn groups_accept_name_or_name_with_dates() {
		let groups = parse_groups(&strings(&[
			"/IPRO/MANAGER",
			"SAP_ALL, 01/01/2025, 12/31/2025",
		]))
		.unwrap();

		assert_eq!(groups[0], RoleAssignment::new("/IPRO/MANAGER"));
		assert_eq!(
			groups[1],
			RoleAssignment::new("SAP_ALL").valid_between("01/01/2025", "12/31/2025")
		);
	}

	#[test]
	fn groups_reject_partial_dates() {
		assert!(parse_groups(&strings(&["G,01/01/2025"])).is_err());
		assert!(parse_groups(&strings(&[""])).is_err());
	}

	#[test]
	fn user_spec_converts_verbatim() {
		let spec = UserSpec {
			username: "TESTUSER6".to_string(),
			password: SecretString::new("Veza123!"),
			first_name: "FirstnameSix".to_string(),
			last_name: "John".to_string(),
			license_type: "91".to_string(),
			parameters: HashMap::from([("/SPE/IF_QUEUE_LOG".to_string(), "S".to_string())]),
		};
		let user = spec.to_new_user();
		assert_eq!(user.username, "TESTUSER6");
		assert_eq!(user.password.expose(), "Veza123!");
		assert_eq!(user.license_type, "91");
		assert_eq!(user.parameters.len(), 1);
	}
}
