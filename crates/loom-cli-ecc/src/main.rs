// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! loom-ecc - provision users on an ECC user-management service.

mod commands;
mod config;
mod error;
mod paths;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use loom_ecc_client::{CallContext, SecretString};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{parse_groups, parse_parameters, Session, UserSpec};
use config::ConfigLayer;

/// Provision users on an ECC user-management service
#[derive(Parser, Debug)]
#[command(name = "loom-ecc", version, about, long_about = None)]
struct Args {
	/// Path to configuration file (default: $XDG_CONFIG_HOME/loom/ecc.toml)
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Provisioning service base URL, e.g. https://127.0.0.1
	#[arg(long, global = true)]
	base_url: Option<String>,

	/// Provisioning service port
	#[arg(long, global = true)]
	port: Option<u16>,

	/// Backend application server host
	#[arg(long, global = true)]
	host: Option<String>,

	/// Backend client number
	#[arg(long, global = true)]
	client: Option<String>,

	/// Backend system number
	#[arg(long, global = true)]
	system_number: Option<String>,

	/// Backend technical user
	#[arg(long, global = true)]
	username: Option<String>,

	/// Overall request timeout in seconds
	#[arg(long, global = true)]
	timeout_secs: Option<u64>,

	/// Require a trusted TLS certificate chain
	#[arg(long, global = true)]
	verify_certs: bool,

	/// Give up on the whole command after this many seconds
	#[arg(long, global = true)]
	deadline_secs: Option<u64>,

	/// Log level when RUST_LOG is unset
	#[arg(short, long, global = true, default_value = "info")]
	log_level: String,

	/// Output logs as JSON
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
struct UserArgs {
	/// Username of the account to create
	#[arg(long = "user")]
	user: String,

	/// Initial password (or set LOOM_ECC_USER_PASSWORD)
	#[arg(long = "user-password", env = "LOOM_ECC_USER_PASSWORD", hide_env_values = true)]
	user_password: String,

	#[arg(long, default_value = "")]
	first_name: String,

	#[arg(long, default_value = "")]
	last_name: String,

	/// License type code, e.g. 91
	#[arg(long, default_value = "")]
	license_type: String,

	/// Extra attribute (repeatable: --param KEY=VALUE)
	#[arg(long = "param", value_name = "KEY=VALUE")]
	params: Vec<String>,
}

impl UserArgs {
	fn to_spec(&self) -> Result<UserSpec> {
		Ok(UserSpec {
			username: self.user.clone(),
			password: SecretString::new(self.user_password.clone()),
			first_name: self.first_name.clone(),
			last_name: self.last_name.clone(),
			license_type: self.license_type.clone(),
			parameters: parse_parameters(&self.params)?,
		})
	}
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show the provisioning service version
	Version,
	/// Check that the service can reach the backend system
	Ping,
	/// Create (or update) a user
	CreateUser(UserArgs),
	/// Assign groups to a user, in the given order
	AssignGroups {
		/// Username to assign groups to
		#[arg(long = "user")]
		user: String,
		/// Group (repeatable: --group NAME or --group NAME,MM/DD/YYYY,MM/DD/YYYY)
		#[arg(long = "group", value_name = "NAME[,FROM,TO]")]
		groups: Vec<String>,
	},
	/// Lock a user
	Lock {
		/// Username to lock
		#[arg(long = "user")]
		user: String,
	},
	/// Run version, ping, create user, assign groups and lock in sequence
	Demo {
		#[command(flatten)]
		user: UserArgs,
		/// Group (repeatable: --group NAME or --group NAME,MM/DD/YYYY,MM/DD/YYYY)
		#[arg(long = "group", value_name = "NAME[,FROM,TO]")]
		groups: Vec<String>,
	},
}

impl From<&Args> for ConfigLayer {
	fn from(args: &Args) -> Self {
		let mut layer = ConfigLayer::default();
		if args.host.is_some()
			|| args.client.is_some()
			|| args.system_number.is_some()
			|| args.username.is_some()
		{
			let server = layer.server_mut();
			server.host = args.host.clone();
			server.client_id = args.client.clone();
			server.system_number = args.system_number.clone();
			server.username = args.username.clone();
		}
		if args.base_url.is_some() || args.port.is_some() {
			let service = layer.service_mut();
			service.base_url = args.base_url.clone();
			service.port = args.port;
		}
		if args.timeout_secs.is_some() || args.verify_certs {
			let transport = layer.transport_mut();
			transport.timeout_secs = args.timeout_secs;
			if args.verify_certs {
				transport.allow_untrusted_certificates = Some(false);
			}
		}
		layer
	}
}

fn init_tracing(level: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("loom={level}")));

	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().compact().with_writer(std::io::stderr))
			.init();
	}
}

/// Context canceled by Ctrl-C and, optionally, by a deadline.
fn call_context(deadline_secs: Option<u64>) -> CallContext {
	let mut ctx = CallContext::background();
	if let Some(secs) = deadline_secs {
		ctx = ctx.with_timeout(Duration::from_secs(secs));
	}

	let canceller = ctx.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!("interrupted, canceling in-flight request");
			canceller.cancel();
		}
	});

	ctx
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(&args.log_level, args.json_logs);

	let resolved = config::load_config(args.config.clone(), ConfigLayer::from(&args))
		.context("failed to load configuration")?;
	debug!(
		base_url = %resolved.base_url,
		port = resolved.port,
		host = %resolved.client.host,
		"resolved configuration"
	);
	if resolved.client.allow_untrusted_certificates {
		warn!("TLS certificate verification is disabled; pass --verify-certs to require a trusted chain");
	}

	let session = Session::new(resolved);
	let ctx = call_context(args.deadline_secs);

	match &args.command {
		Command::Version => session.version(&ctx).await,
		Command::Ping => session.ping(&ctx).await,
		Command::CreateUser(user) => session.create_user(&ctx, &user.to_spec()?).await,
		Command::AssignGroups { user, groups } => {
			session
				.assign_groups(&ctx, user, parse_groups(groups)?)
				.await
		}
		Command::Lock { user } => session.lock(&ctx, user).await,
		Command::Demo { user, groups } => {
			session
				.demo(&ctx, &user.to_spec()?, parse_groups(groups)?)
				.await
		}
	}
}
