// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant config path resolution.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Resolve the user config file: `$XDG_CONFIG_HOME/loom/ecc.toml`, falling
/// back to `~/.config/loom/ecc.toml`.
pub fn user_config_file() -> Result<PathBuf, ConfigError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
		Some(dir) if !dir.is_empty() => PathBuf::from(dir),
		_ => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};

	let path = config_home.join("loom/ecc.toml");
	tracing::debug!(path = %path.display(), "resolved user config path");
	Ok(path)
}
