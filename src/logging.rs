// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tracing setup: rotating JSON log files per project plus an optional
//! console layer.

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::Layer, prelude::*, registry::Registry, EnvFilter};

/// Initialize logging for the serving process with file rotation.
pub fn init_logging(base_dir: PathBuf, debug_mode: bool) -> Result<(), anyhow::Error> {
	// Create a unique log directory based on project path
	let project_hash = {
		let mut hasher = Sha256::new();
		hasher.update(base_dir.to_string_lossy().as_bytes());
		format!("{:x}", hasher.finalize())[..12].to_string()
	};

	let project_name = base_dir
		.file_name()
		.and_then(|n| n.to_str())
		.unwrap_or("unknown");

	// Ensure .codelore/logs/project_name_hash directory exists
	let log_dir_name = format!("{}_{}", project_name, project_hash);
	let log_dir = base_dir.join(".codelore").join("logs").join(log_dir_name);
	std::fs::create_dir_all(&log_dir)?;

	// Cross-platform way to create a "latest" indicator
	let latest_file = base_dir.join(".codelore").join("logs").join("latest.txt");
	std::fs::write(&latest_file, log_dir.to_string_lossy().as_bytes()).unwrap_or_else(|e| {
		eprintln!("Warning: Could not create latest log indicator: {}", e);
	});

	let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "codelore.log");

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if debug_mode {
			EnvFilter::new("debug")
		} else {
			EnvFilter::new("info")
		}
	});

	// File layer with JSON formatting for structured logs
	let file_layer = Layer::new()
		.with_writer(file_appender)
		.with_ansi(false)
		.with_target(true)
		.with_file(true)
		.with_line_number(true)
		.json();

	// Console layer for interactive runs
	let console_layer = Layer::new()
		.with_writer(std::io::stderr)
		.with_ansi(true)
		.with_target(false);

	Registry::default()
		.with(env_filter)
		.with(file_layer)
		.with(console_layer)
		.init();

	info!(
		project_name = project_name,
		log_directory = %log_dir.display(),
		debug_mode = debug_mode,
		"logging initialized"
	);

	Ok(())
}

/// Console-only logging for one-shot commands.
pub fn init_console(debug_mode: bool) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if debug_mode {
			EnvFilter::new("debug")
		} else {
			EnvFilter::new("warn")
		}
	});

	let _ = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();
}
