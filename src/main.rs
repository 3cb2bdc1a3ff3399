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

// Codelore - Legacy Codebase Question Answering

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use codelore::config::Config;
use codelore::state::AppState;

mod commands;

#[derive(Parser)]
#[command(name = "codelore")]
#[command(version = "0.1.0")]
#[command(about = "Codelore answers questions about legacy C# codebases")]
struct CodeloreArgs {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Ingest a legacy source tree into the code graph and vector index
	Ingest(commands::IngestArgs),

	/// Start the HTTP query endpoint
	Serve(commands::ServeArgs),

	/// Ask a single question from the command line
	Ask(commands::AskArgs),

	/// Show or update the configuration file
	Config(commands::ConfigArgs),

	/// Generate shell completion scripts
	Completion {
		/// The shell to generate completion for
		#[arg(value_enum)]
		shell: Shell,
	},
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
	let args = CodeloreArgs::parse();

	// Load configuration - ensure .codelore directory exists
	let config = Config::load()?;

	// Handle the config command separately (doesn't need backends)
	if let Commands::Config(config_args) = &args.command {
		return commands::config::execute(config_args, config);
	}

	// Handle the Completion command separately (doesn't need backends)
	if let Commands::Completion { shell } = &args.command {
		let mut app = CodeloreArgs::command();
		let name = app.get_name().to_string();
		generate(*shell, &mut app, name, &mut std::io::stdout());
		return Ok(());
	}

	// Initialize the process-wide backend handles
	let state = AppState::initialize(config)?;

	match &args.command {
		Commands::Ingest(ingest_args) => commands::ingest::execute(&state, ingest_args).await?,
		Commands::Serve(serve_args) => commands::serve::execute(state.clone(), serve_args).await?,
		Commands::Ask(ask_args) => commands::ask::execute(&state, ask_args).await?,
		Commands::Config(_) => unreachable!(),     // Already handled above
		Commands::Completion { .. } => unreachable!(), // Already handled above
	}

	Ok(())
}
