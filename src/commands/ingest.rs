use clap::Args;
use std::path::PathBuf;

use codelore::indexer;
use codelore::logging;
use codelore::state::{create_ingest_state, AppState};

#[derive(Args, Debug)]
pub struct IngestArgs {
	/// Directory containing the legacy C# sources
	#[arg(default_value = ".")]
	pub path: PathBuf,

	/// Verbose logging while ingesting
	#[arg(long, short)]
	pub verbose: bool,
}

pub async fn execute(state: &AppState, args: &IngestArgs) -> Result<(), anyhow::Error> {
	logging::init_console(args.verbose);

	if !args.path.is_dir() {
		return Err(anyhow::anyhow!(
			"{} is not a directory",
			args.path.display()
		));
	}

	println!("Ingesting legacy sources from: {}", args.path.display());

	let progress = create_ingest_state();
	let report = indexer::ingest_directory(state, &progress, &args.path).await?;

	if report.files == 0 {
		println!("No .cs files found under {}", args.path.display());
		return Ok(());
	}

	println!(
		"Ingested {} files: {} namespaces, {} classes, {} methods, {} vector chunks",
		report.files, report.namespaces, report.classes, report.methods, report.chunks
	);
	Ok(())
}
