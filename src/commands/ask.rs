use clap::Args;

use codelore::logging;
use codelore::search::QueryPipeline;
use codelore::server::error_answer;
use codelore::state::AppState;

#[derive(Args, Debug)]
pub struct AskArgs {
	/// Question about the ingested codebase
	pub question: String,

	/// Output in JSON format
	#[arg(long)]
	pub json: bool,

	/// Verbose logging while answering
	#[arg(long, short)]
	pub verbose: bool,
}

pub async fn execute(state: &AppState, args: &AskArgs) -> Result<(), anyhow::Error> {
	logging::init_console(args.verbose);

	let pipeline = QueryPipeline::from_state(state);
	let answer = match pipeline.answer(&args.question).await {
		Ok(answer) => answer,
		Err(e) => error_answer(&e.to_string()),
	};

	if args.json {
		println!("{}", serde_json::json!({ "answer": answer }));
	} else {
		println!("{}", answer);
	}
	Ok(())
}
