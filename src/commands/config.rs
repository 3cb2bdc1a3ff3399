use anyhow::Result;
use clap::Args;
use codelore::config::Config;

#[derive(Args)]
pub struct ConfigArgs {
	/// Set the model used for Cypher synthesis and refinement
	#[arg(long)]
	pub synthesis_model: Option<String>,

	/// Set the model used for final answer composition
	#[arg(long)]
	pub answer_model: Option<String>,

	/// Set the embedding model
	#[arg(long)]
	pub embedding_model: Option<String>,

	/// Set the chunk size for method code chunking
	#[arg(long)]
	pub chunk_size: Option<usize>,

	/// Set the chunk overlap for method code chunking
	#[arg(long)]
	pub chunk_overlap: Option<usize>,

	/// Set the number of vector documents retrieved per question
	#[arg(long)]
	pub vector_k: Option<usize>,

	/// Enable or disable graph query refinement
	#[arg(long)]
	pub refinement: Option<bool>,

	/// Show current configuration
	#[arg(long)]
	pub show: bool,

	/// Reset configuration to defaults
	#[arg(long)]
	pub reset: bool,
}

pub fn execute(args: &ConfigArgs, mut config: Config) -> Result<()> {
	if args.reset {
		config = Config::default();
		config.save()?;
		println!("Configuration reset to defaults");
		return Ok(());
	}

	if args.show {
		println!("Current configuration:");
		println!("Ollama base URL: {}", config.ollama.base_url);
		println!("Synthesis model: {}", config.ollama.synthesis_model);
		println!("Answer model: {}", config.ollama.answer_model);
		println!("Embedding model: {}", config.ollama.embedding_model);
		println!("Neo4j base URL: {}", config.neo4j.base_url);
		println!("Chroma base URL: {}", config.chroma.base_url);
		println!("Chroma collection: {}", config.chroma.collection);
		println!("Chunk size: {}", config.index.chunk_size);
		println!("Chunk overlap: {}", config.index.chunk_overlap);
		println!("Vector k: {}", config.search.vector_k);
		println!("Refinement: {}", config.search.refinement);
		return Ok(());
	}

	let mut updated = false;

	if let Some(model) = &args.synthesis_model {
		config.ollama.synthesis_model = model.clone();
		updated = true;
	}
	if let Some(model) = &args.answer_model {
		config.ollama.answer_model = model.clone();
		updated = true;
	}
	if let Some(model) = &args.embedding_model {
		config.ollama.embedding_model = model.clone();
		updated = true;
	}
	if let Some(chunk_size) = args.chunk_size {
		config.index.chunk_size = chunk_size;
		updated = true;
	}
	if let Some(chunk_overlap) = args.chunk_overlap {
		config.index.chunk_overlap = chunk_overlap;
		updated = true;
	}
	if let Some(vector_k) = args.vector_k {
		config.search.vector_k = vector_k;
		updated = true;
	}
	if let Some(refinement) = args.refinement {
		config.search.refinement = refinement;
		updated = true;
	}

	if updated {
		config.save()?;
		println!("Configuration updated");
	} else {
		println!("Nothing to update. Use --show to inspect the current configuration.");
	}
	Ok(())
}
