use clap::Args;
use std::net::SocketAddr;

use codelore::logging;
use codelore::server;
use codelore::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	pub bind: String,

	/// Port to listen on
	#[arg(long, short, default_value = "8000")]
	pub port: u16,

	/// Verbose console logging
	#[arg(long)]
	pub debug: bool,
}

pub async fn execute(state: AppState, args: &ServeArgs) -> Result<(), anyhow::Error> {
	logging::init_logging(std::env::current_dir()?, args.debug)?;

	let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
	server::serve(state, addr).await
}
