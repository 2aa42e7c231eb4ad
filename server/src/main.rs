use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use backplate::AppBuilder;
use backplate::error::BpResult;
use backplate::logging;
use backplate::settings::{self, AppConfig, ProcessEnv};
use backplate_store_adapter_sqlite::StoreAdapterSqlite;

#[derive(Parser, Debug)]
#[command(name = "backplate", version, about = "Backplate API server")]
struct Args {
	/// Settings file (TOML)
	#[arg(short, long, value_name = "FILE", default_value = "config/settings.toml")]
	config: PathBuf,
	/// Listen address, overriding the `listen` setting
	#[arg(short, long)]
	listen: Option<String>,
}

async fn run(args: Args) -> BpResult<()> {
	let settings = settings::load_from_process_env(&args.config).await?;
	let config = AppConfig::from_settings(&settings)?;
	logging::init_from_config(&config, &ProcessEnv::new())?;

	let users = Arc::new(StoreAdapterSqlite::connect(&config.database_url).await?);

	let mut builder = AppBuilder::new(config);
	builder.user_adapter(users);
	if let Some(listen) = args.listen {
		builder.listen(listen);
	}
	builder.run().await
}

#[tokio::main]
async fn main() -> ExitCode {
	match run(Args::parse()).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("FATAL: {}", err);
			eprintln!("backplate: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
