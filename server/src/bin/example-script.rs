//! Example batch script: opens the store and commits an empty batch.
//!
//! ```text
//! example-script -c config/settings.toml
//! ```

use std::process::ExitCode;

use async_trait::async_trait;
use tracing::info;

use backplate::error::BpResult;
use backplate::script::{Script, ScriptContext, run_script};
use backplate::store_adapter::{CrudAdapter, ListOptions};
use backplate::user::User;
use backplate_store_adapter_sqlite::StoreAdapterSqlite;

struct Example;

#[async_trait]
impl Script for Example {
	fn name(&self) -> &str {
		"example-script"
	}

	async fn run(&self, ctx: &ScriptContext) -> BpResult<()> {
		let store = StoreAdapterSqlite::connect(&ctx.config.database_url).await?;
		let users = CrudAdapter::<User>::list(&store, &ListOptions::default()).await?;
		info!("store holds {} active users; nothing to do", users.len());
		Ok(())
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	run_script(Example).await
}

// vim: ts=4
