use anyhow::Result;
use secrecy::ExposeSecret;
use tracing::info;

use crate::cli::actions::{build_engine, Action};
use crate::cli::globals::GlobalArgs;

/// Handle the provision action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    if let Action::Provision {
        username,
        password,
        full_name,
    } = action
    {
        let engine = build_engine(globals);
        let account = engine
            .provision(&username, password.expose_secret(), full_name.as_deref())
            .await?;
        info!(
            username = %account.username,
            method = ?account.hash_method,
            "account provisioned"
        );
        println!("provisioned '{}' ({})", account.username, account.full_name);
    }

    Ok(())
}
