use anyhow::Result;
use secrecy::ExposeSecret;
use tracing::info;

use crate::cli::actions::{build_engine, Action};
use crate::cli::globals::GlobalArgs;

/// Handle the verify action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    if let Action::Verify { username, password } = action {
        let engine = build_engine(globals);
        let result = engine.verify(&username, password.expose_secret()).await?;
        info!(
            username = %result.username,
            role = %result.role,
            is_master = result.is_master,
            "verification succeeded"
        );
        println!(
            "ok: {} ({}) role={}{}",
            result.username,
            result.full_name,
            result.role,
            if result.is_master { " [master]" } else { "" }
        );
    }

    Ok(())
}
