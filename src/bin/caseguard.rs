use anyhow::Result;
use caseguard::cli::{actions, actions::Action, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    match action {
        Action::Provision { .. } => actions::provision::handle(action, &globals).await?,
        Action::Verify { .. } => actions::verify::handle(action, &globals).await?,
    }

    Ok(())
}
