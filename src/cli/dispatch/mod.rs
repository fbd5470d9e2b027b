use anyhow::{anyhow, Result};
use secrecy::SecretString;

use crate::cli::actions::Action;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("provision", sub)) => Ok(Action::Provision {
            username: required(sub, "username")?,
            password: SecretString::from(required(sub, "password")?),
            full_name: sub.get_one::<String>("full-name").cloned(),
        }),
        Some(("verify", sub)) => Ok(Action::Verify {
            username: required(sub, "username")?,
            password: SecretString::from(required(sub, "password")?),
        }),
        _ => Err(anyhow!("missing subcommand")),
    }
}

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("missing required argument: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn dispatches_verify() -> Result<()> {
        let matches = commands::new()
            .try_get_matches_from(["caseguard", "verify", "alice", "-p", "pw"])?;
        let action = handler(&matches)?;
        match action {
            Action::Verify { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password.expose_secret(), "pw");
            }
            Action::Provision { .. } => panic!("expected verify action"),
        }
        Ok(())
    }

    #[test]
    fn dispatches_provision_with_full_name() -> Result<()> {
        let matches = commands::new().try_get_matches_from([
            "caseguard",
            "provision",
            "alice",
            "-p",
            "pw",
            "--full-name",
            "Alice A",
        ])?;
        let action = handler(&matches)?;
        match action {
            Action::Provision {
                username,
                full_name,
                ..
            } => {
                assert_eq!(username, "alice");
                assert_eq!(full_name.as_deref(), Some("Alice A"));
            }
            Action::Verify { .. } => panic!("expected provision action"),
        }
        Ok(())
    }
}
