use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;

use crate::auth::MasterConfig;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub data_dir: PathBuf,
    pub master: MasterConfig,
}

pub fn from_matches(matches: &clap::ArgMatches) -> Result<GlobalArgs> {
    let data_dir = matches
        .get_one::<String>("data-dir")
        .map_or_else(|| PathBuf::from("."), PathBuf::from);

    let mut master = MasterConfig::new();
    if let (Some(username), Some(password)) = (
        matches.get_one::<String>("admin-user"),
        matches.get_one::<String>("admin-password"),
    ) {
        master = master.with_admin(username.clone(), SecretString::from(password.clone()));
    }
    if let (Some(username), Some(password)) = (
        matches.get_one::<String>("operator-user"),
        matches.get_one::<String>("operator-password"),
    ) {
        master = master.with_operator(username.clone(), SecretString::from(password.clone()));
    }

    Ok(GlobalArgs { data_dir, master })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn break_glass_credentials_from_flags() -> Result<()> {
        let matches = commands::new().try_get_matches_from([
            "caseguard",
            "--admin-user",
            "MasterAdmin",
            "--admin-password",
            "admin-pw",
            "verify",
            "alice",
            "-p",
            "pw",
        ])?;
        let globals = from_matches(&matches)?;
        assert!(globals.master.matches("MasterAdmin", "admin-pw"));
        assert!(!globals.master.matches("MasterAdmin", "wrong"));
        Ok(())
    }

    #[test]
    fn data_dir_from_env() -> Result<()> {
        temp_env::with_var("CASEGUARD_DATA_DIR", Some("/tmp/caseguard"), || {
            let matches = commands::new()
                .try_get_matches_from(["caseguard", "verify", "alice", "-p", "pw"])?;
            let globals = from_matches(&matches)?;
            assert_eq!(globals.data_dir, PathBuf::from("/tmp/caseguard"));
            Ok(())
        })
    }
}
