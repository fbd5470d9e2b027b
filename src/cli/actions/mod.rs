use secrecy::SecretString;
use std::sync::Arc;

use crate::auth::clock::SystemClock;
use crate::auth::crypto::OsCrypto;
use crate::auth::repository::JsonFileRepository;
use crate::auth::state::JsonStateStore;
use crate::auth::{AuthEngine, EngineConfig};
use crate::cli::globals::GlobalArgs;

pub mod provision;
pub mod verify;

#[derive(Debug)]
pub enum Action {
    Provision {
        username: String,
        password: SecretString,
        full_name: Option<String>,
    },
    Verify {
        username: String,
        password: SecretString,
    },
}

/// Wire the engine to the JSON stores in the data directory.
pub(crate) fn build_engine(globals: &GlobalArgs) -> AuthEngine {
    let repository = Arc::new(JsonFileRepository::new(globals.data_dir.join("accounts.json")));
    let state_store = Arc::new(JsonStateStore::new(globals.data_dir.join("state.json")));
    AuthEngine::new(
        repository,
        state_store,
        Arc::new(OsCrypto),
        Arc::new(SystemClock),
        EngineConfig::new().with_master(globals.master.clone()),
    )
}
