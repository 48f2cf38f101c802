//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use pastectl_server::{create_app, AppState, Config, RedbStore};
use std::path::Path;
use tempfile::TempDir;

pub(crate) fn test_config_for_db_path(db_path: &Path) -> Config {
    Config {
        port: 0,
        db_path: db_path.to_str().expect("db path").to_string(),
        max_paste_size: 10_000_000,
        frontend_url: None,
        sweep_interval_secs: 3600,
    }
}

pub(crate) fn test_state_for_config(config: Config) -> AppState {
    let store = RedbStore::open(config.db_path.as_str()).expect("open store");
    AppState::new(config, store)
}

pub(crate) fn test_server_for_state(state: AppState) -> TestServer {
    TestServer::new(create_app(state)).expect("server")
}

/// Server on a real loopback listener; WebSocket upgrades need one.
pub(crate) fn live_server_for_state(state: AppState) -> TestServer {
    TestServer::builder()
        .http_transport()
        .build(create_app(state))
        .expect("http transport server")
}

pub(crate) fn setup_test_server() -> (TestServer, AppState, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_db_path(&temp_dir.path().join("db"));
    let state = test_state_for_config(config);
    let server = test_server_for_state(state.clone());
    (server, state, temp_dir)
}
