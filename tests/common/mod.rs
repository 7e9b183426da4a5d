use chatty::storage::ConversationStore;
use chatty::ChattyError;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_store() -> (ConversationStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("history.db");
    let store = ConversationStore::open(db_path.to_str().expect("utf-8 path"))
        .expect("failed to open conversation store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn db_path_in(dir: &TempDir) -> PathBuf {
    dir.path().join("nested").join("chatty.db")
}

#[allow(dead_code)]
pub fn error_of(err: &anyhow::Error) -> &ChattyError {
    err.downcast_ref::<ChattyError>()
        .unwrap_or_else(|| panic!("expected ChattyError, got {:#}", err))
}
