#![deny(warnings)]

//! Persistence gateway: one serialized snapshot under one named key.
//!
//! The store itself is an opaque collaborator behind [`SaveStore`]; the
//! shipped implementation keeps one JSON document per key in a local
//! directory. Decimals serialize as exact-precision strings, unknown
//! fields are ignored on read, and fields missing from older blobs
//! backfill to defaults, so saves stay forward- and backward-compatible.
//!
//! Read failures are not fatal anywhere in the game: callers that cannot
//! load fall back to a fresh default state via [`load_state_or_default`].

use academy_core::GameState;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Key the full game snapshot is stored under.
pub const SAVE_KEY: &str = "game_state";

/// Default save location relative to the working directory.
pub fn default_save_dir() -> &'static str {
    "./saves"
}

/// Errors at the persistence boundary.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Opaque load-blob / save-blob collaborator.
pub trait SaveStore: Send + Sync {
    /// Read the blob stored under `key`, `None` if nothing was ever saved.
    fn load(&self, key: &str) -> Result<Option<String>, PersistError>;
    /// Durably write `blob` under `key`, replacing any previous value.
    fn save(&self, key: &str, blob: &str) -> Result<(), PersistError>;
}

/// File-backed store: one `<key>.json` document per key under a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SaveStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash mid-write never clobbers the save.
        let target = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

/// In-memory store for tests and headless tooling.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), PersistError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// Encode a snapshot to its blob form.
pub fn encode_state(state: &GameState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(state)?)
}

/// Decode a snapshot blob. Missing fields backfill to defaults, unknown
/// fields are ignored.
pub fn decode_state(blob: &str) -> Result<GameState, PersistError> {
    Ok(serde_json::from_str(blob)?)
}

/// Encode and write the snapshot under [`SAVE_KEY`].
pub fn save_state(store: &dyn SaveStore, state: &GameState) -> Result<(), PersistError> {
    store.save(SAVE_KEY, &encode_state(state)?)
}

/// Load the snapshot under [`SAVE_KEY`], falling back to a fresh state
/// (online as of `now`) when nothing is stored or the blob is unreadable.
pub fn load_state_or_default(store: &dyn SaveStore, now: i64) -> GameState {
    match store.load(SAVE_KEY) {
        Ok(Some(blob)) => match decode_state(&blob) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "save blob unreadable, starting fresh");
                GameState::fresh(now)
            }
        },
        Ok(None) => GameState::fresh(now),
        Err(e) => {
            warn!(error = %e, "save store unavailable, starting fresh");
            GameState::fresh(now)
        }
    }
}
