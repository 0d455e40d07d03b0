mod config;
pub mod database;
mod memory;
pub mod store;

pub use config::{Config, NotificationsConfig, StorageConfig, TimingConfig};
pub use database::Database;
pub use memory::MemoryKv;
pub use store::{DurableStore, SessionRecord, SESSION_KEY, SETTINGS_KEY, STATS_KEY};

use std::path::PathBuf;

use crate::error::StoreError;

/// String key-value persistence scoped to one installation.
///
/// Each call is atomic with respect to its own key. An absent key reads as
/// `Ok(None)`.
pub trait KeyValue: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Returns the data directory, creating it if needed.
///
/// `TASKLITE_DATA_DIR` wins when set. Otherwise `~/.config/tasklite`, or
/// `~/.config/tasklite-dev` when `TASKLITE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("TASKLITE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TASKLITE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tasklite-dev")
            } else {
                base_dir.join("tasklite")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
