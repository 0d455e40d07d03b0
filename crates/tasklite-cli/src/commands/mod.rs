pub mod config;
pub mod run;
pub mod settings;
pub mod stats;
pub mod timer;

use tasklite_core::storage::{data_dir, database::DB_FILENAME};
use tasklite_core::{Config, Database, DurableStore, SystemClock, TimerEngine};

/// Open the durable store named by `config`.
pub fn open_store(config: &Config) -> Result<DurableStore, Box<dyn std::error::Error>> {
    let path = match &config.storage.database_path {
        Some(path) => path.clone(),
        None => data_dir()?.join(DB_FILENAME),
    };
    let db = Database::open_at(&path)?;
    Ok(DurableStore::new(db))
}

/// Build an engine over the configured store. The caller runs `init`.
pub fn open_engine(config: &Config) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let notifier = crate::notify::notifier(&config.notifications);
    Ok(TimerEngine::new(store, SystemClock, notifier).with_timing(config.timing.clone()))
}
