use clap::Subcommand;
use tasklite_core::storage::SETTINGS_KEY;
use tasklite_core::{Config, Settings};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting value
    Get {
        /// Setting key (e.g. "workMinutes", "autoStartBreaks")
        key: String,
    },
    /// Set a setting value
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List all settings
    List,
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = super::open_store(&config)?;
    let settings: Settings = store.try_read(SETTINGS_KEY)?.unwrap_or_default();

    match action {
        SettingsAction::Get { key } => match settings.get(&key) {
            Some(value) => println!("{value}"),
            None => {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            }
        },
        SettingsAction::Set { key, value } => {
            let patch = settings.patch_for(&key, &value)?;
            let updated = settings.merged(&patch)?;
            store.try_write(SETTINGS_KEY, &updated)?;
            println!("ok");
        }
        SettingsAction::List => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Reset => {
            store.try_write(SETTINGS_KEY, &Settings::default())?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
