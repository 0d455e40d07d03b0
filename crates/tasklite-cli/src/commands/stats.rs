use clap::Args;
use tasklite_core::storage::STATS_KEY;
use tasklite_core::timer::day_key;
use tasklite_core::{Config, Statistics};

#[derive(Args)]
pub struct StatsArgs {
    /// Only today's counters
    #[arg(long)]
    today: bool,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = super::open_store(&config)?;
    let stats: Statistics = store.try_read(STATS_KEY)?.unwrap_or_default();

    if args.today {
        let today = day_key(chrono::Utc::now());
        let json = serde_json::json!({
            "date": today,
            "completedCount": stats.day(&today).completed_count,
            "totalFocusMinutes": stats.day(&today).total_focus_minutes,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}
