use pomobar_core::storage::SqliteStore;
use pomobar_core::Statistics;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open_default()?;
    let stats = Statistics::load(&store, chrono::Local::now().date_naive());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
