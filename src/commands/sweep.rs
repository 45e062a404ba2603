//! `scribe sweep` - one maintenance pass, then exit.

use anyhow::Result;

use crate::config::Config;
use crate::daemon::services::transcription::Sweeper;

pub async fn execute(config: Config) -> Result<()> {
    let store = super::open_store(&config)?;
    let report = Sweeper::new(store).run_once().await?;

    println!("Purged by TTL:        {}", report.purged);
    println!("Expired deleted:     {}", report.deleted);
    println!("Index entries fixed: {}", report.repaired);
    Ok(())
}
