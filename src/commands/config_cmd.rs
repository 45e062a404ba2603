//! `scribe config` - validate the configuration and show what it resolves to.

use anyhow::Result;

use crate::config::{BackendKind, Config};

pub fn execute(config: &Config) -> Result<()> {
    let validation = config.validate()?;

    println!("Server:  {}", config.bind_addr()?);
    match config.store.backend {
        BackendKind::Memory => println!("Store:   memory (not persisted)"),
        BackendKind::Redb => println!("Store:   redb at {}", config.store_path()?.display()),
    }
    println!("TTL:     {}h", config.store.ttl_hours);
    println!("Max upload: {} bytes", config.store.max_file_size);
    if config.sweeper.enabled {
        println!("Sweeper: every {}s", config.sweeper.interval_secs);
    } else {
        println!("Sweeper: disabled");
    }

    if validation.has_warnings() {
        println!();
        for warning in &validation.warnings {
            println!("warning: {warning}");
        }
    }
    println!("\nConfiguration OK");
    Ok(())
}
