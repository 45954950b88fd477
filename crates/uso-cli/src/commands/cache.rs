use anyhow::Result;
use uso_core::Config;

/// Print the cache location and fill level
pub fn run(config: &Config) -> Result<()> {
    let cache = super::open_cache(config)?;

    println!("Directory: {}", cache.directory().display());
    println!("Entries:   {} / {}", cache.len(), cache.capacity());
    Ok(())
}
