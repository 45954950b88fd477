use anyhow::Result;
use uso_core::Config;

/// Request a chart and print it as JSON
pub fn run(config: &Config, id: u32, force: bool) -> Result<()> {
    let sync = super::connect(config)?;

    match sync.request_chart(id, force, true)? {
        Some(row) => println!("{}", serde_json::to_string_pretty(&row.record)?),
        None => println!("Chart {} not found", id),
    }

    sync.close()?;
    Ok(())
}
