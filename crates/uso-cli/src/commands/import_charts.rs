use anyhow::Result;
use uso_core::Config;

/// Import every chart not yet stored and list what was added
pub fn run(config: &Config, ids: &[u32]) -> Result<()> {
    let sync = super::connect(config)?;
    let imported = sync.import_charts(ids)?;

    for row in &imported {
        println!(
            "{:>10}  {:>6}pp  {}",
            row.record.chart_id,
            row.record.performance,
            row.record.display_name()
        );
    }
    println!("Imported {} chart(s)", imported.len());

    sync.close()?;
    Ok(())
}
