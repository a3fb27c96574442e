use crate::output::print_json;
use anyhow::Context;
use fixids_core::config::MigrationConfig;
use fixids_core::remote::Remote;
use fixids_core::tag;

pub fn run(config: &MigrationConfig, remote: &dyn Remote, json: bool) -> anyhow::Result<()> {
    let checkpoint = tag::run(config, remote).context("stage 1 failed")?;

    if json {
        print_json(&checkpoint)?;
        return Ok(());
    }

    if checkpoint.is_empty() {
        println!("No automations need migration; nothing to do.");
    } else {
        println!(
            "Tagged {} automation(s); checkpoint written to {}",
            checkpoint.len(),
            config.checkpoint_path.display()
        );
    }
    Ok(())
}
