use crate::output::{print_json, print_table};
use anyhow::Context;
use fixids_core::config::MigrationConfig;
use fixids_core::remote::Remote;
use fixids_core::rewrite;

pub fn run(config: &MigrationConfig, remote: &dyn Remote, json: bool) -> anyhow::Result<()> {
    let changelog = rewrite::run(config, remote).context("stage 2 failed")?;

    if json {
        print_json(&changelog)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = changelog
        .iter()
        .map(|(path, changes)| vec![path.clone(), changes.join(", ")])
        .collect();
    print_table(&["FILE", "CHANGES"], rows);
    println!(
        "\nChanged {} file(s); changelog written to {}",
        changelog.len(),
        config.changelog_path.display()
    );
    Ok(())
}
