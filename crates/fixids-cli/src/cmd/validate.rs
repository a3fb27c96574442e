use crate::output::print_json;
use fixids_core::config::MigrationConfig;
use fixids_core::remote::Remote;
use fixids_core::validate;
use fixids_core::FixidsError;

pub fn run(config: &MigrationConfig, remote: &dyn Remote, json: bool) -> anyhow::Result<()> {
    if let Err(e) = validate::run(config, remote) {
        if matches!(e, FixidsError::ValidationFailed(_)) {
            eprintln!(
                "Residual references remain; see {} for triage.",
                config.not_fixed_path.display()
            );
        }
        return Err(e.into());
    }

    if json {
        print_json(&serde_json::json!({ "residuals": 0 }))?;
    } else {
        println!("All automations and cross-references are consistent.");
    }
    Ok(())
}
