use crate::cli::{ConfigAction, ConfigSetArgs};
use crate::output;
use anyhow::anyhow;
use kanban_core::{AppConfig, RollbackPolicy};
use std::path::Path;

/// `effective` is the loaded config with command-line overrides applied;
/// `set` only writes what is in the file plus the given flags.
pub fn handle(
    action: ConfigAction,
    effective: &AppConfig,
    path: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            output::output_success(serde_json::json!({
                "path": path.map(|p| p.display().to_string()),
                "configured": effective.remote.is_configured(),
                "config": effective.redacted(),
            }));
        }
        ConfigAction::Set(args) => {
            let path = path.ok_or_else(|| anyhow!("No config directory on this platform; pass --config"))?;
            let mut config = AppConfig::load_from(path);
            apply(&mut config, args)?;
            config.save_to(path)?;
            output::output_success(serde_json::json!({
                "path": path.display().to_string(),
                "config": config.redacted(),
            }));
        }
    }
    Ok(())
}

fn apply(config: &mut AppConfig, args: ConfigSetArgs) -> anyhow::Result<()> {
    let remote = &mut config.remote;
    for (field, value) in [
        (&mut remote.api_token, args.api_token),
        (&mut remote.list_id, args.list_id),
        (&mut remote.team_id, args.team_id),
        (&mut remote.space_id, args.space_id),
        (&mut remote.base_url, args.base_url),
    ] {
        if let Some(value) = value {
            let value = value.trim().to_string();
            *field = (!value.is_empty()).then_some(value);
        }
    }

    if let Some(ms) = args.quiet_period_ms {
        if ms == 0 {
            return Err(anyhow!("Quiet period must be greater than zero"));
        }
        config.sync.quiet_period_ms = ms;
    }
    if let Some(policy) = args.rollback {
        config.sync.rollback = match policy.as_str() {
            "rollback" => RollbackPolicy::Rollback,
            "mark_dirty" => RollbackPolicy::MarkDirty,
            other => return Err(anyhow!("Unknown rollback policy '{}'", other)),
        };
    }
    Ok(())
}
