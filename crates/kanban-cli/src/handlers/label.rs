use crate::cli::LabelAction;
use crate::context::{settle, CliContext};
use crate::output;

pub async fn handle(ctx: &CliContext, action: LabelAction) -> anyhow::Result<()> {
    match action {
        LabelAction::List => {
            output::output_list(ctx.board().labels);
        }
        LabelAction::Create { name, color } => {
            let label = ctx.controller().create_label(&name, color.as_deref())?;
            output::output_success(&label);
        }
        LabelAction::Delete { id } => {
            let status = settle(ctx.controller().delete_label(id)?)?;
            output::output_success(serde_json::json!({
                "status": status,
                "deleted": id.to_string(),
            }));
        }
        LabelAction::Toggle { card, id } => {
            let card_id = ctx.card_id(&card)?;
            let assigned = ctx.controller().toggle_label(&card_id, id)?;
            output::output_success(serde_json::json!({
                "card": card_id.to_string(),
                "label": id.to_string(),
                "assigned": assigned,
            }));
        }
    }
    Ok(())
}
