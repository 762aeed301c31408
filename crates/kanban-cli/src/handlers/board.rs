use crate::cli::BoardAction;
use crate::context::{settle, CliContext};
use crate::output;

pub async fn handle(ctx: &CliContext, action: BoardAction) -> anyhow::Result<()> {
    match action {
        BoardAction::Show => {
            let pulled_at = ctx.controller().store().lock().pulled_at();
            output::output_success(serde_json::json!({
                "pulled_at": pulled_at,
                "board": ctx.board(),
            }));
        }
        BoardAction::Pull => {
            let status = settle(ctx.controller().load_board().await?)?;
            let pulled_at = ctx.controller().store().lock().pulled_at();
            output::output_success(serde_json::json!({
                "status": status,
                "pulled_at": pulled_at,
                "board": ctx.board(),
            }));
        }
    }
    Ok(())
}
