use crate::cli::ColumnAction;
use crate::context::CliContext;
use crate::output;

pub async fn handle(ctx: &CliContext, action: ColumnAction) -> anyhow::Result<()> {
    match action {
        ColumnAction::Add { title } => {
            let id = ctx.controller().store().lock().add_column(&title)?;
            let board = ctx.board();
            output::output_success(board.column(&id));
        }
        ColumnAction::Remove { id } => {
            ctx.controller().store().lock().remove_column(&id)?;
            output::output_success(serde_json::json!({ "deleted": id }));
        }
    }
    Ok(())
}
