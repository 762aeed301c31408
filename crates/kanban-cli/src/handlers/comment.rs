use crate::cli::CommentAction;
use crate::context::{settle, CliContext};
use crate::output;

pub async fn handle(ctx: &CliContext, action: CommentAction) -> anyhow::Result<()> {
    match action {
        CommentAction::List { card } => {
            let card_id = ctx.card_id(&card)?;
            settle(ctx.controller().load_comments(&card_id).await?)?;
            output::output_list(ctx.card(&card_id)?.comments);
        }
        CommentAction::Add { card, text } => {
            let card_id = ctx.card_id(&card)?;
            let status = settle(ctx.controller().add_comment(&card_id, &text).await?)?;
            let comment = ctx.card(&card_id)?.comments.into_iter().next();
            output::output_success(serde_json::json!({ "status": status, "comment": comment }));
        }
    }
    Ok(())
}
