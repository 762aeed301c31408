use crate::cli::{ChecklistAction, ChecklistItemArgs};
use crate::context::{settle, CliContext};
use crate::output;
use anyhow::anyhow;
use kanban_domain::{CardId, ChecklistId, EntityId, ItemId};
use serde::Serialize;

#[derive(Serialize)]
struct FailedItemView {
    text: String,
    error: String,
}

pub async fn handle(ctx: &CliContext, action: ChecklistAction) -> anyhow::Result<()> {
    match action {
        ChecklistAction::Create { card, title } => {
            let card_id = ctx.card_id(&card)?;
            let status = settle(ctx.controller().create_checklist(&card_id, &title).await?)?;
            let checklists = ctx.card(&card_id)?.checklists;
            output::output_success(serde_json::json!({
                "status": status,
                "checklists": checklists,
            }));
        }
        ChecklistAction::Delete { card, id } => {
            let card_id = ctx.card_id(&card)?;
            let status = settle(ctx.controller().delete_checklist(&card_id, &id).await?)?;
            output::output_success(serde_json::json!({ "status": status, "deleted": id }));
        }
        ChecklistAction::AddItems {
            card,
            checklist,
            items,
        } => {
            let card_id = ctx.card_id(&card)?;
            for text in &items {
                ctx.controller()
                    .add_checklist_item(&card_id, &checklist, text)?;
            }
            let report = ctx.controller().queue().flush().await;
            let failed: Vec<FailedItemView> = report
                .failed
                .iter()
                .map(|f| FailedItemView {
                    text: f.text.clone(),
                    error: f.error.to_string(),
                })
                .collect();
            if report.created == 0 && !failed.is_empty() {
                return Err(anyhow!("No checklist items could be created"));
            }
            let checklist = ctx.card(&card_id)?.checklist(&checklist).cloned();
            output::output_success(serde_json::json!({
                "created": report.created,
                "failed": failed,
                "checklist": checklist,
            }));
        }
        ChecklistAction::Toggle(args) => {
            let (card_id, checklist_id, item_id) = resolve(ctx, &args)?;
            let outcome = ctx
                .controller()
                .toggle_checklist_item(&card_id, &checklist_id, &item_id)
                .await?;
            let status = settle(outcome)?;
            if status == "unchanged" {
                return Err(anyhow!("Item {} has not been saved yet", item_id));
            }
            output_item(ctx, status, &card_id, &checklist_id, &item_id)?;
        }
        ChecklistAction::Rename { item, text } => {
            let (card_id, checklist_id, item_id) = resolve(ctx, &item)?;
            let outcome = ctx
                .controller()
                .rename_checklist_item(&card_id, &checklist_id, &item_id, &text)
                .await?;
            let status = settle(outcome)?;
            output_item(ctx, status, &card_id, &checklist_id, &item_id)?;
        }
        ChecklistAction::DeleteItem(args) => {
            let (card_id, checklist_id, item_id) = resolve(ctx, &args)?;
            let outcome = ctx
                .controller()
                .delete_checklist_item(&card_id, &checklist_id, &item_id)
                .await?;
            let status = settle(outcome)?;
            output::output_success(serde_json::json!({
                "status": status,
                "deleted": item_id.to_string(),
            }));
        }
    }
    Ok(())
}

fn resolve(
    ctx: &CliContext,
    args: &ChecklistItemArgs,
) -> anyhow::Result<(CardId, ChecklistId, ItemId)> {
    let card_id = ctx.card_id(&args.card)?;
    Ok((
        card_id,
        args.checklist.trim().to_string(),
        EntityId::parse(args.item.trim()),
    ))
}

fn output_item(
    ctx: &CliContext,
    status: &str,
    card_id: &CardId,
    checklist_id: &str,
    item_id: &ItemId,
) -> anyhow::Result<()> {
    let item = ctx
        .card(card_id)?
        .checklist(checklist_id)
        .and_then(|c| c.item(item_id))
        .cloned();
    output::output_success(serde_json::json!({ "status": status, "item": item }));
    Ok(())
}
