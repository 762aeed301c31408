use crate::cli::{CardAction, CardEditArgs};
use crate::context::{settle, CliContext};
use crate::output;
use anyhow::anyhow;
use chrono::NaiveDate;
use kanban_domain::{Card, FieldUpdate};

pub async fn handle(ctx: &CliContext, action: CardAction) -> anyhow::Result<()> {
    match action {
        CardAction::Create { column, title } => {
            let (card_id, outcome) = ctx.controller().create_card(&column, &title).await?;
            let status = settle(outcome)?;
            let card = ctx.card(&card_id)?;
            output::output_success(serde_json::json!({ "status": status, "card": card }));
        }
        CardAction::Move { id, to } => {
            let card_id = ctx.card_id(&id)?;
            let from = ctx
                .board()
                .locate(&card_id)
                .and_then(|location| location.column_id)
                .ok_or_else(|| anyhow!("Card {} is not in a column", card_id))?;
            let status = settle(ctx.controller().move_card(&card_id, &from, &to).await?)?;
            let card = ctx.card(&card_id)?;
            output::output_success(serde_json::json!({ "status": status, "card": card }));
        }
        CardAction::Edit(args) => {
            let card_id = ctx.card_id(&args.id)?;
            let card = build_edited_card(ctx.card(&card_id)?, args)?;
            let status = settle(ctx.controller().edit_card(card).await?)?;
            let card = ctx.card(&card_id)?;
            output::output_success(serde_json::json!({ "status": status, "card": card }));
        }
        CardAction::Delete { id } => {
            let card_id = ctx.card_id(&id)?;
            let status = settle(ctx.controller().delete_card(&card_id).await?)?;
            output::output_success(serde_json::json!({
                "status": status,
                "deleted": card_id.to_string(),
            }));
        }
        CardAction::Show { id } => {
            let card_id = ctx.card_id(&id)?;
            let status = settle(ctx.controller().open_card(&card_id).await?)?;
            let card = ctx.card(&card_id)?;
            output::output_success(serde_json::json!({
                "status": status,
                "dirty": ctx.controller().is_dirty(&card_id),
                "card": card,
            }));
        }
    }
    Ok(())
}

fn build_edited_card(mut card: Card, args: CardEditArgs) -> anyhow::Result<Card> {
    if let Some(title) = args.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(anyhow!("Card title must not be empty"));
        }
        card.title = title.to_string();
    }

    let description = match args.description {
        Some(text) if text.trim().is_empty() => FieldUpdate::Clear,
        Some(text) => FieldUpdate::Set(text),
        None if args.clear_description => FieldUpdate::Clear,
        None => FieldUpdate::NoChange,
    };
    description.apply_to(&mut card.description);

    let due_date = match args.due_date {
        Some(date) => FieldUpdate::Set(parse_date(&date)?),
        None if args.clear_due_date => FieldUpdate::Clear,
        None => FieldUpdate::NoChange,
    };
    due_date.apply_to(&mut card.due_date);

    Ok(card)
}

fn parse_date(input: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow!("Invalid due date '{}' (expected YYYY-MM-DD): {}", input, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_domain::EntityId;

    fn args() -> CardEditArgs {
        CardEditArgs {
            id: "t1".to_string(),
            title: None,
            description: None,
            clear_description: false,
            due_date: None,
            clear_due_date: false,
        }
    }

    fn card() -> Card {
        let mut card = Card::new(EntityId::remote("t1"), "Draft".into(), Some("s-todo".into()));
        card.description = Some("old".to_string());
        card.due_date = NaiveDate::from_ymd_opt(2024, 1, 5);
        card
    }

    #[test]
    fn test_untouched_fields_are_kept() {
        let edited = build_edited_card(
            card(),
            CardEditArgs {
                title: Some("  Final  ".to_string()),
                ..args()
            },
        )
        .unwrap();
        assert_eq!(edited.title, "Final");
        assert_eq!(edited.description.as_deref(), Some("old"));
        assert_eq!(edited.due_date, NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn test_clear_flags() {
        let edited = build_edited_card(
            card(),
            CardEditArgs {
                clear_description: true,
                clear_due_date: true,
                ..args()
            },
        )
        .unwrap();
        assert!(edited.description.is_none());
        assert!(edited.due_date.is_none());
    }

    #[test]
    fn test_due_date_parsing() {
        let edited = build_edited_card(
            card(),
            CardEditArgs {
                due_date: Some("2024-03-01".to_string()),
                ..args()
            },
        )
        .unwrap();
        assert_eq!(edited.due_date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let invalid = build_edited_card(
            card(),
            CardEditArgs {
                due_date: Some("03/01/2024".to_string()),
                ..args()
            },
        );
        assert!(invalid.is_err());
    }
}
