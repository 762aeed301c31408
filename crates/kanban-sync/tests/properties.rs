mod common;

use common::*;
use kanban_domain::{EntityId, FieldUpdate};
use kanban_remote::{RemoteChecklist, RemoteChecklistItem, TaskUpdateRequest};
use kanban_sync::SyncOutcome;
use std::time::Duration;

#[tokio::test]
async fn load_then_move_card_to_done() {
    let h = harness(two_status_service());

    let outcome = h.controller.load_board().await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Confirmed));

    let board = h.controller.board();
    assert_eq!(board.columns.len(), 2);
    assert_eq!(board.columns[0].title, "To Do");
    assert_eq!(board.columns[0].cards.len(), 1);
    assert_eq!(board.columns[0].cards[0].title, "Write report");
    assert!(board.columns[1].cards.is_empty());

    h.service.clear_calls();
    let card_id = EntityId::remote("t1");
    let outcome = h
        .controller
        .move_card(&card_id, "s-todo", "s-done")
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Confirmed));

    let board = h.controller.board();
    assert!(board.column("s-todo").unwrap().cards.is_empty());
    let moved = board.column("s-done").unwrap().card(&card_id).unwrap();
    assert_eq!(moved.status_id.as_deref(), Some("s-done"));

    assert_eq!(
        h.service.calls(),
        vec![Call::UpdateTask {
            id: "t1".to_string(),
            update: TaskUpdateRequest {
                status: Some("Done".to_string()),
                ..TaskUpdateRequest::default()
            },
        }]
    );
}

#[tokio::test]
async fn move_to_own_column_changes_nothing() {
    let h = loaded().await;
    let before = h.controller.board();

    let outcome = h
        .controller
        .move_card(&EntityId::remote("t1"), "s-todo", "s-todo")
        .await
        .unwrap();

    assert!(matches!(outcome, SyncOutcome::NoOp));
    assert_eq!(h.controller.board(), before);
    assert!(h.service.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn batched_items_keep_submission_order() {
    let todo = status("s-todo", "To Do", 0.0);
    let mut remote = task("t1", "Write report", &todo);
    remote.checklists.push(RemoteChecklist {
        id: "cl-steps".to_string(),
        name: "Steps".to_string(),
        orderindex: Some(0.0),
        items: vec![
            RemoteChecklistItem {
                id: "i-1".into(),
                name: "outline".into(),
                orderindex: Some(0.0),
                resolved: true,
            },
            RemoteChecklistItem {
                id: "i-2".into(),
                name: "draft".into(),
                orderindex: Some(1.0),
                resolved: false,
            },
        ],
    });
    let h = harness(FakeService::with_list(vec![todo], vec![remote]));
    h.controller.load_board().await.unwrap();

    let card = EntityId::remote("t1");
    let checklist = "cl-steps".to_string();
    for text in ["A", "B", "C"] {
        h.controller
            .add_checklist_item(&card, &checklist, text)
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(2600)).await;
    settle().await;

    assert_eq!(
        h.service.item_creations(),
        vec![
            ("A".to_string(), Some(2.0)),
            ("B".to_string(), Some(3.0)),
            ("C".to_string(), Some(4.0)),
        ]
    );
    let board = h.controller.board();
    let items = &board.card(&card).unwrap().checklist("cl-steps").unwrap().items;
    let texts: Vec<_> = items.iter().map(|i| i.text.as_str()).collect();
    assert_eq!(texts, vec!["outline", "draft", "A", "B", "C"]);
    assert!(items.iter().all(|i| !i.is_temporary()));
}

#[tokio::test]
async fn deleted_pending_item_is_never_created() {
    let h = loaded().await;
    let card = EntityId::remote("t1");
    let checklist = "cl-steps".to_string();

    h.controller
        .add_checklist_item(&card, &checklist, "keep")
        .unwrap();
    let dropped = h
        .controller
        .add_checklist_item(&card, &checklist, "drop")
        .unwrap();

    let outcome = h
        .controller
        .delete_checklist_item(&card, &checklist, &dropped)
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Local));
    assert_eq!(h.controller.queue().pending_count(), 1);

    let report = h.controller.queue().flush().await;
    assert_eq!(report.created, 1);
    assert_eq!(
        h.service.item_creations(),
        vec![("keep".to_string(), Some(0.0))]
    );
}

#[tokio::test]
async fn deleting_label_removes_it_from_every_card() {
    let todo = status("s-todo", "To Do", 0.0);
    let service = FakeService::with_list(
        vec![todo.clone()],
        vec![task("t1", "One", &todo), task("t2", "Two", &todo)],
    );
    let h = harness(service);
    h.controller.load_board().await.unwrap();

    let label = h.controller.create_label("blocked", Some("#ff0000")).unwrap();
    for id in ["t1", "t2"] {
        assert!(h
            .controller
            .toggle_label(&EntityId::remote(id), label.id)
            .unwrap());
    }

    h.controller.delete_label(label.id).unwrap();
    let board = h.controller.board();
    assert!(board.label(label.id).is_none());
    assert!(board.cards().all(|card| !card.has_label(label.id)));
}

#[tokio::test]
async fn edit_sends_only_editable_fields() {
    let h = loaded().await;
    let card_id = EntityId::remote("t1");
    let mut card = h.controller.board().card(&card_id).cloned().unwrap();
    card.title = "Write final report".to_string();
    card.description = Some("Include charts".to_string());
    FieldUpdate::Set(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).apply_to(&mut card.due_date);

    let outcome = h.controller.edit_card(card).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Confirmed));

    assert_eq!(
        h.service.calls(),
        vec![Call::UpdateTask {
            id: "t1".to_string(),
            update: TaskUpdateRequest {
                name: Some("Write final report".to_string()),
                description: Some("Include charts".to_string()),
                due_date: FieldUpdate::Set(1_709_251_200_000),
                status: None,
            },
        }]
    );
    let board = h.controller.board();
    assert_eq!(board.card(&card_id).unwrap().title, "Write final report");
}
