mod common;

use common::*;
use kanban_core::{KanbanError, RemoteSettings, RollbackPolicy, SyncSettings};
use kanban_domain::{CardLocation, EntityId, Label};
use kanban_remote::{ChecklistItemUpdate, ClickUpClient, RemoteComment, RemoteTag, RemoteUser};
use kanban_sync::{BoardStore, Notifier, SyncController, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;

fn mark_dirty() -> SyncSettings {
    SyncSettings {
        rollback: RollbackPolicy::MarkDirty,
        ..SyncSettings::default()
    }
}

#[tokio::test]
async fn failed_move_rolls_back_and_notifies() {
    let h = loaded().await;
    let mut notifications = h.controller.notifier().subscribe();
    h.service.fail("update_task");
    let card_id = EntityId::remote("t1");
    let before = h.controller.board();

    let outcome = h
        .controller
        .move_card(&card_id, "s-todo", "s-done")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        SyncOutcome::Failed {
            rolled_back: true,
            ..
        }
    ));
    assert_eq!(h.controller.board(), before);

    let notification = notifications.try_recv().unwrap();
    assert!(notification.is_error());
    assert_eq!(notification.action, "Move card");
    assert!(notification.message.contains("update_task rejected"));
}

#[tokio::test]
async fn mark_dirty_keeps_optimistic_state() {
    let h = harness_with(two_status_service(), mark_dirty());
    h.controller.load_board().await.unwrap();
    h.service.fail("update_task");
    let card_id = EntityId::remote("t1");

    let outcome = h
        .controller
        .move_card(&card_id, "s-todo", "s-done")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        SyncOutcome::Failed {
            rolled_back: false,
            ..
        }
    ));
    assert!(h
        .controller
        .board()
        .column("s-done")
        .unwrap()
        .card(&card_id)
        .is_some());
    assert_eq!(h.controller.dirty_cards(), vec![card_id.clone()]);

    h.service.recover("update_task");
    h.controller
        .move_card(&card_id, "s-done", "s-todo")
        .await
        .unwrap();
    assert!(!h.controller.is_dirty(&card_id));
}

#[tokio::test]
async fn reload_clears_dirty_cards() {
    let h = harness_with(two_status_service(), mark_dirty());
    h.controller.load_board().await.unwrap();
    h.service.fail("update_task");
    h.controller
        .move_card(&EntityId::remote("t1"), "s-todo", "s-done")
        .await
        .unwrap();
    assert_eq!(h.controller.dirty_cards().len(), 1);

    h.controller.load_board().await.unwrap();
    assert!(h.controller.dirty_cards().is_empty());
    assert_eq!(h.controller.board().column("s-todo").unwrap().cards.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_failure_does_not_undo_newer_move() {
    let todo = status("s-todo", "To Do", 0.0);
    let doing = status("s-doing", "Doing", 1.0);
    let done = status("s-done", "Done", 2.0);
    let service = FakeService::with_list(
        vec![todo.clone(), doing, done],
        vec![task("t1", "Write report", &todo)],
    );
    service.script_updates([
        Step {
            delay: Duration::from_millis(100),
            fail: true,
        },
        Step {
            delay: Duration::ZERO,
            fail: false,
        },
    ]);
    let h = harness(service);
    h.controller.load_board().await.unwrap();
    let mut notifications = h.controller.notifier().subscribe();
    let card_id = EntityId::remote("t1");

    let (first, second) = tokio::join!(
        h.controller.move_card(&card_id, "s-todo", "s-doing"),
        h.controller.move_card(&card_id, "s-doing", "s-done"),
    );

    assert!(matches!(
        first.unwrap(),
        SyncOutcome::Failed {
            rolled_back: false,
            ..
        }
    ));
    assert!(matches!(second.unwrap(), SyncOutcome::Confirmed));
    let board = h.controller.board();
    assert!(board.column("s-done").unwrap().card(&card_id).is_some());
    assert!(board.column("s-todo").unwrap().cards.is_empty());
    // the failure is still reported, and the card flagged for a reload
    assert!(h.controller.is_dirty(&card_id));
    let notification = notifications.try_recv().unwrap();
    assert!(notification.is_error());
    assert_eq!(notification.action, "Move card");
}

#[tokio::test(start_paused = true)]
async fn move_failing_after_newer_edit_is_reported_and_reverted() {
    let service = two_status_service();
    service.script_updates([
        Step {
            delay: Duration::from_millis(100),
            fail: true,
        },
        Step {
            delay: Duration::ZERO,
            fail: false,
        },
    ]);
    let h = harness(service);
    h.controller.load_board().await.unwrap();
    let mut notifications = h.controller.notifier().subscribe();
    let card_id = EntityId::remote("t1");
    let mut edited = h.controller.board().card(&card_id).unwrap().clone();
    edited.title = "Write final report".to_string();

    let (moved, edit) = tokio::join!(
        h.controller.move_card(&card_id, "s-todo", "s-done"),
        h.controller.edit_card(edited),
    );

    assert!(matches!(edit.unwrap(), SyncOutcome::Confirmed));
    assert!(matches!(
        moved.unwrap(),
        SyncOutcome::Failed {
            rolled_back: true,
            ..
        }
    ));
    let board = h.controller.board();
    let card = board.column("s-todo").unwrap().card(&card_id).unwrap();
    assert_eq!(card.title, "Write final report");
    assert_eq!(card.status_id.as_deref(), Some("s-todo"));
    assert!(board.column("s-done").unwrap().cards.is_empty());
    assert!(!h.controller.is_dirty(&card_id));

    let notification = notifications.try_recv().unwrap();
    assert!(notification.is_error());
    assert_eq!(notification.action, "Move card");
}

#[tokio::test(start_paused = true)]
async fn label_toggled_during_failed_move_survives_rollback() {
    let service = two_status_service();
    service.script_updates([Step {
        delay: Duration::from_millis(100),
        fail: true,
    }]);
    let h = harness(service);
    h.controller.load_board().await.unwrap();
    let card_id = EntityId::remote("t1");
    let urgent = h.controller.create_label("urgent", None).unwrap();

    let (moved, toggled) = tokio::join!(
        h.controller.move_card(&card_id, "s-todo", "s-done"),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.controller.toggle_label(&card_id, urgent.id)
        },
    );

    assert!(toggled.unwrap());
    assert!(matches!(
        moved.unwrap(),
        SyncOutcome::Failed {
            rolled_back: true,
            ..
        }
    ));
    let board = h.controller.board();
    let card = board.column("s-todo").unwrap().card(&card_id).unwrap();
    assert!(card.has_label(urgent.id));
    assert_eq!(card.status_id.as_deref(), Some("s-todo"));
}

#[tokio::test(start_paused = true)]
async fn queued_item_survives_failed_edit() {
    let service = two_status_service();
    service.script_updates([Step {
        delay: Duration::from_millis(100),
        fail: true,
    }]);
    let h = harness(service);
    h.controller.load_board().await.unwrap();
    let card_id = EntityId::remote("t1");
    let checklist = "cl-steps".to_string();
    let mut edited = h.controller.board().card(&card_id).unwrap().clone();
    edited.description = Some("Numbers for Q3".to_string());

    let (outcome, queued) = tokio::join!(h.controller.edit_card(edited), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.controller.add_checklist_item(&card_id, &checklist, "collect numbers")
    });

    assert!(outcome.unwrap().is_failed());
    let queued = queued.unwrap();
    let board = h.controller.board();
    let card = board.card(&card_id).unwrap();
    assert_eq!(card.description, None);
    assert!(card.checklist("cl-steps").unwrap().item(&queued).is_some());
}

#[tokio::test]
async fn create_card_reconciles_temporary_id() {
    let h = loaded().await;

    let (card_id, outcome) = h
        .controller
        .create_card("s-todo", "Review draft")
        .await
        .unwrap();

    assert!(matches!(outcome, SyncOutcome::Confirmed));
    assert_eq!(card_id, EntityId::remote("task-1"));
    let board = h.controller.board();
    let column = board.column("s-todo").unwrap();
    assert_eq!(column.cards.len(), 2);
    assert!(column.cards.iter().all(|c| !c.is_temporary()));
    assert_eq!(
        column.card(&card_id).unwrap().status_id.as_deref(),
        Some("s-todo")
    );
    assert_eq!(
        h.service.calls(),
        vec![Call::CreateTask {
            title: "Review draft".to_string(),
            status: "To Do".to_string(),
        }]
    );
}

#[tokio::test]
async fn failed_create_removes_temporary_card() {
    let h = loaded().await;
    h.service.fail("create_task");
    let before = h.controller.board();

    let (card_id, outcome) = h
        .controller
        .create_card("s-todo", "Doomed")
        .await
        .unwrap();

    assert!(card_id.is_temporary());
    assert!(outcome.is_failed());
    assert_eq!(h.controller.board(), before);
}

#[tokio::test]
async fn unsaved_card_rejects_remote_mutations() {
    let h = loaded().await;
    let draft = h.store.lock().add_card("s-todo", "Draft").unwrap();
    let before = h.controller.board();

    let moved = h.controller.move_card(&draft.id, "s-todo", "s-done").await;
    assert!(matches!(moved, Err(KanbanError::Validation(_))));
    let deleted = h.controller.delete_card(&draft.id).await;
    assert!(matches!(deleted, Err(KanbanError::Validation(_))));
    let commented = h.controller.add_comment(&draft.id, "hello").await;
    assert!(matches!(commented, Err(KanbanError::Validation(_))));

    assert_eq!(h.controller.board(), before);
    assert!(h.service.calls().is_empty());

    let label = h.controller.create_label("local", None).unwrap();
    assert!(h.controller.toggle_label(&draft.id, label.id).unwrap());
}

#[tokio::test]
async fn failed_delete_restores_card_position() {
    let todo = status("s-todo", "To Do", 0.0);
    let service = FakeService::with_list(
        vec![todo.clone()],
        vec![
            task("t1", "First", &todo),
            task("t2", "Second", &todo),
            task("t3", "Third", &todo),
        ],
    );
    service.fail("delete_task");
    let h = harness(service);
    h.controller.load_board().await.unwrap();
    let card_id = EntityId::remote("t2");
    h.store.lock().focus_card(&card_id).unwrap();

    let outcome = h.controller.delete_card(&card_id).await.unwrap();

    assert!(matches!(
        outcome,
        SyncOutcome::Failed {
            rolled_back: true,
            ..
        }
    ));
    assert_eq!(
        h.controller.board().locate(&card_id),
        Some(CardLocation {
            column_id: Some("s-todo".to_string()),
            index: 1,
        })
    );
    assert!(h.store.lock().focused_card().is_none());
}

#[tokio::test]
async fn delete_card_closes_detail_view() {
    let h = loaded().await;
    let card_id = EntityId::remote("t1");
    h.controller.open_card(&card_id).await.unwrap();
    assert_eq!(h.store.lock().focused_card(), Some(&card_id));

    let outcome = h.controller.delete_card(&card_id).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Confirmed));
    assert!(h.store.lock().focused_card().is_none());
    assert!(h.controller.board().card(&card_id).is_none());
}

#[tokio::test]
async fn comments_are_newest_first() {
    let h = loaded().await;
    {
        let mut state = h.service.state.lock();
        for (id, date) in [("c-old", 1_600_000_000_000_i64), ("c-new", 1_650_000_000_000)] {
            state.comments.push((
                "t1".to_string(),
                RemoteComment {
                    id: id.to_string(),
                    comment_text: id.to_string(),
                    user: Some(RemoteUser {
                        username: Some("sam".to_string()),
                        email: None,
                    }),
                    date: Some(date),
                },
            ));
        }
    }
    let card_id = EntityId::remote("t1");

    h.controller.open_card(&card_id).await.unwrap();
    h.controller.add_comment(&card_id, "latest").await.unwrap();

    let board = h.controller.board();
    let ids: Vec<_> = board
        .card(&card_id)
        .unwrap()
        .comments
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec!["comment-1", "c-new", "c-old"]);
}

#[tokio::test]
async fn failed_comment_leaves_card_untouched() {
    let h = loaded().await;
    h.service.fail("create_comment");
    let before = h.controller.board();

    let outcome = h
        .controller
        .add_comment(&EntityId::remote("t1"), "lost")
        .await
        .unwrap();
    assert!(outcome.is_failed());
    assert_eq!(h.controller.board(), before);
}

#[tokio::test]
async fn checklist_create_and_failed_delete() {
    let h = loaded().await;
    let card_id = EntityId::remote("t1");

    h.controller
        .create_checklist(&card_id, "Release")
        .await
        .unwrap();
    let board = h.controller.board();
    let created = board
        .card(&card_id)
        .unwrap()
        .checklists
        .iter()
        .find(|c| c.title == "Release")
        .cloned()
        .unwrap();

    h.service.fail("delete_checklist");
    let outcome = h
        .controller
        .delete_checklist(&card_id, &created.id)
        .await
        .unwrap();
    assert!(outcome.is_failed());
    assert!(h
        .controller
        .board()
        .card(&card_id)
        .unwrap()
        .checklist(&created.id)
        .is_some());
}

#[tokio::test]
async fn toggle_requires_saved_item() {
    let h = loaded().await;
    let card_id = EntityId::remote("t1");
    let checklist = "cl-steps".to_string();

    let temp = h
        .controller
        .add_checklist_item(&card_id, &checklist, "check logs")
        .unwrap();
    let outcome = h
        .controller
        .toggle_checklist_item(&card_id, &checklist, &temp)
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::NoOp));

    h.controller.queue().flush().await;
    let board = h.controller.board();
    let saved = board.card(&card_id).unwrap().checklist("cl-steps").unwrap().items[0].clone();
    assert!(!saved.is_temporary());
    h.service.clear_calls();

    let outcome = h
        .controller
        .toggle_checklist_item(&card_id, &checklist, &saved.id)
        .await
        .unwrap();
    assert!(matches!(outcome, SyncOutcome::Confirmed));
    assert_eq!(
        h.service.calls(),
        vec![Call::UpdateChecklistItem {
            checklist: "cl-steps".to_string(),
            item: saved.id.to_string(),
            update: ChecklistItemUpdate {
                name: None,
                resolved: Some(true),
            },
        }]
    );
    let board = h.controller.board();
    assert!(board.card(&card_id).unwrap().checklist("cl-steps").unwrap().items[0].completed);
}

#[tokio::test]
async fn local_labels_survive_reload() {
    let h = loaded().await;
    let card_id = EntityId::remote("t1");
    let label = h.controller.create_label("mine", None).unwrap();
    h.controller.toggle_label(&card_id, label.id).unwrap();

    h.controller.load_board().await.unwrap();
    let board = h.controller.board();
    assert!(board.label(label.id).is_some());
    assert!(board.card(&card_id).unwrap().has_label(label.id));
}

#[tokio::test]
async fn tag_removed_remotely_leaves_card_on_reload() {
    let todo = status("s-todo", "To Do", 0.0);
    let mut tagged = task("t1", "Write report", &todo);
    tagged.tags = vec![RemoteTag {
        name: "blocked".to_string(),
        tag_fg: None,
        tag_bg: Some("#ff0000".to_string()),
    }];
    let h = harness(FakeService::with_list(vec![todo], vec![tagged]));
    h.controller.load_board().await.unwrap();
    let card_id = EntityId::remote("t1");
    let blocked = Label::derive_id("blocked", "#ff0000");
    let mine = h.controller.create_label("mine", None).unwrap();
    h.controller.toggle_label(&card_id, mine.id).unwrap();
    assert!(h.controller.board().card(&card_id).unwrap().has_label(blocked));

    h.service.state.lock().tasks[0].tags.clear();
    h.controller.load_board().await.unwrap();

    let board = h.controller.board();
    let card = board.card(&card_id).unwrap();
    assert!(!card.has_label(blocked));
    assert!(card.has_label(mine.id));
    // the catalog is local and keeps the label
    assert!(board.label(blocked).is_some());
}

#[tokio::test]
async fn missing_configuration_is_reported_without_changes() {
    let store = BoardStore::new(Default::default()).shared();
    let remote = Arc::new(ClickUpClient::new(RemoteSettings::default()));
    let controller = SyncController::new(
        store.clone(),
        remote,
        &SyncSettings::default(),
        Notifier::new(),
    );
    let before = controller.board();

    let outcome = controller.load_board().await.unwrap();
    assert!(matches!(
        outcome.error(),
        Some(KanbanError::NotConfigured(_))
    ));
    assert_eq!(controller.board(), before);
}
