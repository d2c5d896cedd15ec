//! The grid facade: editing, deleting and adding rows in both pagination modes.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Call;
use common::RecordingBackend;
use common::plasmid_rows;
use common::plasmid_schema;
use datagrid_lib::DataGrid;
use datagrid_lib::GridConfig;
use datagrid_lib::api::SortSpec;
use datagrid_lib::edit::EditState;
use datagrid_lib::edit::PointerTarget;
use datagrid_lib::filter::SearchField;
use datagrid_lib::model::Row;
use datagrid_lib::model::RowId;
use datagrid_lib::model::User;
use datagrid_lib::model::Value;
use datagrid_lib::notify::ToastQueue;
use datagrid_lib::registry::EditorView;
use datagrid_lib::registry::Rendered;

fn server_grid(backend: Arc<RecordingBackend>, toasts: Arc<ToastQueue>) -> DataGrid {
    let config = GridConfig::default()
        .with_server_side_pagination(true)
        .with_refresh_delay(Duration::from_millis(20));
    DataGrid::builder(plasmid_schema())
        .config(config)
        .backend(backend)
        .notifier(toasts)
        .build()
        .unwrap()
}

fn client_grid(backend: Arc<RecordingBackend>, toasts: Arc<ToastQueue>) -> DataGrid {
    DataGrid::builder(plasmid_schema())
        .backend(backend)
        .notifier(toasts)
        .build()
        .unwrap()
}

fn id(value: i64) -> RowId {
    RowId::from(value)
}

fn text(grid: &DataGrid, row: i64, key: &str) -> String {
    grid.render_cell(&id(row), key).unwrap().to_plain()
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_server_mode_requires_source() {
    let config = GridConfig::default().with_server_side_pagination(true);
    let result = DataGrid::builder(plasmid_schema()).config(config).build();
    assert!(result.is_err());
}

#[test]
fn test_invalid_page_size_rejected() {
    let result = DataGrid::builder(plasmid_schema())
        .config(GridConfig::default().with_page_size(0))
        .build();
    assert!(result.is_err());
}

// =============================================================================
// Cell editing
// =============================================================================

#[tokio::test]
async fn test_change_column_saves_once_and_exits() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let toasts = Arc::new(ToastQueue::new());
    let grid = server_grid(backend.clone(), toasts.clone());
    grid.load().await.unwrap();
    toasts.drain();

    grid.cell_click(&id(1), "plasmid").await.unwrap();
    assert!(grid.is_editing(&id(1), "plasmid"));
    grid.cell_change(&id(1), "plasmid", "B").await.unwrap();

    assert_eq!(backend.updates(), vec![(id(1), Row::new().set("plasmid", "B"))]);
    assert_eq!(grid.edit_state(&id(1)), EditState::Viewing);
    assert_eq!(text(&grid, 1, "plasmid"), "B");

    let toasts = toasts.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Plasmid updated");
}

#[tokio::test]
async fn test_unchanged_value_is_not_sent() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    grid.cell_click(&id(1), "name").await.unwrap();
    grid.cell_change(&id(1), "name", "pUC-1").await.unwrap();
    grid.cell_blur(&id(1), "name").await.unwrap();

    grid.cell_click(&id(2), "plasmid").await.unwrap();
    grid.cell_change(&id(2), "plasmid", "A").await.unwrap();

    assert!(backend.updates().is_empty());
    assert_eq!(grid.edit_state(&id(1)), EditState::Viewing);
    assert_eq!(grid.edit_state(&id(2)), EditState::Viewing);
}

#[tokio::test]
async fn test_blur_commits_text_cell() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    grid.cell_click(&id(3), "name").await.unwrap();
    grid.cell_change(&id(3), "name", "pBR322").await.unwrap();
    assert_eq!(text(&grid, 3, "name"), "pBR322");
    assert!(backend.updates().is_empty());

    grid.pointer_down(&PointerTarget::Outside).await.unwrap();

    assert_eq!(backend.updates(), vec![(id(3), Row::new().set("name", "pBR322"))]);
    assert!(!grid.is_editing(&id(3), "name"));
    let record = backend.store().record(&id(3)).unwrap();
    assert_eq!(record["name"], serde_json::json!("pBR322"));
}

#[tokio::test]
async fn test_clicking_another_cell_commits_previous() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    grid.cell_click(&id(1), "name").await.unwrap();
    grid.cell_change(&id(1), "name", "renamed").await.unwrap();
    grid.cell_click(&id(2), "concentration").await.unwrap();

    assert_eq!(backend.updates().len(), 1);
    assert!(grid.is_editing(&id(2), "concentration"));
    assert!(!grid.is_editing(&id(1), "name"));
}

#[tokio::test]
async fn test_link_cell_is_not_editable() {
    let backend = RecordingBackend::new(plasmid_rows(5));
    let grid = server_grid(backend, Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    grid.cell_click(&id(1), "id").await.unwrap();
    assert_eq!(grid.edit_state(&id(1)), EditState::Viewing);
    assert_eq!(
        grid.render_cell(&id(1), "id").unwrap(),
        Rendered::Link {
            label: "1".into(),
            href: "/plasmids/1".into()
        }
    );
}

#[tokio::test]
async fn test_failed_update_rolls_back_draft() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let toasts = Arc::new(ToastQueue::new());
    let grid = server_grid(backend.clone(), toasts.clone());
    grid.load().await.unwrap();
    toasts.drain();

    backend.set_fail_updates(true);
    grid.cell_click(&id(4), "name").await.unwrap();
    grid.cell_change(&id(4), "name", "broken").await.unwrap();
    assert!(grid.cell_blur(&id(4), "name").await.is_err());

    assert_eq!(text(&grid, 4, "name"), "pUC-4");
    let toasts = toasts.drain();
    assert_eq!(toasts.len(), 1);
    assert!(toasts[0].is_error());

    // the grid stays usable
    backend.set_fail_updates(false);
    grid.cell_click(&id(4), "name").await.unwrap();
    assert_eq!(
        grid.cell_editor(&id(4), "name").unwrap(),
        Some(EditorView::TextInput { value: "pUC-4".into() })
    );
}

#[tokio::test]
async fn test_editor_shown_only_while_editing() {
    let backend = RecordingBackend::new(plasmid_rows(5));
    let grid = server_grid(backend, Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    assert_eq!(grid.cell_editor(&id(2), "plasmid").unwrap(), None);
    grid.cell_click(&id(2), "plasmid").await.unwrap();
    match grid.cell_editor(&id(2), "plasmid").unwrap() {
        Some(EditorView::Select { value, choices, .. }) => {
            assert_eq!(value, "A");
            assert_eq!(choices, vec!["A", "B", "C"]);
        }
        other => panic!("expected a select, got {:?}", other),
    }
}

#[tokio::test]
async fn test_user_column_round_trips_through_storage() {
    let backend = RecordingBackend::new(plasmid_rows(5));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();
    assert_eq!(grid.users().len(), 2);

    let ada = User::new("u1", "Ada Lovelace", "ada@lab.org");
    grid.cell_click(&id(1), "owner").await.unwrap();
    grid.cell_change(&id(1), "owner", Value::Users(vec![ada.clone()]))
        .await
        .unwrap();
    grid.pointer_down(&PointerTarget::Outside).await.unwrap();

    assert_eq!(backend.updates().len(), 1);
    let record = backend.store().record(&id(1)).unwrap();
    assert!(record["owner_json"].is_string());
    assert_eq!(grid.render_cell(&id(1), "owner").unwrap(), Rendered::Users(vec![ada]));
    assert_eq!(grid.edit_state(&id(1)), EditState::Viewing);
}

// =============================================================================
// Row editing
// =============================================================================

#[tokio::test]
async fn test_cancel_row_restores_values() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();
    let before: Vec<String> = ["plasmid", "name", "concentration"]
        .iter()
        .map(|key| text(&grid, 2, key))
        .collect();

    assert!(grid.edit_row(&id(2)).unwrap());
    grid.cell_change(&id(2), "plasmid", "C").await.unwrap();
    grid.cell_change(&id(2), "name", "changed").await.unwrap();
    grid.cell_change(&id(2), "concentration", 999i64).await.unwrap();
    assert_eq!(text(&grid, 2, "name"), "changed");
    grid.cancel_row(&id(2)).unwrap();

    let after: Vec<String> = ["plasmid", "name", "concentration"]
        .iter()
        .map(|key| text(&grid, 2, key))
        .collect();
    assert_eq!(before, after);
    assert!(backend.updates().is_empty());
    assert_eq!(grid.edit_state(&id(2)), EditState::Viewing);
}

#[tokio::test]
async fn test_save_row_sends_changed_keys_only() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    grid.edit_row(&id(6)).unwrap();
    grid.cell_change(&id(6), "name", "pET-28").await.unwrap();
    grid.cell_change(&id(6), "plasmid", "A").await.unwrap();
    grid.cell_change(&id(6), "concentration", 75i64).await.unwrap();
    grid.save_row(&id(6)).await.unwrap();

    let updates = backend.updates();
    assert_eq!(updates.len(), 1);
    let (row_id, changes) = &updates[0];
    assert_eq!(row_id, &id(6));
    assert_eq!(changes.len(), 2);
    assert_eq!(changes.get("name"), Some(&Value::from("pET-28")));
    assert_eq!(changes.get("concentration"), Some(&Value::from(75i64)));
    assert_eq!(text(&grid, 6, "concentration"), "75 ng/µL");
}

#[tokio::test]
async fn test_save_row_without_changes_is_silent() {
    let backend = RecordingBackend::new(plasmid_rows(5));
    let toasts = Arc::new(ToastQueue::new());
    let grid = server_grid(backend.clone(), toasts.clone());
    grid.load().await.unwrap();
    toasts.drain();

    grid.edit_row(&id(1)).unwrap();
    grid.save_row(&id(1)).await.unwrap();

    assert!(backend.updates().is_empty());
    assert!(toasts.is_empty());
}

// =============================================================================
// Delete and add
// =============================================================================

#[tokio::test]
async fn test_delete_refetches_current_page_after_delay() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();
    backend.clear_calls();

    grid.delete_row(&id(5)).await.unwrap();
    assert_eq!(backend.calls(), vec![Call::Delete(id(5))]);
    assert!(grid.visible_rows().iter().all(|row| row.id("id") != Some(id(5))));

    grid.settle().await;
    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    match &calls[1] {
        Call::Load(options) => {
            assert!(options.force_refresh);
            assert_eq!(options.page, 1);
            assert_eq!(options.page_size, 10);
        }
        other => panic!("expected a load, got {:?}", other),
    }

    let ids: Vec<RowId> = grid.visible_rows().iter().filter_map(|row| row.id("id")).collect();
    assert_eq!(ids.len(), 10);
    assert!(!ids.contains(&id(5)));
    assert!(ids.contains(&id(11)));
    assert_eq!(grid.page_info().total_count, 22);
}

#[tokio::test]
async fn test_delete_selected_refreshes_once() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();
    backend.clear_calls();

    grid.toggle_row(&id(2));
    grid.toggle_row(&id(3));
    assert_eq!(grid.selected_rows(), vec![id(2), id(3)]);

    assert_eq!(grid.delete_selected().await.unwrap(), 2);
    grid.settle().await;

    let loads = backend.loads();
    assert_eq!(loads.len(), 1);
    assert!(loads[0].force_refresh);
    assert!(grid.selected_rows().is_empty());
    assert_eq!(backend.store().len(), 21);
}

#[tokio::test]
async fn test_add_row_clears_cache_and_refreshes() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    let added = grid
        .add_row(Row::new().set("plasmid", "B").set("name", "pNew"))
        .await
        .unwrap();
    assert!(added.id("id").is_some());
    assert_eq!(backend.store().len(), 24);

    let last = backend.loads().pop().unwrap();
    assert!(last.force_refresh);
    assert_eq!(grid.page_info().total_pages, 3);
    assert_eq!(grid.page_info().total_count, 24);
}

// =============================================================================
// Sorting
// =============================================================================

#[tokio::test]
async fn test_server_sort_sends_toggled_column() {
    let backend = RecordingBackend::new(plasmid_rows(30));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    backend.clear_calls();
    grid.toggle_sort("concentration").await.unwrap();
    assert_eq!(grid.sort_state().primary(), Some(SortSpec::asc("concentration")));
    assert_eq!(grid.sort_state().len(), 1);

    grid.toggle_sort("concentration").await.unwrap();
    assert_eq!(grid.visible_rows()[0].id("id"), Some(id(30)));

    let sorts: Vec<_> = backend.loads().into_iter().map(|load| load.sort).collect();
    assert_eq!(
        sorts,
        vec![Some(SortSpec::asc("concentration")), Some(SortSpec::desc("concentration"))]
    );

    // third click turns sorting off
    grid.toggle_sort("concentration").await.unwrap();
    assert!(grid.sort_state().is_empty());
    assert_eq!(backend.loads().last().map(|load| load.sort.clone()), Some(None));
}

#[tokio::test]
async fn test_failed_server_sort_keeps_previous_order() {
    let backend = RecordingBackend::new(plasmid_rows(30));
    let grid = server_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    backend.set_fail_loads(true);
    assert!(grid.toggle_sort("name").await.is_err());
    assert_eq!(grid.sort_state().primary(), Some(SortSpec::asc("id")));
    assert_eq!(grid.visible_rows()[0].id("id"), Some(id(1)));

    backend.set_fail_loads(false);
    grid.toggle_sort("name").await.unwrap();
    assert_eq!(backend.loads().last().and_then(|load| load.sort.clone()), Some(SortSpec::asc("name")));
}

// =============================================================================
// Client-side mode
// =============================================================================

#[tokio::test]
async fn test_client_mode_filters_sorts_and_pages() {
    let backend = RecordingBackend::new(plasmid_rows(23));
    let grid = client_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();
    assert_eq!(grid.cache_status(), None);

    let info = grid.page_info();
    assert_eq!(info.total_pages, 3);
    assert_eq!(info.total_count, 23);

    grid.go_to_page(3).await.unwrap();
    assert_eq!(grid.visible_rows().len(), 3);

    grid.set_search_term("pUC-2").await.unwrap();
    assert_eq!(grid.page_info().current_page, 1);
    assert_eq!(grid.visible_rows().len(), 5);

    grid.set_search_field(SearchField::Field("plasmid".into()));
    assert!(grid.visible_rows().is_empty());

    grid.set_search_term("").await.unwrap();
    grid.toggle_sort("id").await.unwrap();
    assert_eq!(grid.visible_rows()[0].id("id"), Some(id(23)));

    // one fetch for everything
    assert_eq!(backend.loads().len(), 1);
}

#[tokio::test]
async fn test_client_mode_edit_updates_local_rows() {
    let backend = RecordingBackend::new(plasmid_rows(12));
    let grid = client_grid(backend.clone(), Arc::new(ToastQueue::new()));
    grid.load().await.unwrap();

    grid.cell_click(&id(1), "plasmid").await.unwrap();
    grid.cell_change(&id(1), "plasmid", "C").await.unwrap();
    assert_eq!(text(&grid, 1, "plasmid"), "C");

    grid.delete_row(&id(2)).await.unwrap();
    assert_eq!(grid.page_info().total_count, 11);
    assert!(grid.render_cell(&id(2), "name").is_err());
}

#[tokio::test]
async fn test_edit_disabled_grid_ignores_clicks() {
    let backend = RecordingBackend::new(plasmid_rows(3));
    let grid = DataGrid::builder(plasmid_schema())
        .config(GridConfig::default().with_edit_disabled(true))
        .backend(backend)
        .build()
        .unwrap();
    grid.load().await.unwrap();

    grid.cell_click(&id(1), "name").await.unwrap();
    assert!(!grid.edit_row(&id(1)).unwrap());
    assert_eq!(grid.edit_state(&id(1)), EditState::Viewing);
}
