//! Row and cell edit state tracking
//!
//! [`EditTracker`] is a synchronous state machine over the rows currently
//! shown. Each row is [`Viewing`](EditState::Viewing), editing one cell, or
//! editing the whole row; at most one cell is edited at a time across the
//! grid. Drafts are seeded from the authoritative rows and every commit is
//! diffed against them, so an unchanged value never produces a
//! [`RowUpdate`].
//!
//! The tracker performs no I/O: it returns the updates to send and the grid
//! reports back with [`EditTracker::confirm`] or [`EditTracker::rollback`].

mod selection;
mod state;

pub use selection::*;
pub use state::*;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::model::ColumnDefinition;
use crate::model::GridSchema;
use crate::model::Row;
use crate::model::RowId;
use crate::model::SaveEvent;
use crate::model::Value;

/// Per-row edit state, drafts and selection for the visible rows.
#[derive(Debug, Clone)]
pub struct EditTracker {
    schema: Arc<GridSchema>,
    edit_disabled: bool,
    /// Visible row ids in display order.
    order: Vec<RowId>,
    rows: HashMap<RowId, Row>,
    drafts: HashMap<RowId, Row>,
    states: HashMap<RowId, EditState>,
    active_cell: Option<RowId>,
    pending_exit: Option<(RowId, String)>,
    selection: Selection<RowId>,
}

impl EditTracker {
    /// Creates a tracker with no rows.
    pub fn new(schema: Arc<GridSchema>) -> Self {
        Self {
            schema,
            edit_disabled: false,
            order: Vec::new(),
            rows: HashMap::new(),
            drafts: HashMap::new(),
            states: HashMap::new(),
            active_cell: None,
            pending_exit: None,
            selection: Selection::new(),
        }
    }

    /// Refuses every cell and row edit.
    pub fn with_edit_disabled(mut self, disabled: bool) -> Self {
        self.edit_disabled = disabled;
        self
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replaces the authoritative rows.
    ///
    /// Drafts of rows that are not in row-edit mode are reseeded, which also
    /// rolls back any optimistic value a failed commit left behind. Rows that
    /// disappeared lose their edit state.
    pub fn sync(&mut self, rows: &[Row]) {
        let unique_key = self.schema.unique_key.as_str();
        self.order.clear();
        self.rows.clear();
        for row in rows {
            let Some(id) = row.id(unique_key) else {
                log::warn!("Row without '{}' ignored by edit tracker", unique_key);
                continue;
            };
            self.order.push(id.clone());
            self.rows.insert(id, row.clone());
        }

        self.states.retain(|id, _| self.rows.contains_key(id));
        self.drafts.retain(|id, _| self.rows.contains_key(id));
        for (id, row) in &self.rows {
            if self.states.get(id) != Some(&EditState::EditingRow) {
                self.drafts.insert(id.clone(), row.clone());
            }
        }

        if self.active_cell.as_ref().is_some_and(|id| !self.rows.contains_key(id)) {
            self.active_cell = None;
        }
        if self.pending_exit.as_ref().is_some_and(|(id, _)| !self.rows.contains_key(id)) {
            self.pending_exit = None;
        }
    }

    /// The authoritative row.
    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.get(id)
    }

    /// Visible row ids in display order.
    pub fn row_ids(&self) -> &[RowId] {
        &self.order
    }

    /// The value to show for a cell: the draft while editing, else the
    /// authoritative value.
    pub fn display_value(&self, id: &RowId, key: &str) -> Option<&Value> {
        let source = if self.is_editing(id, key) {
            self.drafts.get(id)
        } else {
            self.rows.get(id)
        };
        source.and_then(|row| row.get(key))
    }

    // =========================================================================
    // State queries
    // =========================================================================

    pub fn state(&self, id: &RowId) -> EditState {
        self.states.get(id).cloned().unwrap_or_default()
    }

    /// Whether the cell currently shows its editor.
    pub fn is_editing(&self, id: &RowId, key: &str) -> bool {
        match self.states.get(id) {
            Some(EditState::EditingRow) => true,
            Some(EditState::EditingCell(editing)) => editing == key,
            _ => false,
        }
    }

    /// The cell being edited on its own, if any.
    pub fn editing_cell(&self) -> Option<(&RowId, &str)> {
        let id = self.active_cell.as_ref()?;
        match self.states.get(id) {
            Some(EditState::EditingCell(key)) => Some((id, key.as_str())),
            _ => None,
        }
    }

    /// Rows in row-edit mode.
    pub fn editing_rows(&self) -> Vec<&RowId> {
        self.order
            .iter()
            .filter(|id| self.states.get(*id) == Some(&EditState::EditingRow))
            .collect()
    }

    // =========================================================================
    // Cell editing
    // =========================================================================

    /// Enters cell-edit mode.
    ///
    /// Link columns, columns flagged `edit_disabled`, a disabled grid and rows
    /// in row-edit mode leave the state unchanged. Moving from another cell
    /// commits that cell first; its update is returned.
    pub fn cell_click(&mut self, id: &RowId, key: &str) -> Result<Option<RowUpdate>, Error> {
        self.require_row(id)?;
        let column = self.column(key)?;
        if self.edit_disabled || !column.is_editable() {
            return Ok(None);
        }
        if self.state(id) == EditState::EditingRow {
            return Ok(None);
        }
        if self.editing_cell() == Some((id, key)) {
            return Ok(None);
        }

        let committed = match self.editing_cell() {
            Some((previous, previous_key)) => {
                let (previous, previous_key) = (previous.clone(), previous_key.to_string());
                let update = self.commit_cell(&previous, &previous_key);
                self.leave_cell(&previous);
                update
            }
            None => None,
        };

        self.states.insert(id.clone(), EditState::EditingCell(key.to_string()));
        self.active_cell = Some(id.clone());
        Ok(committed)
    }

    /// Records a new editor value.
    ///
    /// Columns that save on change commit at once (only the changed key) and
    /// leave edit mode on the next turn.
    pub fn cell_change(&mut self, id: &RowId, key: &str, value: Value) -> Result<ChangeOutcome, Error> {
        self.require_row(id)?;
        let save_event = self.column(key)?.commit_on();

        match self.state(id) {
            EditState::EditingRow => {
                self.draft_mut(id).insert(key, value);
                Ok(ChangeOutcome::Pending)
            }
            EditState::EditingCell(editing) if editing == key => {
                self.draft_mut(id).insert(key, value);
                if save_event == SaveEvent::Change {
                    let update = self.commit_cell(id, key);
                    self.pending_exit = Some((id.clone(), key.to_string()));
                    Ok(ChangeOutcome::DeferredExit(update))
                } else {
                    Ok(ChangeOutcome::Pending)
                }
            }
            _ => Ok(ChangeOutcome::Ignored),
        }
    }

    /// Focus left the cell.
    pub fn cell_blur(&mut self, id: &RowId, key: &str) -> BlurOutcome {
        if self.editing_cell() != Some((id, key)) {
            return BlurOutcome::Ignored;
        }
        self.leave_editing_cell()
    }

    /// A pointer press somewhere in the document.
    ///
    /// A press inside the edited cell, or on floating UI that cell's editor
    /// opened, is not a blur.
    pub fn pointer_down(&mut self, target: &PointerTarget) -> BlurOutcome {
        let Some((id, key)) = self.editing_cell() else {
            return BlurOutcome::Ignored;
        };
        match target {
            PointerTarget::Cell { row, key: target_key } if row == id && target_key == key => {
                BlurOutcome::Ignored
            }
            PointerTarget::Overlay { row, key: target_key } if row == id && target_key == key => {
                BlurOutcome::Suppressed
            }
            _ => self.leave_editing_cell(),
        }
    }

    fn leave_editing_cell(&mut self) -> BlurOutcome {
        let Some((id, key)) = self.editing_cell() else {
            return BlurOutcome::Ignored;
        };
        let (id, key) = (id.clone(), key.to_string());
        let Some(column) = self.schema.get_column(&key) else {
            self.leave_cell(&id);
            return BlurOutcome::Committed(None);
        };

        if column.config.persist_cell_edit_on_blur {
            return BlurOutcome::Persisted;
        }

        // editors with floating UI handle their own clicks before the exit
        let deferred = column.commit_on() == SaveEvent::Change || column.is_tag() || column.is_user();
        let update = self.commit_cell(&id, &key);
        if deferred {
            self.pending_exit = Some((id, key));
            BlurOutcome::DeferredExit(update)
        } else {
            self.leave_cell(&id);
            BlurOutcome::Committed(update)
        }
    }

    /// Second phase of a deferred exit.
    ///
    /// Returns `true` if the cell left edit mode. Does nothing if the user
    /// moved to another cell in the meantime.
    pub fn finish_deferred_exit(&mut self) -> bool {
        let Some((id, key)) = self.pending_exit.take() else {
            return false;
        };
        if self.editing_cell() != Some((&id, key.as_str())) {
            return false;
        }
        self.leave_cell(&id);
        true
    }

    fn commit_cell(&self, id: &RowId, key: &str) -> Option<RowUpdate> {
        let draft = self.drafts.get(id)?.get(key).cloned().unwrap_or(Value::Null);
        let current = self
            .rows
            .get(id)
            .and_then(|row| row.get(key))
            .cloned()
            .unwrap_or(Value::Null);
        if draft == current {
            return None;
        }

        let label = match self.schema.get_column(key) {
            Some(column) => format!("{} updated", column.header),
            None => "Field updated".to_string(),
        };
        Some(RowUpdate {
            row_id: id.clone(),
            changes: Row::new().set(key, draft),
            label,
        })
    }

    fn leave_cell(&mut self, id: &RowId) {
        if matches!(self.states.get(id), Some(EditState::EditingCell(_))) {
            self.states.remove(id);
        }
        if self.active_cell.as_ref() == Some(id) {
            self.active_cell = None;
        }
        if self.pending_exit.as_ref().is_some_and(|(pending, _)| pending == id) {
            self.pending_exit = None;
        }
    }

    // =========================================================================
    // Row editing
    // =========================================================================

    /// Enters row-edit mode, seeding the draft from the authoritative row.
    ///
    /// Returns `false` when editing is disabled.
    pub fn edit_row(&mut self, id: &RowId) -> Result<bool, Error> {
        let row = self.require_row(id)?.clone();
        if self.edit_disabled {
            return Ok(false);
        }
        self.leave_cell(id);
        self.drafts.insert(id.clone(), row);
        self.states.insert(id.clone(), EditState::EditingRow);
        Ok(true)
    }

    /// Leaves row-edit mode, returning the changed keys if there are any.
    pub fn save_row(&mut self, id: &RowId) -> Result<Option<RowUpdate>, Error> {
        let current = self.require_row(id)?;
        if self.state(id) != EditState::EditingRow {
            return Ok(None);
        }

        let changes = match self.drafts.get(id) {
            Some(draft) => draft.changes_from(current),
            None => Row::new(),
        };
        self.states.remove(id);

        if changes.is_empty() {
            log::debug!("Row {} saved without changes", id);
            return Ok(None);
        }
        Ok(Some(RowUpdate {
            row_id: id.clone(),
            changes,
            label: "Row updated".to_string(),
        }))
    }

    /// Leaves row-edit mode and discards the draft.
    pub fn cancel_row(&mut self, id: &RowId) -> Result<(), Error> {
        let row = self.require_row(id)?.clone();
        self.states.remove(id);
        self.drafts.insert(id.clone(), row);
        Ok(())
    }

    // =========================================================================
    // Commit results
    // =========================================================================

    /// The backend accepted `update`; fold it into the authoritative row.
    pub fn confirm(&mut self, update: &RowUpdate) {
        if let Some(row) = self.rows.get_mut(&update.row_id) {
            row.apply(&update.changes);
        }
        if let Some(draft) = self.drafts.get_mut(&update.row_id) {
            draft.apply(&update.changes);
        }
    }

    /// The backend refused an update; reset the draft to the authoritative row.
    pub fn rollback(&mut self, id: &RowId) {
        if let Some(row) = self.rows.get(id) {
            self.drafts.insert(id.clone(), row.clone());
        }
    }

    /// Drops every trace of a deleted row.
    pub fn forget(&mut self, id: &RowId) {
        self.leave_cell(id);
        self.states.remove(id);
        self.drafts.remove(id);
        self.rows.remove(id);
        self.order.retain(|visible| visible != id);
        self.selection.deselect(id);
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Returns `true` if the row is now selected.
    pub fn toggle_row(&mut self, id: &RowId) -> bool {
        self.selection.toggle(id.clone())
    }

    /// Selects every visible row, or none.
    pub fn toggle_all(&mut self, checked: bool) {
        if checked {
            self.selection.select_all(self.order.iter().cloned());
        } else {
            self.selection.clear();
        }
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selection.is_selected(id)
    }

    /// Selected visible rows in display order.
    pub fn selected_rows(&self) -> Vec<RowId> {
        self.order
            .iter()
            .filter(|id| self.selection.is_selected(id))
            .cloned()
            .collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_row(&self, id: &RowId) -> Result<&Row, Error> {
        self.rows.get(id).ok_or_else(|| Error::UnknownRow(id.to_string()))
    }

    fn column(&self, key: &str) -> Result<&ColumnDefinition, Error> {
        self.schema
            .get_column(key)
            .ok_or_else(|| Error::UnknownColumn(key.to_string()))
    }

    fn draft_mut(&mut self, id: &RowId) -> &mut Row {
        let seed = self.rows.get(id).cloned().unwrap_or_default();
        self.drafts.entry(id.clone()).or_insert(seed)
    }
}
