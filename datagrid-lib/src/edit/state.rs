//! Edit states and the outcomes of edit events.

use crate::model::Row;
use crate::model::RowId;

/// Edit state of one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Viewing,
    /// One cell of the row is being edited.
    EditingCell(String),
    /// Every cell of the row is editable until save or cancel.
    EditingRow,
}

/// A change to send to the update collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub row_id: RowId,
    /// Only the keys whose values changed.
    pub changes: Row,
    /// Notification title, e.g. `"Status updated"`.
    pub label: String,
}

/// Result of a value change inside an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOutcome {
    /// The cell is not being edited.
    Ignored,
    /// Stored as a draft; committed later by blur or row save.
    Pending,
    /// Committed at once; leave edit mode on the next scheduling turn with
    /// [`EditTracker::finish_deferred_exit`](super::EditTracker::finish_deferred_exit).
    DeferredExit(Option<RowUpdate>),
}

/// Result of focus leaving a cell or of a pointer press.
#[derive(Debug, Clone, PartialEq)]
pub enum BlurOutcome {
    /// No cell edit was affected.
    Ignored,
    /// The press landed on the edited cell's own dropdown or popover.
    Suppressed,
    /// The column keeps its editor open on blur.
    Persisted,
    /// Edit mode has been left; the draft (if changed) is to be committed.
    Committed(Option<RowUpdate>),
    /// Edit mode is left on the next scheduling turn so the editor's own click
    /// handling runs first.
    DeferredExit(Option<RowUpdate>),
}

impl BlurOutcome {
    /// The update to send, if any.
    pub fn update(&self) -> Option<&RowUpdate> {
        match self {
            BlurOutcome::Committed(update) | BlurOutcome::DeferredExit(update) => update.as_ref(),
            _ => None,
        }
    }
}

/// Where a pointer press landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// Inside a grid cell.
    Cell { row: RowId, key: String },
    /// Inside floating UI (dropdown, popover) opened by a cell's editor.
    Overlay { row: RowId, key: String },
    /// Anywhere else.
    Outside,
}
