//! User picker
//!
//! Headless state of the assignee picker: the popover's open state, the
//! current selection and the search query over the user directory.

mod filter;

pub use filter::*;

use crate::model::User;

/// Assignee picker state.
///
/// Selection changes return the new selection, which the caller feeds to
/// the edit tracker as the cell's new value.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::User;
/// use datagrid_lib::picker::UserPicker;
///
/// let ada = User::new("1", "Ada", "ada@example.com");
/// let mut picker = UserPicker::new(vec![ada.clone()], Vec::new()).multiple(true);
///
/// assert_eq!(picker.handle_select(&ada), Some(vec![ada]));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPicker {
    users: Vec<User>,
    selected: Vec<User>,
    multiple: bool,
    disabled: bool,
    open: bool,
    query: String,
}

impl UserPicker {
    pub fn new(users: Vec<User>, selected: Vec<User>) -> Self {
        Self {
            users,
            selected,
            ..Self::default()
        }
    }

    /// Allow several users at once.
    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Read-only picker.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens or closes the popover; a disabled picker stays closed.
    pub fn set_open(&mut self, open: bool) {
        self.open = open && !self.disabled;
        if !self.open {
            self.query.clear();
        }
    }

    pub fn selected(&self) -> &[User] {
        &self.selected
    }

    pub fn is_selected(&self, user_id: &str) -> bool {
        self.selected.iter().any(|u| u.id == user_id)
    }

    /// Picks `user`.
    ///
    /// In multiple mode this toggles the user; in single mode it replaces the
    /// selection and closes the popover. Returns `None` when disabled.
    pub fn handle_select(&mut self, user: &User) -> Option<Vec<User>> {
        if self.disabled {
            return None;
        }

        if self.multiple {
            if self.is_selected(&user.id) {
                self.selected.retain(|u| u.id != user.id);
            } else {
                self.selected.push(user.clone());
            }
        } else {
            self.selected = vec![user.clone()];
            self.set_open(false);
        }
        Some(self.selected.clone())
    }

    /// Removes a user from the selection. Returns `None` when disabled.
    pub fn handle_remove(&mut self, user_id: &str) -> Option<Vec<User>> {
        if self.disabled {
            return None;
        }
        self.selected.retain(|u| u.id != user_id);
        Some(self.selected.clone())
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Directory entries matching the query, best first, with their
    /// selection state.
    pub fn visible_users(&self) -> Vec<(&User, bool)> {
        fuzzy_filter(&self.query, &self.users)
            .into_iter()
            .map(|m| &self.users[m.index])
            .map(|user| (user, self.is_selected(&user.id)))
            .collect()
    }
}
