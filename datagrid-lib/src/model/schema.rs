//! Grid schema: column declarations and row identity

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// The declared type of a column.
///
/// The kind decides which [`Value`](super::Value) variant the column holds,
/// which built-in component renders it, and how the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ColumnKind {
    /// Navigational link; the cell value is appended to `base_url`.
    Link { base_url: String },
    /// Single tag shown as a badge.
    Tag,
    /// Number with an optional unit suffix.
    Number {
        #[serde(default)]
        unit: Option<String>,
    },
    /// Free text.
    Text,
    /// Assigned users.
    User {
        #[serde(default)]
        multiple: bool,
    },
}

impl ColumnKind {
    /// Name of the built-in component for this kind.
    pub fn default_component(&self) -> &'static str {
        match self {
            ColumnKind::Link { .. } => "link",
            ColumnKind::Tag => "tag",
            ColumnKind::Number { .. } => "number",
            ColumnKind::Text => "text",
            ColumnKind::User { .. } => "user",
        }
    }
}

/// When an in-progress cell edit is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveEvent {
    /// Commit when focus leaves the cell.
    #[default]
    Blur,
    /// Commit as soon as the value changes.
    Change,
}

/// Per-column component configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnConfig {
    /// Registered renderer name; the kind's built-in when absent.
    pub renderer: Option<String>,
    /// Registered editor name; the renderer name when absent.
    pub editor: Option<String>,
    /// Commit policy.
    pub save_event: SaveEvent,
    /// Keep the cell in edit mode when focus leaves it.
    pub persist_cell_edit_on_blur: bool,
    /// Free-form options passed to the component.
    pub options: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

/// One column of the grid.
///
/// # Example
///
/// ```
/// use datagrid_lib::model::{ColumnDefinition, ColumnKind, SaveEvent};
///
/// let column = ColumnDefinition::new("plasmid", "Plasmid", ColumnKind::Tag)
///     .db_field("plasmid_name")
///     .save_event(SaveEvent::Change);
///
/// assert_eq!(column.storage_field(), "plasmid_name");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Unique column key, also the row field name.
    pub key: String,
    /// Header label.
    pub header: String,
    /// Layout hint for hosts that render widths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Storage field name when it differs from `key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_field: Option<String>,
    /// Declared column type.
    #[serde(flatten)]
    pub kind: ColumnKind,
    /// Refuse in-place editing.
    #[serde(default)]
    pub edit_disabled: bool,
    /// Allow sorting on this column.
    #[serde(default = "default_true")]
    pub sortable: bool,
    /// Allow searching on this column.
    #[serde(default = "default_true")]
    pub filterable: bool,
    /// Component configuration.
    #[serde(default)]
    pub config: ColumnConfig,
}

impl ColumnDefinition {
    /// Creates a column with default configuration.
    pub fn new(key: impl Into<String>, header: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            width: None,
            db_field: None,
            kind,
            edit_disabled: false,
            sortable: true,
            filterable: true,
            config: ColumnConfig::default(),
        }
    }

    /// Sets the storage field name.
    pub fn db_field(mut self, field: impl Into<String>) -> Self {
        self.db_field = Some(field.into());
        self
    }

    /// Sets the commit policy.
    pub fn save_event(mut self, event: SaveEvent) -> Self {
        self.config.save_event = event;
        self
    }

    /// Refuses in-place editing.
    pub fn edit_disabled(mut self) -> Self {
        self.edit_disabled = true;
        self
    }

    /// Keeps the cell in edit mode on blur.
    pub fn persist_on_blur(mut self) -> Self {
        self.config.persist_cell_edit_on_blur = true;
        self
    }

    /// Uses a registered renderer instead of the built-in.
    pub fn renderer(mut self, name: impl Into<String>) -> Self {
        self.config.renderer = Some(name.into());
        self
    }

    /// Uses a registered editor instead of the renderer's.
    pub fn editor(mut self, name: impl Into<String>) -> Self {
        self.config.editor = Some(name.into());
        self
    }

    /// Adds a component option.
    pub fn option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.options.insert(key.into(), value);
        self
    }

    /// Name of the component that renders this column.
    pub fn renderer_name(&self) -> &str {
        self.config
            .renderer
            .as_deref()
            .unwrap_or_else(|| self.kind.default_component())
    }

    /// Name of the component that edits this column.
    pub fn editor_name(&self) -> &str {
        self.config.editor.as_deref().unwrap_or_else(|| self.renderer_name())
    }

    /// Storage field name.
    pub fn storage_field(&self) -> &str {
        self.db_field.as_deref().unwrap_or(&self.key)
    }

    /// Commit policy.
    pub fn commit_on(&self) -> SaveEvent {
        self.config.save_event
    }

    /// Links navigate; they are never edited in place.
    pub fn is_link(&self) -> bool {
        self.renderer_name() == "link"
    }

    /// Whether the column renders assigned users.
    pub fn is_user(&self) -> bool {
        self.renderer_name() == "user" || matches!(self.kind, ColumnKind::User { .. })
    }

    /// Whether the column renders a tag.
    pub fn is_tag(&self) -> bool {
        self.renderer_name() == "tag"
    }

    /// Whether a cell of this column may enter edit mode.
    pub fn is_editable(&self) -> bool {
        !self.edit_disabled && !self.is_link()
    }
}

/// The full column schema of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSchema {
    /// Columns in display order.
    pub columns: Vec<ColumnDefinition>,
    /// Row field that identifies a row.
    #[serde(default = "default_unique_key")]
    pub unique_key: String,
}

fn default_unique_key() -> String {
    "id".to_string()
}

impl Default for GridSchema {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            unique_key: default_unique_key(),
        }
    }
}

impl GridSchema {
    /// Creates an empty schema keyed on `unique_key`.
    pub fn new(unique_key: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            unique_key: unique_key.into(),
        }
    }

    /// Appends a column.
    pub fn column(mut self, column: ColumnDefinition) -> Self {
        self.columns.push(column);
        self
    }

    /// Looks up a column by key.
    pub fn get_column(&self, key: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Parses a schema from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let schema: GridSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Checks that column keys are unique and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, column) in self.columns.iter().enumerate() {
            if column.key.is_empty() {
                return Err(ConfigError::invalid(format!("column {} has an empty key", index)));
            }
            if self.columns[..index].iter().any(|c| c.key == column.key) {
                return Err(ConfigError::invalid(format!("duplicate column key '{}'", column.key)));
            }
        }
        if self.unique_key.is_empty() {
            return Err(ConfigError::invalid("unique key must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_schema() {
        let json = r#"{
            "uniqueKey": "id",
            "columns": [
                {"key": "id", "header": "ID", "type": "link", "baseUrl": "/plasmids/", "editDisabled": true},
                {"key": "plasmid", "header": "Plasmid", "type": "tag", "dbField": "plasmid_name",
                 "config": {"saveEvent": "change"}},
                {"key": "volume", "header": "Volume", "type": "number", "unit": "ul", "dbField": "volume_ul"},
                {"key": "assignees", "header": "Assignees", "type": "user", "multiple": true}
            ]
        }"#;

        let schema = GridSchema::from_json(json).unwrap();
        assert_eq!(schema.columns.len(), 4);

        let id = schema.get_column("id").unwrap();
        assert!(id.is_link());
        assert!(!id.is_editable());

        let plasmid = schema.get_column("plasmid").unwrap();
        assert_eq!(plasmid.commit_on(), SaveEvent::Change);
        assert_eq!(plasmid.storage_field(), "plasmid_name");

        let volume = schema.get_column("volume").unwrap();
        assert_eq!(
            volume.kind,
            ColumnKind::Number {
                unit: Some("ul".to_string())
            }
        );
        assert!(schema.get_column("assignees").unwrap().is_user());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let schema = GridSchema::new("id")
            .column(ColumnDefinition::new("name", "Name", ColumnKind::Text))
            .column(ColumnDefinition::new("name", "Again", ColumnKind::Text));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_custom_renderer_overrides_kind() {
        let column = ColumnDefinition::new("owner", "Owner", ColumnKind::Text).renderer("link");
        assert!(column.is_link());
        assert_eq!(column.editor_name(), "link");
    }
}
