//! Cell component registry
//!
//! Columns name their renderer and editor; the registry maps those names to
//! [`CellComponent`] implementations. It is built explicitly at start-up
//! ([`ComponentRegistry::with_builtins`] plus any [`register`] calls) and
//! passed to whatever renders cells.
//!
//! [`register`]: ComponentRegistry::register

mod builtin;

pub use builtin::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::model::ColumnDefinition;
use crate::model::Row;
use crate::model::User;
use crate::model::Value;
use crate::picker::UserPicker;

/// Inputs of a cell component.
#[derive(Debug, Clone, Copy)]
pub struct CellProps<'a> {
    pub value: &'a Value,
    pub row: &'a Row,
    pub column: &'a ColumnDefinition,
    /// The user directory, for user editors.
    pub users: &'a [User],
}

impl<'a> CellProps<'a> {
    fn option(&self, key: &str) -> Option<&'a serde_json::Value> {
        self.column.config.options.get(key)
    }

    /// A string entry of the column's `options`.
    pub fn option_str(&self, key: &str) -> Option<&'a str> {
        self.option(key).and_then(serde_json::Value::as_str)
    }

    /// A boolean entry of the column's `options`, `false` when absent.
    pub fn option_bool(&self, key: &str) -> bool {
        self.option(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// A list-of-strings entry of the column's `options`.
    pub fn option_list(&self, key: &str) -> Option<Vec<String>> {
        let list = self.option(key)?.as_array()?;
        Some(
            list.iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        )
    }
}

/// Display output of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Empty,
    Text(String),
    Badge(String),
    Link { label: String, href: String },
    /// Avatars with names.
    Users(Vec<User>),
}

impl Rendered {
    /// Plain-text form, for hosts without rich cells.
    pub fn to_plain(&self) -> String {
        match self {
            Rendered::Empty => String::new(),
            Rendered::Text(text) | Rendered::Badge(text) => text.clone(),
            Rendered::Link { label, .. } => label.clone(),
            Rendered::Users(users) => users
                .iter()
                .map(|u| u.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// In-place editor of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorView {
    TextInput { value: String },
    NumberInput { value: Option<Decimal> },
    Select {
        value: String,
        choices: Vec<String>,
        placeholder: String,
    },
    UserPicker(UserPicker),
}

/// A named pair of view functions for one kind of cell.
pub trait CellComponent: Send + Sync {
    /// Display form.
    fn render(&self, props: &CellProps<'_>) -> Rendered;

    /// Editor form; `None` if the component cannot edit.
    fn edit(&self, _props: &CellProps<'_>) -> Option<EditorView> {
        None
    }
}

/// Name to component mapping.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Arc<dyn CellComponent>>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `text`, `number`, `link`, `tag` and `user`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("text", TextComponent);
        registry.register("number", NumberComponent);
        registry.register("link", LinkComponent);
        registry.register("tag", TagComponent);
        registry.register("user", UserComponent);
        registry
    }

    /// Registers `component` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, component: impl CellComponent + 'static) {
        self.components.insert(name.into(), Arc::new(component));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CellComponent>> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Renders one cell of `row` with the column's renderer.
    ///
    /// An unknown renderer falls back to the value's text.
    pub fn render(&self, column: &ColumnDefinition, row: &Row, users: &[User]) -> Rendered {
        let null = Value::Null;
        let props = CellProps {
            value: row.get(&column.key).unwrap_or(&null),
            row,
            column,
            users,
        };
        match self.get(column.renderer_name()) {
            Some(component) => component.render(&props),
            None => {
                log::warn!("No component '{}' for column {}", column.renderer_name(), column.key);
                Rendered::Text(props.value.display_text())
            }
        }
    }

    /// Builds the editor for one cell, `value` being the current draft.
    pub fn editor(&self, column: &ColumnDefinition, row: &Row, value: &Value, users: &[User]) -> Option<EditorView> {
        let props = CellProps {
            value,
            row,
            column,
            users,
        };
        match self.get(column.editor_name()) {
            Some(component) => component.edit(&props),
            None => {
                log::warn!("No editor '{}' for column {}", column.editor_name(), column.key);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnKind;

    struct Shouting;

    impl CellComponent for Shouting {
        fn render(&self, props: &CellProps<'_>) -> Rendered {
            Rendered::Text(props.value.display_text().to_uppercase())
        }
    }

    fn row() -> Row {
        Row::new()
            .set("id", 7i64)
            .set("name", "pUC19")
            .set("volume", 250i64)
            .set("plasmid", "A")
            .set("owner", vec![User::new("1", "Ada", "ada@example.com")])
    }

    #[test]
    fn test_builtins_render() {
        let registry = ComponentRegistry::with_builtins();
        let row = row();

        let volume = ColumnDefinition::new(
            "volume",
            "Volume",
            ColumnKind::Number {
                unit: Some("ul".into()),
            },
        );
        assert_eq!(registry.render(&volume, &row, &[]), Rendered::Text("250 ul".into()));

        let link = ColumnDefinition::new(
            "id",
            "Id",
            ColumnKind::Link {
                base_url: "/items/".into(),
            },
        );
        assert_eq!(
            registry.render(&link, &row, &[]),
            Rendered::Link {
                label: "7".into(),
                href: "/items/7".into()
            }
        );

        let owner = ColumnDefinition::new("owner", "Owner", ColumnKind::User { multiple: false });
        assert_eq!(registry.render(&owner, &row, &[]).to_plain(), "Ada");

        let missing = ColumnDefinition::new("missing", "Missing", ColumnKind::Text);
        assert_eq!(registry.render(&missing, &row, &[]), Rendered::Empty);
    }

    #[test]
    fn test_tag_editor_lists_choices() {
        let registry = ComponentRegistry::with_builtins();
        let row = row();
        let plasmid = ColumnDefinition::new("plasmid", "Plasmid", ColumnKind::Tag)
            .option("choices", serde_json::json!(["A", "B"]));

        let editor = registry.editor(&plasmid, &row, &Value::from("A"), &[]);
        assert_eq!(
            editor,
            Some(EditorView::Select {
                value: "A".into(),
                choices: vec!["A".into(), "B".into()],
                placeholder: "Select option".into(),
            })
        );
    }

    #[test]
    fn test_user_editor_is_picker() {
        let registry = ComponentRegistry::with_builtins();
        let row = row();
        let directory = vec![User::new("1", "Ada", "ada@example.com"), User::new("2", "Grace", "")];
        let owner = ColumnDefinition::new("owner", "Owner", ColumnKind::User { multiple: true });

        let Some(EditorView::UserPicker(picker)) = registry.editor(&owner, &row, row.get("owner").unwrap_or(&Value::Null), &directory) else {
            panic!("expected a user picker");
        };
        assert!(picker.is_multiple());
        assert!(picker.is_selected("1"));
        assert_eq!(picker.visible_users().len(), 2);
    }

    #[test]
    fn test_custom_component_and_fallback() {
        let mut registry = ComponentRegistry::with_builtins();
        registry.register("shout", Shouting);
        let row = row();

        let name = ColumnDefinition::new("name", "Name", ColumnKind::Text).renderer("shout");
        assert_eq!(registry.render(&name, &row, &[]), Rendered::Text("PUC19".into()));
        assert_eq!(registry.editor(&name, &row, &Value::from("x"), &[]), None);

        let unknown = ColumnDefinition::new("name", "Name", ColumnKind::Text).renderer("sparkline");
        assert_eq!(registry.render(&unknown, &row, &[]), Rendered::Text("pUC19".into()));
    }

    #[test]
    fn test_number_input_parsing() {
        assert_eq!(parse_number_input("12.5"), Some(Value::Number(Decimal::new(125, 1))));
        assert_eq!(parse_number_input(""), Some(Value::Null));
        assert_eq!(parse_number_input("abc"), None);
    }
}
