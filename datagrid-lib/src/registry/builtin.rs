//! Built-in cell components: text, number, link, tag and user.

use rust_decimal::Decimal;

use super::CellComponent;
use super::CellProps;
use super::EditorView;
use super::Rendered;
use crate::model::ColumnKind;
use crate::model::Value;
use crate::picker::UserPicker;

/// Plain text.
pub struct TextComponent;

impl CellComponent for TextComponent {
    fn render(&self, props: &CellProps<'_>) -> Rendered {
        if props.value.is_null() {
            return Rendered::Empty;
        }
        Rendered::Text(props.value.display_text())
    }

    fn edit(&self, props: &CellProps<'_>) -> Option<EditorView> {
        Some(EditorView::TextInput {
            value: props.value.display_text(),
        })
    }
}

/// Number with an optional unit suffix.
pub struct NumberComponent;

impl NumberComponent {
    fn unit(props: &CellProps<'_>) -> Option<String> {
        match &props.column.kind {
            ColumnKind::Number { unit: Some(unit) } => Some(unit.clone()),
            _ => props.option_str("unit").map(str::to_string),
        }
    }
}

impl CellComponent for NumberComponent {
    fn render(&self, props: &CellProps<'_>) -> Rendered {
        if props.value.is_null() {
            return Rendered::Empty;
        }
        let text = props.value.display_text();
        match Self::unit(props) {
            Some(unit) => Rendered::Text(format!("{} {}", text, unit)),
            None => Rendered::Text(text),
        }
    }

    fn edit(&self, props: &CellProps<'_>) -> Option<EditorView> {
        Some(EditorView::NumberInput {
            value: props.value.as_number(),
        })
    }
}

/// Parses number editor input; text that is not a number is rejected.
pub fn parse_number_input(input: &str) -> Option<Value> {
    let input = input.trim();
    if input.is_empty() {
        return Some(Value::Null);
    }
    input
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(input).ok())
        .map(Value::Number)
}

/// Navigational link to `base_url` + value.
pub struct LinkComponent;

impl CellComponent for LinkComponent {
    fn render(&self, props: &CellProps<'_>) -> Rendered {
        if props.value.is_null() {
            return Rendered::Empty;
        }
        let base_url = match &props.column.kind {
            ColumnKind::Link { base_url } => base_url.as_str(),
            _ => props.option_str("baseUrl").unwrap_or(""),
        };
        let label = props.value.display_text();
        Rendered::Link {
            href: format!("{}{}", base_url, label),
            label,
        }
    }

    fn edit(&self, props: &CellProps<'_>) -> Option<EditorView> {
        Some(EditorView::TextInput {
            value: props.value.display_text(),
        })
    }
}

/// Badge; edited with a select over the column's choices.
pub struct TagComponent;

impl CellComponent for TagComponent {
    fn render(&self, props: &CellProps<'_>) -> Rendered {
        if props.value.is_null() {
            return Rendered::Empty;
        }
        Rendered::Badge(props.value.display_text())
    }

    fn edit(&self, props: &CellProps<'_>) -> Option<EditorView> {
        let choices = ["choices", "options"]
            .iter()
            .find_map(|key| props.option_list(key))
            .unwrap_or_default();
        Some(EditorView::Select {
            value: props.value.display_text(),
            choices,
            placeholder: props
                .option_str("placeholder")
                .unwrap_or("Select option")
                .to_string(),
        })
    }
}

/// Assigned users; edited with the user picker.
pub struct UserComponent;

impl UserComponent {
    fn multiple(props: &CellProps<'_>) -> bool {
        match props.column.kind {
            ColumnKind::User { multiple } => multiple,
            _ => props.option_bool("multiple"),
        }
    }
}

impl CellComponent for UserComponent {
    fn render(&self, props: &CellProps<'_>) -> Rendered {
        match props.value {
            Value::Users(users) if !users.is_empty() => Rendered::Users(users.clone()),
            _ => Rendered::Empty,
        }
    }

    fn edit(&self, props: &CellProps<'_>) -> Option<EditorView> {
        let selected = props.value.as_users().map(<[_]>::to_vec).unwrap_or_default();
        let picker = UserPicker::new(props.users.to_vec(), selected).multiple(Self::multiple(props));
        Some(EditorView::UserPicker(picker))
    }
}
