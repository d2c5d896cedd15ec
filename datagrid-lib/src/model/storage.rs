//! Mapping between grid rows and backend storage records
//!
//! UI column keys and storage field names differ (`dbField`), and user-list
//! columns are stored as a flat JSON string. The mapping lives here so no
//! renderer or backend has to repeat it.

use serde_json::Map;

use super::ColumnDefinition;
use super::ColumnKind;
use super::GridSchema;
use super::Row;
use super::User;
use super::Value;
use crate::error::StorageError;

impl GridSchema {
    /// Converts a (possibly partial) row to its storage record.
    ///
    /// Only fields that belong to a schema column are written; the unique key
    /// is always carried under its own name when it is not a column.
    pub fn to_storage(&self, row: &Row) -> Map<String, serde_json::Value> {
        let mut record = Map::new();

        for column in &self.columns {
            if let Some(value) = row.get(&column.key) {
                record.insert(column.storage_field().to_string(), store_value(column, value));
            }
        }

        if self.get_column(&self.unique_key).is_none() {
            if let Some(id) = row.get(&self.unique_key) {
                record.insert(self.unique_key.clone(), id.to_json());
            }
        }

        record
    }

    /// Converts a storage record back to a row.
    pub fn from_storage(&self, record: &Map<String, serde_json::Value>) -> Result<Row, StorageError> {
        let mut row = Row::new();

        for column in &self.columns {
            if let Some(stored) = record.get(column.storage_field()) {
                row.insert(column.key.clone(), load_value(column, stored)?);
            }
        }

        if self.get_column(&self.unique_key).is_none() {
            if let Some(id) = record.get(&self.unique_key) {
                row.insert(self.unique_key.clone(), Value::from_json(id));
            }
        }

        Ok(row)
    }
}

fn store_value(column: &ColumnDefinition, value: &Value) -> serde_json::Value {
    match (&column.kind, value) {
        (ColumnKind::User { .. }, Value::Users(users)) => {
            serde_json::Value::String(serde_json::to_string(users).unwrap_or_else(|_| "[]".to_string()))
        }
        (ColumnKind::User { .. }, Value::Null) => serde_json::Value::String("[]".to_string()),
        _ => value.to_json(),
    }
}

fn load_value(column: &ColumnDefinition, stored: &serde_json::Value) -> Result<Value, StorageError> {
    match &column.kind {
        ColumnKind::User { .. } => match stored {
            serde_json::Value::Null => Ok(Value::Users(Vec::new())),
            serde_json::Value::String(s) if s.is_empty() => Ok(Value::Users(Vec::new())),
            serde_json::Value::String(s) => serde_json::from_str::<Vec<User>>(s)
                .map(Value::Users)
                .map_err(|e| StorageError::InvalidUserList {
                    column: column.key.clone(),
                    message: e.to_string(),
                }),
            serde_json::Value::Array(_) => serde_json::from_value::<Vec<User>>(stored.clone())
                .map(Value::Users)
                .map_err(|e| StorageError::InvalidUserList {
                    column: column.key.clone(),
                    message: e.to_string(),
                }),
            other => Err(StorageError::UnsupportedValue {
                column: column.key.clone(),
                actual: json_type_name(other),
            }),
        },
        ColumnKind::Number { .. } => match stored {
            serde_json::Value::Null | serde_json::Value::Number(_) => Ok(Value::from_json(stored)),
            other => Err(StorageError::UnsupportedValue {
                column: column.key.clone(),
                actual: json_type_name(other),
            }),
        },
        ColumnKind::Link { .. } | ColumnKind::Tag | ColumnKind::Text => Ok(Value::from_json(stored)),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> GridSchema {
        GridSchema::new("id")
            .column(ColumnDefinition::new("id", "ID", ColumnKind::Text).db_field("id"))
            .column(ColumnDefinition::new("plasmid", "Plasmid", ColumnKind::Tag).db_field("plasmid_name"))
            .column(
                ColumnDefinition::new("assignees", "Assignees", ColumnKind::User { multiple: true })
                    .db_field("assignees"),
            )
    }

    #[test]
    fn test_to_storage_renames_and_stringifies() {
        let row = Row::new()
            .set("id", "p-1")
            .set("plasmid", "pUC19")
            .set("assignees", vec![User::new("u1", "Ada", "ada@lab.org")]);

        let record = schema().to_storage(&row);
        assert_eq!(record["plasmid_name"], serde_json::json!("pUC19"));
        assert!(record["assignees"].is_string());
        assert!(!record.contains_key("plasmid"));
    }

    #[test]
    fn test_from_storage_parses_user_list() {
        let mut record = Map::new();
        record.insert("id".into(), serde_json::json!("p-1"));
        record.insert(
            "assignees".into(),
            serde_json::json!(r#"[{"id":"u1","name":"Ada","email":"ada@lab.org"}]"#),
        );

        let row = schema().from_storage(&record).unwrap();
        assert_eq!(row.get_users("assignees").unwrap()[0].name, "Ada");
        assert!(!row.contains("plasmid"));
    }

    #[test]
    fn test_partial_row_maps_only_present_fields() {
        let partial = Row::new().set("plasmid", "B");
        let record = schema().to_storage(&partial);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_invalid_user_list_is_an_error() {
        let mut record = Map::new();
        record.insert("assignees".into(), serde_json::json!("not json"));
        assert!(schema().from_storage(&record).is_err());
    }
}
