//! Client-side filtering, sorting and pagination
//!
//! Used when the grid holds every row in memory. [`apply`] is a pure function
//! of the rows and a [`FilterQuery`]: sort by ascending priority, keep rows
//! matching the search term, then slice out the requested page.

mod sort;

pub use sort::*;

use std::cmp::Ordering;

use crate::api::total_pages_for;
use crate::model::GridSchema;
use crate::model::Row;
use crate::model::Value;

/// Which fields a search term is matched against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchField {
    /// Every field except the row identity.
    #[default]
    All,
    /// One column.
    Field(String),
}

impl SearchField {
    /// Parses the `"all"` sentinel or a column key.
    pub fn parse(field: &str) -> Self {
        if field.is_empty() || field == "all" {
            SearchField::All
        } else {
            SearchField::Field(field.to_string())
        }
    }
}

/// Inputs of [`apply`].
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    pub search_term: String,
    pub search_field: SearchField,
    pub sort: SortState,
    /// 1-based; clamped to the available pages.
    pub page: u32,
    /// `None` returns every matching row on one page.
    pub page_size: Option<u32>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, term: impl Into<String>, field: SearchField) -> Self {
        self.search_term = term.into();
        self.search_field = field;
        self
    }

    pub fn with_sort(mut self, sort: SortState) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = page;
        self.page_size = Some(page_size);
        self
    }
}

/// The visible slice produced by [`apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    /// Rows of the current page.
    pub rows: Vec<Row>,
    /// Rows matching the search, across all pages.
    pub total_items: usize,
    /// At least 1.
    pub total_pages: u32,
    /// The page actually shown.
    pub current_page: u32,
}

/// Sorts, filters and paginates `rows`.
///
/// # Example
///
/// ```
/// use datagrid_lib::filter::{apply, FilterQuery, SearchField};
/// use datagrid_lib::model::{GridSchema, Row};
///
/// let rows = vec![
///     Row::new().set("id", 1i64).set("name", "Apple"),
///     Row::new().set("id", 2i64).set("name", "Banana"),
/// ];
/// let query = FilterQuery::new().with_search("ban", SearchField::All);
/// let view = apply(&rows, &GridSchema::default(), &query);
///
/// assert_eq!(view.total_items, 1);
/// ```
pub fn apply(rows: &[Row], schema: &GridSchema, query: &FilterQuery) -> FilteredView {
    let mut sorted: Vec<&Row> = rows.iter().collect();
    sort_rows(&mut sorted, schema, &query.sort);

    let needle = query.search_term.to_lowercase();
    let matching: Vec<&Row> = if needle.is_empty() {
        sorted
    } else {
        sorted
            .into_iter()
            .filter(|row| row_matches(row, schema, &query.search_field, &needle))
            .collect()
    };

    let total_items = matching.len();
    let Some(page_size) = query.page_size.filter(|size| *size > 0) else {
        return FilteredView {
            rows: matching.into_iter().cloned().collect(),
            total_items,
            total_pages: 1,
            current_page: 1,
        };
    };

    let total_pages = total_pages_for(total_items, page_size).max(1);
    let current_page = query.page.clamp(1, total_pages);
    let start = (current_page as usize - 1) * page_size as usize;

    FilteredView {
        rows: matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect(),
        total_items,
        total_pages,
        current_page,
    }
}

fn sort_rows(rows: &mut [&Row], schema: &GridSchema, sort: &SortState) {
    let ordered = sort.ordered();
    if ordered.is_empty() {
        return;
    }

    // stable: equal rows keep their input order
    rows.sort_by(|a, b| {
        for config in &ordered {
            let by_user = schema
                .get_column(&config.key)
                .is_some_and(|column| column.is_user());
            let ordering = compare_field(a, b, &config.key, by_user);
            if ordering != Ordering::Equal {
                return config.direction.apply(ordering);
            }
        }
        Ordering::Equal
    });
}

fn compare_field(a: &Row, b: &Row, key: &str, by_user: bool) -> Ordering {
    let null = Value::Null;
    let left = a.get(key).unwrap_or(&null);
    let right = b.get(key).unwrap_or(&null);

    if by_user {
        return left.first_user_name().cmp(right.first_user_name());
    }
    left.compare(right)
}

fn row_matches(row: &Row, schema: &GridSchema, field: &SearchField, needle: &str) -> bool {
    match field {
        SearchField::All => row
            .fields()
            .iter()
            .filter(|(key, _)| key.as_str() != schema.unique_key)
            .any(|(_, value)| value_matches(value, needle)),
        SearchField::Field(key) => row.get(key).is_some_and(|value| value_matches(value, needle)),
    }
}

fn value_matches(value: &Value, needle: &str) -> bool {
    match value {
        Value::Users(users) => users
            .iter()
            .any(|user| user.name.to_lowercase().contains(needle)),
        other => other.display_text().to_lowercase().contains(needle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Direction;
    use crate::model::ColumnDefinition;
    use crate::model::ColumnKind;
    use crate::model::User;

    fn produce() -> Vec<Row> {
        vec![
            Row::new().set("id", "1").set("name", "Apple").set("category", "Fruit").set("price", 1.99),
            Row::new().set("id", "2").set("name", "Banana").set("category", "Fruit").set("price", 0.99),
            Row::new().set("id", "3").set("name", "Carrot").set("category", "Vegetable").set("price", 0.5),
            Row::new().set("id", "4").set("name", "Donut").set("category", "Bakery").set("price", 2.49),
        ]
    }

    fn names(view: &FilteredView) -> Vec<&str> {
        view.rows
            .iter()
            .map(|row| row.get("name").and_then(Value::as_str).unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let rows = produce();
        let schema = GridSchema::default();

        let view = apply(&rows, &schema, &FilterQuery::new().with_search("fruit", SearchField::All));
        assert_eq!(names(&view), vec!["Apple", "Banana"]);

        let view = apply(&rows, &schema, &FilterQuery::new().with_search("a", SearchField::All));
        assert_eq!(view.total_items, 4);

        let view = apply(&rows, &schema, &FilterQuery::new().with_search("z", SearchField::All));
        assert!(view.rows.is_empty());
        assert_eq!(view.total_pages, 1);
    }

    #[test]
    fn test_search_all_skips_identity() {
        let rows = produce();
        let view = apply(&rows, &GridSchema::default(), &FilterQuery::new().with_search("3", SearchField::All));
        assert!(view.rows.is_empty());

        let query = FilterQuery::new().with_search("3", SearchField::Field("id".into()));
        let view = apply(&rows, &GridSchema::default(), &query);
        assert_eq!(names(&view), vec!["Carrot"]);
    }

    #[test]
    fn test_sort_and_search_combine() {
        let rows = produce();
        let query = FilterQuery::new()
            .with_search("fruit", SearchField::Field("category".into()))
            .with_sort(SortState::single("name", Direction::Desc));
        let view = apply(&rows, &GridSchema::default(), &query);
        assert_eq!(names(&view), vec!["Banana", "Apple"]);

        let query = FilterQuery::new().with_sort(SortState::single("price", Direction::Asc));
        let view = apply(&rows, &GridSchema::default(), &query);
        assert_eq!(names(&view), vec!["Carrot", "Banana", "Apple", "Donut"]);
    }

    #[test]
    fn test_multi_key_sort_uses_priority() {
        let rows = produce();
        let mut sort = SortState::unsorted();
        sort.toggle("category");
        sort.toggle("name");
        sort.toggle("name");

        let view = apply(&rows, &GridSchema::default(), &FilterQuery::new().with_sort(sort));
        assert_eq!(names(&view), vec!["Donut", "Banana", "Apple", "Carrot"]);
    }

    #[test]
    fn test_user_columns_sort_and_search_by_name() {
        let schema = GridSchema::default()
            .column(ColumnDefinition::new("assignees", "Assignees", ColumnKind::User { multiple: true }));
        let zoe = User::new("u1", "Zoe", "zoe@example.com");
        let adam = User::new("u2", "Adam", "adam@example.com");
        let rows = vec![
            Row::new().set("id", "1").set("name", "a").set("assignees", vec![zoe]),
            Row::new().set("id", "2").set("name", "b").set("assignees", Vec::<User>::new()),
            Row::new().set("id", "3").set("name", "c").set("assignees", vec![adam]),
        ];

        let query = FilterQuery::new().with_sort(SortState::single("assignees", Direction::Asc));
        assert_eq!(names(&apply(&rows, &schema, &query)), vec!["b", "c", "a"]);

        let query = FilterQuery::new().with_search("zo", SearchField::Field("assignees".into()));
        assert_eq!(names(&apply(&rows, &schema, &query)), vec!["a"]);

        let query = FilterQuery::new().with_search("example", SearchField::All);
        assert!(apply(&rows, &schema, &query).rows.is_empty());
    }

    #[test]
    fn test_pagination_math() {
        let rows: Vec<Row> = (1..=23i64).map(|id| Row::new().set("id", id)).collect();
        let schema = GridSchema::default();

        let view = apply(&rows, &schema, &FilterQuery::new().with_page(3, 10));
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.rows.len(), 3);

        let view = apply(&rows, &schema, &FilterQuery::new().with_page(9, 10));
        assert_eq!(view.current_page, 3);

        let view = apply(&[], &schema, &FilterQuery::new().with_page(1, 10));
        assert_eq!(view.total_pages, 1);
    }
}
