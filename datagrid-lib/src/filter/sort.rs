//! Multi-column sort state.

use crate::api::Direction;
use crate::api::SortSpec;

/// One sorted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortConfig {
    pub key: String,
    pub direction: Direction,
    /// 1 is applied first.
    pub priority: u32,
}

impl SortConfig {
    pub fn new(key: impl Into<String>, direction: Direction, priority: u32) -> Self {
        Self {
            key: key.into(),
            direction,
            priority,
        }
    }
}

/// The ordered list of sorted columns, at most one entry per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    configs: Vec<SortConfig>,
}

impl Default for SortState {
    /// `id` ascending.
    fn default() -> Self {
        Self {
            configs: vec![SortConfig::new("id", Direction::Asc, 1)],
        }
    }
}

impl SortState {
    /// A state with no sorted column.
    pub fn unsorted() -> Self {
        Self { configs: Vec::new() }
    }

    /// Replaces the state with a single column.
    pub fn single(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            configs: vec![SortConfig::new(key, direction, 1)],
        }
    }

    /// Cycles `key` through unsorted, ascending, descending and back.
    ///
    /// A newly sorted column is appended with the lowest precedence. Removing
    /// a column renumbers the remaining priorities from 1.
    pub fn toggle(&mut self, key: &str) {
        match self.configs.iter().position(|c| c.key == key) {
            Some(index) => match self.configs[index].direction {
                Direction::Asc => self.configs[index].direction = Direction::Desc,
                Direction::Desc => {
                    self.configs.remove(index);
                    self.renumber();
                }
            },
            None => {
                let priority = self.configs.len() as u32 + 1;
                self.configs.push(SortConfig::new(key, Direction::Asc, priority));
            }
        }
    }

    fn renumber(&mut self) {
        self.configs.sort_by_key(|c| c.priority);
        for (index, config) in self.configs.iter_mut().enumerate() {
            config.priority = index as u32 + 1;
        }
    }

    /// Returns the sort entry for `key`, if sorted.
    pub fn get(&self, key: &str) -> Option<&SortConfig> {
        self.configs.iter().find(|c| c.key == key)
    }

    /// Entries in precedence order.
    pub fn ordered(&self) -> Vec<&SortConfig> {
        let mut ordered: Vec<&SortConfig> = self.configs.iter().collect();
        ordered.sort_by_key(|c| c.priority);
        ordered
    }

    /// The entry applied first, as sent to a backend that sorts on one column.
    pub fn primary(&self) -> Option<SortSpec> {
        self.configs
            .iter()
            .min_by_key(|c| c.priority)
            .map(|c| SortSpec {
                column: c.key.clone(),
                direction: c.direction,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_id_ascending() {
        let state = SortState::default();
        assert_eq!(state.primary(), Some(SortSpec::asc("id")));
    }

    #[test]
    fn test_toggle_cycles_and_renumbers() {
        let mut state = SortState::default();

        state.toggle("name");
        assert_eq!(state.get("name").map(|c| (c.direction, c.priority)), Some((Direction::Asc, 2)));

        state.toggle("name");
        assert_eq!(state.get("name").map(|c| c.direction), Some(Direction::Desc));

        state.toggle("id");
        state.toggle("id");
        assert!(state.get("id").is_none());
        assert_eq!(state.get("name").map(|c| c.priority), Some(1));
        assert_eq!(state.primary(), Some(SortSpec::desc("name")));

        state.toggle("name");
        assert!(state.is_empty());
        assert_eq!(state.primary(), None);
    }
}
