//! Fuzzy filtering of the user directory using nucleo-matcher.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::model::User;

/// A user matched by [`fuzzy_filter`].
#[derive(Debug, Clone)]
pub struct UserMatch {
    /// Index of the user in the searched list.
    pub index: usize,
    /// Match score (higher is better).
    pub score: u32,
}

/// Matches `query` against each user's name and email.
///
/// Returns matches sorted by score (highest first), ties in list order.
/// An empty query returns every user with score 0.
pub fn fuzzy_filter(query: &str, users: &[User]) -> Vec<UserMatch> {
    if query.trim().is_empty() {
        return (0..users.len())
            .map(|index| UserMatch { index, score: 0 })
            .collect();
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(query, CaseMatching::Ignore, Normalization::Smart, AtomKind::Fuzzy);

    let mut buf = Vec::new();
    let mut matches: Vec<UserMatch> = users
        .iter()
        .enumerate()
        .filter_map(|(index, user)| {
            let label = format!("{} {}", user.name, user.email);
            let haystack = Utf32Str::new(&label, &mut buf);
            pattern
                .score(haystack, &mut matcher)
                .map(|score| UserMatch { index, score })
        })
        .collect();

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}
