//! Proximity-based eviction
//!
//! When a merge overflows the cache, pages are kept by how close they are to
//! the page being viewed, not by recency:
//!
//! 1. the current page and the two after it (within `1..=total_pages`)
//! 2. the two pages before it, while there is room
//! 3. the remaining cached pages closest to the current page
//!
//! Slots taken in steps 1 and 2 are reserved even when the page is not cached.

use std::collections::BTreeSet;

/// Selects the pages to keep out of `cached`.
///
/// `total_pages == 0` means the page count is unknown and no upper bound is
/// applied. Proximity ties break towards the lower page number.
pub fn prioritize_pages(cached: &BTreeSet<u32>, current: u32, total_pages: u32, capacity: usize) -> BTreeSet<u32> {
    let in_range = |p: u32| p >= 1 && (total_pages == 0 || p <= total_pages);

    let mut priority: Vec<u32> = Vec::with_capacity(capacity);
    for page in [current, current.saturating_add(1), current.saturating_add(2)] {
        if in_range(page) && !priority.contains(&page) && priority.len() < capacity {
            priority.push(page);
        }
    }
    if priority.len() < capacity && current > 1 {
        priority.push(current - 1);
    }
    if priority.len() < capacity && current > 2 {
        priority.push(current - 2);
    }

    let mut by_distance: Vec<u32> = cached
        .iter()
        .copied()
        .filter(|p| !priority.contains(p))
        .collect();
    by_distance.sort_by_key(|p| (p.abs_diff(current), *p));

    let remaining = capacity.saturating_sub(priority.len());
    priority.extend(by_distance.into_iter().take(remaining));

    priority
        .into_iter()
        .filter(|p| cached.contains(p))
        .collect()
}
