//! Result type and the total order results are returned in.

use std::cmp::Ordering;

/// A single candidate center whose mask-overlap count met the search
/// threshold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchResult {
    pub x: i32,
    pub z: i32,
    pub count: u32,
}

impl SearchResult {
    pub fn new(x: i32, z: i32, count: u32) -> Self {
        SearchResult { x, z, count }
    }

    fn dist_sq(&self) -> i64 {
        let x = self.x as i64;
        let z = self.z as i64;
        x * x + z * z
    }
}

/// The total order results are ranked by: count descending, distance to
/// the origin ascending, then lexicographic `(x, z)` ascending. Equal
/// results compare equal, which is exactly what the merger's
/// adjacent-duplicate removal relies on.
impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.dist_sq().cmp(&other.dist_sq()))
            .then_with(|| self.x.cmp(&other.x))
            .then_with(|| self.z.cmp(&other.z))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Inserts `batch` into `sorted`, which must already be sorted under
/// [`SearchResult`]'s `Ord`, keeping the whole list sorted. This is the
/// merger's insertion step: each worker's batch arrives already
/// monotonic in scan order, so most insertions land near the tail.
pub fn merge_sorted(sorted: &mut Vec<SearchResult>, batch: impl IntoIterator<Item = SearchResult>) {
    for item in batch {
        let mut idx = sorted.len();
        while idx > 0 && item < sorted[idx - 1] {
            idx -= 1;
        }
        sorted.insert(idx, item);
    }
}

/// Removes adjacent duplicate results. Neither backend's tiling should
/// ever produce the same center from two different sections/dispatch
/// tiles, but a dedup pass over a sorted list (where equal results
/// compare equal, so duplicates are always adjacent) is cheap enough
/// to keep as a safety net against that invariant ever slipping.
pub fn dedup_adjacent(sorted: &mut Vec<SearchResult>) {
    sorted.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_prefers_higher_count() {
        let a = SearchResult::new(0, 0, 10);
        let b = SearchResult::new(100, 100, 20);
        assert_eq!(a.cmp(&b), Ordering::Greater);
    }

    #[test]
    fn order_breaks_ties_by_distance_then_coords() {
        let a = SearchResult::new(3, 0, 5);
        let b = SearchResult::new(0, 4, 5);
        // |a| = 3, |b| = 4 -> a precedes b
        assert_eq!(a.cmp(&b), Ordering::Less);

        let c = SearchResult::new(1, 2, 5);
        let d = SearchResult::new(-2, -1, 5);
        // equal dist_sq (5); x ascending breaks the tie
        assert_eq!(c.cmp(&d), Ordering::Greater);
    }

    #[test]
    fn merge_keeps_sorted_order() {
        let mut acc = Vec::new();
        merge_sorted(&mut acc, vec![SearchResult::new(0, 0, 5)]);
        merge_sorted(&mut acc, vec![SearchResult::new(1, 1, 10), SearchResult::new(2, 2, 3)]);
        let counts: Vec<u32> = acc.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![10, 5, 3]);
    }

    #[test]
    fn dedup_removes_exact_duplicates() {
        let mut acc = vec![
            SearchResult::new(0, 0, 10),
            SearchResult::new(0, 0, 10),
            SearchResult::new(1, 1, 5),
        ];
        dedup_adjacent(&mut acc);
        assert_eq!(acc.len(), 2);
    }
}
