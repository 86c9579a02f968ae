//! Feed composition.
//!
//! The home feed interleaves paid placements into the organic event list:
//! one featured item after every third organic item, with any leftover
//! featured items appended once the organic list is exhausted. Relative
//! order within each source list is preserved.

use crate::models::Event;

/// How many organic items precede each interleaved featured item.
const ORGANIC_RUN: usize = 3;

/// Interleave featured items into an organic list.
///
/// Pure and generic; [`compose_feed`] is the event-typed entry point.
pub fn merge_featured<T>(organic: Vec<T>, featured: Vec<T>) -> Vec<T> {
    let mut merged = Vec::with_capacity(organic.len() + featured.len());
    let mut featured = featured.into_iter();

    for (i, item) in organic.into_iter().enumerate() {
        merged.push(item);
        if (i + 1) % ORGANIC_RUN == 0
            && let Some(next) = featured.next()
        {
            merged.push(next);
        }
    }

    merged.extend(featured);
    merged
}

/// Compose the home feed from organic events and the events behind active
/// featured placements.
#[must_use]
pub fn compose_feed(organic: Vec<Event>, featured: Vec<Event>) -> Vec<Event> {
    merge_featured(organic, featured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_featured_after_every_third_organic() {
        let organic: Vec<i32> = (1..=10).collect();
        let featured = vec![101, 102];

        let merged = merge_featured(organic, featured);

        // Featured items land immediately after organic positions 3 and 6
        assert_eq!(merged, vec![1, 2, 3, 101, 4, 5, 6, 102, 7, 8, 9, 10]);
    }

    #[test]
    fn test_leftover_featured_appended() {
        let merged = merge_featured(vec![1, 2], vec![101, 102, 103]);
        assert_eq!(merged, vec![1, 2, 101, 102, 103]);
    }

    #[test]
    fn test_no_featured_is_identity() {
        let merged = merge_featured(vec![1, 2, 3, 4], Vec::new());
        assert_eq!(merged, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_no_organic_yields_featured_in_order() {
        let merged = merge_featured(Vec::new(), vec![101, 102]);
        assert_eq!(merged, vec![101, 102]);
    }

    #[test]
    fn test_organic_relative_order_preserved() {
        let organic: Vec<i32> = (1..=9).collect();
        let featured = vec![101, 102, 103];
        let merged = merge_featured(organic.clone(), featured);

        let organic_only: Vec<i32> = merged.into_iter().filter(|n| *n < 100).collect();
        assert_eq!(organic_only, organic);
    }
}
