//! Fresh-listing selection against the seen-set.

use crate::models::{Listing, SeenSet};

/// Pick listings not yet in `seen`, marking each as seen.
///
/// `raw` is in source order (newest first). Identifiers are claimed as soon
/// as they are encountered, so a listing repeated on overlapping pages is
/// only returned once. The result is oldest first.
pub fn select_fresh(raw: Vec<Listing>, seen: &mut SeenSet) -> Vec<Listing> {
    let mut fresh: Vec<Listing> = raw
        .into_iter()
        .filter(|listing| seen.insert(listing.id.clone()))
        .collect();
    fresh.reverse();
    fresh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listings(ids: &[&str]) -> Vec<Listing> {
        ids.iter().map(|id| Listing::new(*id, *id)).collect()
    }

    fn ids(listings: &[Listing]) -> Vec<&str> {
        listings.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_two_page_scenario() {
        // Page 1 (newest): C, B. Page 2 (oldest): A. B already seen.
        let mut seen: SeenSet = ["B"].into_iter().collect();
        let fresh = select_fresh(listings(&["C", "B", "A"]), &mut seen);

        assert_eq!(ids(&fresh), vec!["A", "C"]);
        let expected: SeenSet = ["A", "B", "C"].into_iter().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_repeated_id_counted_once() {
        let mut seen = SeenSet::new();
        let fresh = select_fresh(listings(&["D", "C", "C", "B"]), &mut seen);
        assert_eq!(ids(&fresh), vec!["B", "C", "D"]);
    }

    #[test]
    fn test_everything_seen() {
        let mut seen: SeenSet = ["A", "B"].into_iter().collect();
        let before = seen.clone();
        let fresh = select_fresh(listings(&["B", "A"]), &mut seen);
        assert!(fresh.is_empty());
        assert_eq!(seen, before);
    }

    #[test]
    fn test_cold_start_all_fresh() {
        let mut seen = SeenSet::new();
        let fresh = select_fresh(listings(&["C", "B", "A"]), &mut seen);
        assert_eq!(ids(&fresh), vec!["A", "B", "C"]);
        assert_eq!(seen.len(), 3);
    }
}
