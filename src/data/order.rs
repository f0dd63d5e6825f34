//! Display ordering for device addresses.
//!
//! Probes from the same hardware batch share the leading segments of
//! their colon-delimited address, so ordering by that prefix first
//! keeps related devices adjacent on screen regardless of how their
//! full addresses compare byte-for-byte.

use std::cmp::Ordering;

/// The grouping key for an address: its first three colon-delimited
/// segments, or the whole address when it has fewer.
pub fn prefix_group(id: &str) -> &str {
    match id.match_indices(':').nth(2) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Compare two addresses in display order: prefix group first, full
/// address as the tie-break.
pub fn address_cmp(a: &str, b: &str) -> Ordering {
    prefix_group(a)
        .cmp(prefix_group(b))
        .then_with(|| a.cmp(b))
}

/// Arrange a set of addresses into display order.
///
/// The result is deterministic: any permutation of the same input
/// produces the same sequence, so the screen never reshuffles just
/// because events arrived in a different order.
pub fn display_order<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
    ids.sort_by(|a, b| address_cmp(a, b));
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_group_takes_first_three_segments() {
        assert_eq!(prefix_group("FC:01:5C:8A:3B:21"), "FC:01:5C");
        assert_eq!(prefix_group("A:B:C:D"), "A:B:C");
    }

    #[test]
    fn test_prefix_group_of_short_address_is_whole_address() {
        assert_eq!(prefix_group("A:B"), "A:B");
        assert_eq!(prefix_group("AABBCC"), "AABBCC");
        assert_eq!(prefix_group(""), "");
    }

    #[test]
    fn test_display_order_groups_related_addresses() {
        let ordered = display_order(vec![
            "FC:01:5C:02",
            "AA:00:00:09",
            "FC:01:5C:01",
            "AA:00:00:01",
        ]);
        assert_eq!(
            ordered,
            vec!["AA:00:00:01", "AA:00:00:09", "FC:01:5C:01", "FC:01:5C:02"]
        );
    }

    #[test]
    fn test_display_order_beats_plain_lexicographic_sort() {
        // Byte-wise, "A:B:C9:X" sorts before "A:B:C:X" because '9' is
        // below ':'. Group-first ordering puts the "A:B:C" batch first.
        let ordered = display_order(vec!["A:B:C9:X", "A:B:C:X"]);
        assert_eq!(ordered, vec!["A:B:C:X", "A:B:C9:X"]);
        assert!("A:B:C9:X" < "A:B:C:X");
    }

    #[test]
    fn test_display_order_is_independent_of_input_order() {
        let a = display_order(vec!["C:C:C:1", "A:A:A:2", "B:B:B:3", "A:A:A:1"]);
        let b = display_order(vec!["A:A:A:1", "B:B:B:3", "A:A:A:2", "C:C:C:1"]);
        let c = display_order(vec!["B:B:B:3", "C:C:C:1", "A:A:A:1", "A:A:A:2"]);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_display_order_drops_duplicates() {
        let ordered = display_order(vec!["A:B:C:1", "A:B:C:1", "A:B:C:2"]);
        assert_eq!(ordered, vec!["A:B:C:1", "A:B:C:2"]);
    }
}
