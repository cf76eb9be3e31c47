//! Small generic helpers shared by the intersection counter and the
//! break-locator.

use std::collections::BTreeMap;

/// Binary search over a sorted projection.
///
/// `pred` must be monotone over `0..len`: once it turns false it stays
/// false. Returns the index of the first element for which `pred` is false
/// (`len` if it never is). The projection is evaluated lazily, so callers
/// can search positions, distances, or any derived ordering without
/// materializing a vector.
pub fn lower_bound<F>(len: usize, pred: F) -> usize
where
    F: Fn(usize) -> bool,
{
    let mut lo = 0;
    let mut hi = len;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Merge two maps; on key collision the overlay entry wins.
pub fn merged<K, V>(base: BTreeMap<K, V>, overlay: BTreeMap<K, V>) -> BTreeMap<K, V>
where
    K: Ord,
{
    let mut out = base;
    for (k, v) in overlay {
        out.insert(k, v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_sorted_values_when_searching_then_finds_first_violation() {
        let values = [1, 3, 5, 7, 9];
        let idx = lower_bound(values.len(), |i| values[i] < 6);
        assert_eq!(idx, 3);
        assert_eq!(lower_bound(values.len(), |i| values[i] < 0), 0);
        assert_eq!(lower_bound(values.len(), |i| values[i] < 100), 5);
    }

    #[test]
    fn given_empty_range_when_searching_then_returns_zero() {
        assert_eq!(lower_bound(0, |_| true), 0);
    }

    #[test]
    fn given_colliding_keys_when_merging_then_overlay_wins() {
        let base = BTreeMap::from([("a", 1), ("b", 2)]);
        let overlay = BTreeMap::from([("b", 20), ("c", 3)]);
        let out = merged(base, overlay);
        assert_eq!(out, BTreeMap::from([("a", 1), ("b", 20), ("c", 3)]));
    }
}
