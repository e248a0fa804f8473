/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Orders a set of thread replies so that every message precedes every
//! message that names it in `branches`.

use std::collections::HashMap;

/// Anything exposing the two fields the sorter needs. Messages in the
/// replied-to thread are addressed by their raw message-ref key bytes.
pub trait TangledPost {
    fn key(&self) -> &[u8];
    fn branches(&self) -> &[Vec<u8>];
}

/// Orders `items` so that for every pair `(a, b)` where `a.key()` is one of
/// `b.branches()`, `a` precedes `b`. Ties between causally unrelated messages
/// break on lexicographic key order.
///
/// Builds a `key -> index` lookup once up front, then answers "does `a`
/// precede `b`" in O(1) per comparison rather than rescanning branch lists,
/// the same precompute-then-compare shape as the Go `ByBranches` sorter this
/// is adapted from.
pub fn by_branches<T: TangledPost>(mut items: Vec<T>) -> Vec<T> {
    let lookup = fill_lookup(&items);
    let order = merge_sort_indices(0, items.len(), |a, b| precedes(&items, &lookup, a, b));

    let mut slots: Vec<Option<T>> = items.drain(..).map(Some).collect();
    order.into_iter().map(|i| slots[i].take().expect("each index appears exactly once")).collect()
}

fn fill_lookup<T: TangledPost>(items: &[T]) -> HashMap<Vec<u8>, usize> {
    items.iter().enumerate().map(|(i, item)| (item.key().to_vec(), i)).collect()
}

/// Returns `true` if item `a` must sort before item `b`.
fn precedes<T: TangledPost>(
    items: &[T],
    lookup: &HashMap<Vec<u8>, usize>,
    a: usize,
    b: usize,
) -> bool {
    if branches_contain(items, lookup, b, a) {
        return true
    }
    if branches_contain(items, lookup, a, b) {
        return false
    }
    items[a].key() < items[b].key()
}

/// Does `items[of].branches()` reference `items[target].key()`?
fn branches_contain<T: TangledPost>(
    items: &[T],
    lookup: &HashMap<Vec<u8>, usize>,
    of: usize,
    target: usize,
) -> bool {
    items[of].branches().iter().any(|b| lookup.get(b.as_slice()) == Some(&target))
}

/// Stable merge sort over `offset..offset+len` driven by a `precedes`
/// relation that, by construction of an append-only log, should never be
/// cyclic. A cycle can only make the relation inconsistent for the pair
/// involved, never break termination here: every merge step is a single
/// linear scan of both halves, so a bad `precedes` answer just degrades
/// ordering quality for that pair rather than looping. The well-defined
/// "pure key order" fallback falls out of `precedes`'s own last resort of
/// comparing key bytes directly.
///
/// `precedes` always receives absolute indices into the caller's original
/// arrays, not positions local to the current recursion's slice, so `offset`
/// must be threaded through every recursive call rather than patched onto
/// the result afterwards.
fn merge_sort_indices(
    offset: usize,
    len: usize,
    precedes: impl Fn(usize, usize) -> bool + Copy,
) -> Vec<usize> {
    if len <= 1 {
        return (offset..offset + len).collect()
    }
    let mid = len / 2;
    let left = merge_sort_indices(offset, mid, precedes);
    let right = merge_sort_indices(offset + mid, len - mid, precedes);

    let mut out = Vec::with_capacity(len);
    let (mut li, mut ri) = (0, 0);
    while li < left.len() && ri < right.len() {
        if !precedes(right[ri], left[li]) {
            out.push(left[li]);
            li += 1;
        } else {
            out.push(right[ri]);
            ri += 1;
        }
    }
    out.extend_from_slice(&left[li..]);
    out.extend_from_slice(&right[ri..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Fake {
        key: Vec<u8>,
        branches: Vec<Vec<u8>>,
    }

    impl TangledPost for Fake {
        fn key(&self) -> &[u8] {
            &self.key
        }
        fn branches(&self) -> &[Vec<u8>] {
            &self.branches
        }
    }

    fn k(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn branch_sorts_after_its_precursor() {
        let items = vec![
            Fake { key: k("b"), branches: vec![k("a")] },
            Fake { key: k("a"), branches: vec![] },
        ];
        let sorted = by_branches(items);
        assert_eq!(sorted[0].key, k("a"));
        assert_eq!(sorted[1].key, k("b"));
    }

    #[test]
    fn independent_messages_break_lexicographically() {
        let items = vec![
            Fake { key: k("z"), branches: vec![] },
            Fake { key: k("a"), branches: vec![] },
            Fake { key: k("m"), branches: vec![] },
        ];
        let sorted = by_branches(items);
        let keys: Vec<Vec<u8>> = sorted.iter().map(|i| i.key.clone()).collect();
        assert_eq!(keys, vec![k("a"), k("m"), k("z")]);
    }

    #[test]
    fn chain_of_replies_sorts_in_causal_order() {
        let items = vec![
            Fake { key: k("4fum"), branches: vec![k("3foo")] },
            Fake { key: k("1fii"), branches: vec![] },
            Fake { key: k("3foo"), branches: vec![k("2faa")] },
            Fake { key: k("2faa"), branches: vec![k("1fii")] },
        ];
        let sorted = by_branches(items);
        let keys: Vec<Vec<u8>> = sorted.iter().map(|i| i.key.clone()).collect();
        assert_eq!(keys, vec![k("1fii"), k("2faa"), k("3foo"), k("4fum")]);
    }

    #[test]
    fn already_sorted_input_is_a_fixed_point() {
        let items = vec![
            Fake { key: k("1fii"), branches: vec![] },
            Fake { key: k("2faa"), branches: vec![k("1fii")] },
        ];
        let sorted = by_branches(items);
        assert_eq!(sorted[0].key, k("1fii"));
        assert_eq!(sorted[1].key, k("2faa"));
    }

    #[test]
    fn non_monotonic_keys_still_sort_causally() {
        // "z" must precede "a" since "a" branches to "z", even though "z"
        // sorts lexicographically after "a" and after "c"/"d" in input
        // order. Exercises the 4-item right-half recursion that a naive
        // unshifted index scheme gets wrong.
        let items = vec![
            Fake { key: k("d"), branches: vec![] },
            Fake { key: k("c"), branches: vec![k("d")] },
            Fake { key: k("a"), branches: vec![k("z")] },
            Fake { key: k("z"), branches: vec![] },
        ];
        let sorted = by_branches(items);
        let keys: Vec<Vec<u8>> = sorted.iter().map(|i| i.key.clone()).collect();
        let z_pos = keys.iter().position(|key| key == &k("z")).unwrap();
        let a_pos = keys.iter().position(|key| key == &k("a")).unwrap();
        assert!(z_pos < a_pos, "z must precede a, got {keys:?}");
        let d_pos = keys.iter().position(|key| key == &k("d")).unwrap();
        let c_pos = keys.iter().position(|key| key == &k("c")).unwrap();
        assert!(d_pos < c_pos, "d must precede c, got {keys:?}");
    }

    #[test]
    fn shuffled_chain_still_sorts_causally() {
        // Mirrors the shuffle-then-sort shape of the upstream fixture this
        // sorter is grounded on.
        let items = vec![
            Fake { key: k("7fum"), branches: vec![k("6fum")] },
            Fake { key: k("5fum"), branches: vec![k("4fum")] },
            Fake { key: k("1fii"), branches: vec![] },
            Fake { key: k("6fum"), branches: vec![k("5fum")] },
            Fake { key: k("3foo"), branches: vec![k("2faa")] },
            Fake { key: k("4fum"), branches: vec![k("3foo")] },
            Fake { key: k("2faa"), branches: vec![k("1fii")] },
        ];
        let sorted = by_branches(items);
        let keys: Vec<Vec<u8>> = sorted.iter().map(|i| i.key.clone()).collect();
        assert_eq!(
            keys,
            vec![k("1fii"), k("2faa"), k("3foo"), k("4fum"), k("5fum"), k("6fum"), k("7fum")]
        );
    }
}
