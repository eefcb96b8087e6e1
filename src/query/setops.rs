//! Merge algebra over sorted identifier and position lists.
//!
//! Every function is a single linear pass over its inputs and returns a
//! strictly ascending result when its inputs are strictly ascending.

use std::cmp::Ordering;

use crate::storage::Postings;

/// Identifiers present in both lists.
pub fn intersect(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Identifiers present in either list.
pub fn union(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Identifiers of `a` absent from `b`.
pub fn difference(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for &uid in a {
        while j < b.len() && b[j] < uid {
            j += 1;
        }
        if j >= b.len() || b[j] != uid {
            out.push(uid);
        }
    }
    out
}

/// Walk the identifiers common to two positional lists, keeping the
/// documents for which `join` returns a non-empty position list.
fn join_documents<F>(left: &Postings, right: &Postings, mut join: F) -> Postings
where
    F: FnMut(&[u16], &[u16]) -> Vec<u16>,
{
    let (Some(left_pos), Some(right_pos)) = (&left.positions, &right.positions) else {
        return Postings::from_uids(intersect(&left.uids, &right.uids));
    };

    let mut uids = Vec::new();
    let mut positions = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < left.uids.len() && j < right.uids.len() {
        match left.uids[i].cmp(&right.uids[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let matched = join(&left_pos[i], &right_pos[j]);
                if !matched.is_empty() {
                    uids.push(left.uids[i]);
                    positions.push(matched);
                }
                i += 1;
                j += 1;
            }
        }
    }
    Postings::with_positions(uids, positions)
}

/// Phrase step: keep the start positions `p` of `start` for which `next`
/// has a word at `p + delta` in the same document.
pub fn phrase_join(start: &Postings, next: &Postings, delta: u32) -> Postings {
    join_documents(start, next, |starts, nexts| {
        let mut kept = Vec::new();
        let mut j = 0;
        for &p in starts {
            let want = u32::from(p) + delta;
            while j < nexts.len() && u32::from(nexts[j]) < want {
                j += 1;
            }
            if j < nexts.len() && u32::from(nexts[j]) == want {
                kept.push(p);
            }
        }
        kept
    })
}

/// Proximity step: keep the positions `r` of `right` that follow some
/// position `l` of `left` with `l < r <= l + distance + left_span`.
///
/// `left_span` is the distance from a left match's start to its last word,
/// so the window is measured from the end of the left phrase.
pub fn near_join(left: &Postings, left_span: u32, right: &Postings, distance: u32) -> Postings {
    let reach = distance.saturating_add(left_span);
    join_documents(left, right, |lefts, rights| {
        let mut kept = Vec::new();
        let mut i = 0;
        for &r in rights {
            let r = u32::from(r);
            while i < lefts.len() && u32::from(lefts[i]).saturating_add(reach) < r {
                i += 1;
            }
            if i < lefts.len() && u32::from(lefts[i]) < r {
                kept.push(r as u16);
            }
        }
        kept
    })
}
