//! In-memory postings lists.

/// Sorted document identifiers for one term, with optional word positions.
///
/// `uids` is strictly ascending. When `positions` is present it is parallel to
/// `uids` and every inner list is strictly ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Postings {
    pub uids: Vec<u32>,
    pub positions: Option<Vec<Vec<u16>>>,
}

impl Postings {
    /// An empty, position-less list.
    pub fn empty() -> Self {
        Postings::default()
    }

    /// A plain identifier list. Callers guarantee sortedness.
    pub fn from_uids(uids: Vec<u32>) -> Self {
        Postings {
            uids,
            positions: None,
        }
    }

    /// A positional list. Callers guarantee sortedness and equal lengths.
    pub fn with_positions(uids: Vec<u32>, positions: Vec<Vec<u16>>) -> Self {
        debug_assert_eq!(uids.len(), positions.len());
        Postings {
            uids,
            positions: Some(positions),
        }
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    pub fn has_positions(&self) -> bool {
        self.positions.is_some()
    }

    /// Drop positions, keeping identifiers.
    pub fn into_uids(self) -> Vec<u32> {
        self.uids
    }

    /// Check the ordering invariants.
    pub fn is_well_formed(&self) -> bool {
        let uids_sorted = self.uids.windows(2).all(|w| w[0] < w[1]);
        let positions_ok = match &self.positions {
            None => true,
            Some(positions) => {
                positions.len() == self.uids.len()
                    && positions
                        .iter()
                        .all(|list| list.windows(2).all(|w| w[0] < w[1]))
            }
        };
        uids_sorted && positions_ok
    }

    /// Linear-merge union. Positions of shared identifiers are merged; the
    /// result is positional only if both inputs are.
    pub fn union(&self, other: &Postings) -> Postings {
        let positional = self.has_positions() && other.has_positions();
        let mut uids = Vec::with_capacity(self.len() + other.len());
        let mut positions = Vec::new();

        let (mut i, mut j) = (0, 0);
        let left: Vec<_> = self.iter().collect();
        let right: Vec<_> = other.iter().collect();
        while i < left.len() || j < right.len() {
            let take_left = j >= right.len() || (i < left.len() && left[i].0 <= right[j].0);
            let take_right = i >= left.len() || (j < right.len() && right[j].0 <= left[i].0);
            let (uid, merged) = match (take_left, take_right) {
                (true, true) => {
                    let merged = merge_positions(left[i].1, right[j].1);
                    let uid = left[i].0;
                    i += 1;
                    j += 1;
                    (uid, merged)
                }
                (true, false) => {
                    i += 1;
                    (left[i - 1].0, left[i - 1].1.to_vec())
                }
                _ => {
                    j += 1;
                    (right[j - 1].0, right[j - 1].1.to_vec())
                }
            };
            uids.push(uid);
            if positional {
                positions.push(merged);
            }
        }

        if positional {
            Postings::with_positions(uids, positions)
        } else {
            Postings::from_uids(uids)
        }
    }

    /// Iterate `(uid, positions)` pairs; positions are empty for plain lists.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u16])> + '_ {
        self.uids.iter().enumerate().map(move |(i, &uid)| {
            let positions = self
                .positions
                .as_ref()
                .map(|p| p[i].as_slice())
                .unwrap_or(&[]);
            (uid, positions)
        })
    }
}

fn merge_positions(a: &[u16], b: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed() {
        assert!(Postings::from_uids(vec![1, 2, 3]).is_well_formed());
        assert!(!Postings::from_uids(vec![1, 1, 3]).is_well_formed());
        assert!(Postings::with_positions(vec![1, 4], vec![vec![1, 5], vec![2]]).is_well_formed());
        assert!(!Postings::with_positions(vec![1, 4], vec![vec![5, 1], vec![2]]).is_well_formed());
    }

    #[test]
    fn test_union_merges_positions() {
        let a = Postings::with_positions(vec![1, 5], vec![vec![2, 9], vec![1]]);
        let b = Postings::with_positions(vec![1, 3], vec![vec![4, 9], vec![7]]);
        let merged = a.union(&b);
        assert_eq!(merged.uids, vec![1, 3, 5]);
        assert_eq!(
            merged.positions,
            Some(vec![vec![2, 4, 9], vec![7], vec![1]])
        );
        assert!(merged.is_well_formed());

        let plain = a.union(&Postings::from_uids(vec![2]));
        assert_eq!(plain.uids, vec![1, 2, 5]);
        assert!(!plain.has_positions());
    }

    #[test]
    fn test_iter() {
        let postings = Postings::with_positions(vec![7, 9], vec![vec![1], vec![2, 3]]);
        let pairs: Vec<_> = postings.iter().collect();
        assert_eq!(pairs, vec![(7, &[1u16][..]), (9, &[2u16, 3][..])]);

        let plain = Postings::from_uids(vec![7]);
        assert_eq!(plain.iter().next(), Some((7, &[][..])));
    }
}
