//!
//! Sparse integer allocator over a half-open range.
//!
//! A [`Freelist`] tracks the *free* regions of an id or block space as an
//! ordered sequence of disjoint, non-adjacent [`Extent`]s. `alloc` removes
//! from the free set; `pool` returns a region to it, coalescing with
//! neighbors; `thwack` removes a specific sub-range (used to reserve ids
//! already found on disk during preflight).
//!

#[cfg(test)]
mod test;

use std::collections::{BTreeMap, BTreeSet};

/////////////////////////////////////////////////////////////////////////////
/////////////////////////////////////////////////////////////////////////////

/// A contiguous `(offset, length)` range, `length >= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    pub offset: usize,
    pub length: usize,
}

impl Extent {
    #[inline(always)]
    pub fn new(offset: usize, length: usize) -> Self {
        debug_assert!(length >= 1);
        Self { offset, length }
    }

    #[inline(always)]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/////////////////////////////////////////////////////////////////////////////
/////////////////////////////////////////////////////////////////////////////

/// An ordered sequence of disjoint, non-adjacent extents: the free side of
/// an allocator's complement.
///
/// Invariants (checked in debug builds by [`Freelist::check_invariants`]):
/// for adjacent entries `e_i, e_{i+1}`: `e_i.end() < e_{i+1}.offset`
/// (touching extents must be merged); no extent overlaps another; every
/// extent has `length >= 1`.
#[derive(Clone, Debug, Default)]
pub struct Freelist {
    extents: Vec<Extent>,
    // length-bucketed index: extent length -> set of indices into `extents`
    // whose length equals it. Purely an acceleration structure for
    // first-fit lookup; the ordered `extents` vector above remains the
    // source of truth.
    by_length: BTreeMap<usize, BTreeSet<usize>>,
}

impl Freelist {
    /// An empty freelist (no free space at all).
    pub fn new() -> Self {
        Self::default()
    }

    /// A freelist seeded with a single free extent `[offset, offset+count)`.
    pub fn with_seed(offset: usize, count: usize) -> Self {
        let mut fl = Self::new();
        if count > 0 {
            fl.pool(offset, count);
        }
        fl
    }

    #[inline(always)]
    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }

    fn rebuild_index(&mut self) {
        self.by_length.clear();
        for (i, e) in self.extents.iter().enumerate() {
            self.by_length.entry(e.length).or_default().insert(i);
        }
    }

    /// Returns the offset of the first extent whose length is `>= count`,
    /// trimming (or removing) that extent. `count` must be `>= 1`.
    pub fn alloc(&mut self, count: usize) -> Option<usize> {
        debug_assert!(count >= 1);
        // Lowest index among long-enough buckets is the leftmost offset.
        let idx = self
            .by_length
            .range(count..)
            .flat_map(|(_, idxs)| idxs.iter().copied())
            .min()?;
        let e = self.extents[idx];
        let ofs = e.offset;
        if e.length == count {
            self.extents.remove(idx);
        } else {
            self.extents[idx] = Extent::new(e.offset + count, e.length - count);
        }
        self.rebuild_index();
        Some(ofs)
    }

    /// Inserts `[ofs, ofs+count)` into the free set, coalescing with
    /// immediate neighbors. Overlap with an existing extent is a contract
    /// violation and aborts.
    pub fn pool(&mut self, ofs: usize, count: usize) {
        debug_assert!(count >= 1);
        let end = ofs + count;

        let insert_at = self
            .extents
            .iter()
            .position(|e| e.offset > ofs)
            .unwrap_or(self.extents.len());

        let prev_idx = if insert_at > 0 {
            Some(insert_at - 1)
        } else {
            None
        };
        let next_idx = if insert_at < self.extents.len() {
            Some(insert_at)
        } else {
            None
        };

        if let Some(pi) = prev_idx {
            self.assert_no_overlap(self.extents[pi], ofs, end);
        }
        if let Some(ni) = next_idx {
            self.assert_no_overlap(self.extents[ni], ofs, end);
        }

        let touches_prev = prev_idx
            .map(|pi| self.extents[pi].end() == ofs)
            .unwrap_or(false);
        let touches_next = next_idx
            .map(|ni| self.extents[ni].offset == end)
            .unwrap_or(false);

        match (touches_prev, touches_next) {
            (true, true) => {
                // bridge: prev, new range and next all coalesce into one.
                let pi = prev_idx.unwrap();
                let ni = next_idx.unwrap();
                let new_len = self.extents[ni].end() - self.extents[pi].offset;
                self.extents[pi] = Extent::new(self.extents[pi].offset, new_len);
                self.extents.remove(ni);
            }
            (false, true) => {
                // grow-next: extend the successor downward.
                let ni = next_idx.unwrap();
                let new_len = self.extents[ni].end() - ofs;
                self.extents[ni] = Extent::new(ofs, new_len);
            }
            (true, false) => {
                // grow-prev: extend the predecessor upward.
                let pi = prev_idx.unwrap();
                let new_len = end - self.extents[pi].offset;
                self.extents[pi] = Extent::new(self.extents[pi].offset, new_len);
            }
            (false, false) => {
                // normal / end / initial: fresh entry.
                self.extents.insert(insert_at, Extent::new(ofs, count));
            }
        }

        self.rebuild_index();
        debug_assert!(self.check_invariants());
    }

    /// Aborts if `[ofs, end)` overlaps `existing`.
    fn assert_no_overlap(&self, existing: Extent, ofs: usize, end: usize) {
        assert!(
            !(ofs < existing.end() && existing.offset < end),
            "freelist pool: [{ofs}, {end}) overlaps existing extent [{}, {})",
            existing.offset,
            existing.end(),
        );
    }

    /// Removes the sub-range `[ofs, ofs+count)`, which must lie wholly
    /// inside a single existing extent. Returns `false` if no such extent
    /// exists (the range is not entirely free).
    pub fn thwack(&mut self, ofs: usize, count: usize) -> bool {
        debug_assert!(count >= 1);
        let end = ofs + count;

        let Some(idx) = self
            .extents
            .iter()
            .position(|e| e.offset <= ofs && end <= e.end())
        else {
            return false;
        };

        let e = self.extents[idx];
        match (e.offset == ofs, end == e.end()) {
            (true, true) => {
                self.extents.remove(idx);
            }
            (true, false) => {
                self.extents[idx] = Extent::new(end, e.end() - end);
            }
            (false, true) => {
                self.extents[idx] = Extent::new(e.offset, ofs - e.offset);
            }
            (false, false) => {
                self.extents[idx] = Extent::new(e.offset, ofs - e.offset);
                self.extents
                    .insert(idx + 1, Extent::new(end, e.end() - end));
            }
        }

        self.rebuild_index();
        debug_assert!(self.check_invariants());
        true
    }

    /// Validates the ordering invariant. Exposed for tests.
    pub fn check_invariants(&self) -> bool {
        self.extents.iter().all(|e| e.length >= 1)
            && self
                .extents
                .windows(2)
                .all(|w| w[0].end() < w[1].offset)
    }
}
