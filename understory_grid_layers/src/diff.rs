// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural diffs: how the positions along one axis changed shape.
//!
//! A [`StructuralChange`] relates an *old* position space (before the change) to a
//! *new* one. Every diff carries a `before` range in old positions and an `after`
//! range in new positions:
//!
//! - `Add`: `before` is a zero-width anchor at the old position the inserted block
//!   precedes; `after` covers the inserted positions.
//! - `Delete`: `before` covers the removed positions; `after` is a zero-width anchor
//!   at the new position that follows the removed block.
//! - `Update`: both ranges have the same width and identify the same elements, whose
//!   content or extent changed in place.
//!
//! Diffs are sorted by `before.start`, and deletes and adds never overlap, so the
//! old-to-new position mapping is a pair of counting sums that does not depend on
//! how the diffs are ordered.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::Range;

/// The kind of a [`StructuralDiff`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiffKind {
    /// Positions were inserted.
    Add,
    /// Positions were removed.
    Delete,
    /// Positions kept their identity but changed content or extent.
    Update,
}

impl DiffKind {
    const fn rank(self) -> u8 {
        match self {
            Self::Delete => 0,
            Self::Add => 1,
            Self::Update => 2,
        }
    }
}

/// One typed change over a contiguous block of positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralDiff {
    /// What happened.
    pub kind: DiffKind,
    /// Affected range in the old position space.
    pub before: Range,
    /// Affected range in the new position space.
    pub after: Range,
}

impl StructuralDiff {
    /// Insertion of `added` (new positions) before old position `anchor`.
    #[must_use]
    pub const fn add(anchor: usize, added: Range) -> Self {
        Self {
            kind: DiffKind::Add,
            before: Range::empty_at(anchor),
            after: added,
        }
    }

    /// Removal of `deleted` (old positions); the next survivor sits at new `anchor`.
    #[must_use]
    pub const fn delete(deleted: Range, anchor: usize) -> Self {
        Self {
            kind: DiffKind::Delete,
            before: deleted,
            after: Range::empty_at(anchor),
        }
    }

    /// In-place change of the elements at `before` (old) and `after` (new).
    #[must_use]
    pub const fn update(before: Range, after: Range) -> Self {
        debug_assert!(
            before.len() == after.len(),
            "update diffs relate ranges of equal width"
        );
        Self {
            kind: DiffKind::Update,
            before,
            after,
        }
    }
}

/// A sorted, coalesced list of diffs for one axis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralChange {
    diffs: SmallVec<[StructuralDiff; 4]>,
}

impl StructuralChange {
    /// Builds the minimal change from sets of positions.
    ///
    /// - `deleted`: old positions that no longer exist.
    /// - `added`: new positions that did not exist before.
    /// - `updated`: `(old, new)` pairs of surviving elements that changed in place.
    ///
    /// Inputs may be unsorted and contain duplicates. Contiguous positions are merged
    /// into single diffs.
    #[must_use]
    pub fn build(
        deleted: impl IntoIterator<Item = usize>,
        added: impl IntoIterator<Item = usize>,
        updated: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let deleted = Range::coalesce(deleted);
        let added = Range::coalesce(added);
        let mut diffs: SmallVec<[StructuralDiff; 4]> = SmallVec::new();

        // `removed` and `inserted` count the positions emitted so far, which is what
        // converts an old position into a new one at the merge point.
        let (mut removed, mut inserted) = (0_usize, 0_usize);
        let (mut di, mut ai) = (0, 0);
        loop {
            let take_delete = match (deleted.get(di), added.get(ai)) {
                (Some(del), Some(add)) => del.start + inserted <= add.start + removed,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if take_delete {
                let del = deleted[di];
                diffs.push(StructuralDiff::delete(del, del.start + inserted - removed));
                removed += del.len();
                di += 1;
            } else {
                let add = added[ai];
                diffs.push(StructuralDiff::add(add.start + removed - inserted, add));
                inserted += add.len();
                ai += 1;
            }
        }

        let mut pairs: Vec<(usize, usize)> = updated.into_iter().collect();
        pairs.sort_unstable();
        pairs.dedup();
        let mut run: Option<(Range, Range)> = None;
        for (old, new) in pairs {
            run = match run {
                Some((before, after)) if before.end == old && after.end == new => Some((
                    Range::new(before.start, old + 1),
                    Range::new(after.start, new + 1),
                )),
                Some((before, after)) => {
                    diffs.push(StructuralDiff::update(before, after));
                    Some((Range::new(old, old + 1), Range::new(new, new + 1)))
                }
                None => Some((Range::new(old, old + 1), Range::new(new, new + 1))),
            };
        }
        if let Some((before, after)) = run {
            diffs.push(StructuralDiff::update(before, after));
        }

        diffs.sort_by_key(|diff| (diff.before.start, diff.kind.rank()));
        Self { diffs }
    }

    /// A change that updates every position of `range` in place.
    #[must_use]
    pub fn updated(range: Range) -> Self {
        Self::build([], [], range.iter().map(|p| (p, p)))
    }

    /// The diffs, sorted by `before.start`.
    #[must_use]
    pub fn diffs(&self) -> &[StructuralDiff] {
        &self.diffs
    }

    /// Returns `true` if there are no diffs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Returns `true` if any diff adds or deletes positions.
    #[must_use]
    pub fn changes_count(&self) -> bool {
        self.diffs.iter().any(|d| d.kind != DiffKind::Update)
    }

    /// Number of positions after the change, given the count before it.
    #[must_use]
    pub fn new_count(&self, old_count: usize) -> usize {
        let (deleted, added) = self.diffs.iter().fold((0, 0), |(d, a), diff| match diff.kind {
            DiffKind::Delete => (d + diff.before.len(), a),
            DiffKind::Add => (d, a + diff.after.len()),
            DiffKind::Update => (d, a),
        });
        (old_count + added).saturating_sub(deleted)
    }

    /// New position of the element at old position `position`, or `None` if it was
    /// deleted.
    #[must_use]
    pub fn map_old(&self, position: usize) -> Option<usize> {
        let mut shift_down = 0;
        let mut shift_up = 0;
        for diff in &self.diffs {
            match diff.kind {
                DiffKind::Delete if diff.before.contains(position) => return None,
                DiffKind::Delete if diff.before.end <= position => shift_down += diff.before.len(),
                DiffKind::Add if diff.before.start <= position => shift_up += diff.after.len(),
                _ => {}
            }
        }
        Some(position + shift_up - shift_down)
    }

    /// Old position of the element at new position `position`, or `None` if it was
    /// added.
    #[must_use]
    pub fn map_new(&self, position: usize) -> Option<usize> {
        let mut shift_down = 0;
        let mut shift_up = 0;
        for diff in &self.diffs {
            match diff.kind {
                DiffKind::Add if diff.after.contains(position) => return None,
                DiffKind::Add if diff.after.end <= position => shift_down += diff.after.len(),
                DiffKind::Delete if diff.after.start <= position => shift_up += diff.before.len(),
                _ => {}
            }
        }
        Some(position + shift_up - shift_down)
    }

    /// New position of the closest element at or before old `position` that survived.
    #[must_use]
    pub fn nearest_surviving_before(&self, position: usize) -> Option<usize> {
        match self
            .diffs
            .iter()
            .find(|d| d.kind == DiffKind::Delete && d.before.contains(position))
        {
            Some(deleted) => deleted
                .before
                .start
                .checked_sub(1)
                .and_then(|p| self.nearest_surviving_before(p)),
            None => self.map_old(position),
        }
    }

    /// Old positions that were deleted, ascending.
    pub fn deleted_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.diffs
            .iter()
            .filter(|d| d.kind == DiffKind::Delete)
            .flat_map(|d| d.before.iter())
    }

    /// New positions that were added, ascending.
    pub fn added_positions(&self) -> impl Iterator<Item = usize> + '_ {
        let mut added: SmallVec<[Range; 4]> = self
            .diffs
            .iter()
            .filter(|d| d.kind == DiffKind::Add)
            .map(|d| d.after)
            .collect();
        added.sort_unstable_by_key(|r| r.start);
        added.into_iter().flat_map(|r| r.iter())
    }

    /// `(old, new)` pairs of elements updated in place, ascending.
    pub fn updated_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.diffs
            .iter()
            .filter(|d| d.kind == DiffKind::Update)
            .flat_map(|d| d.before.iter().zip(d.after.iter()))
    }
}

/// A permutation of the positions inside one range.
///
/// Reorders produce a move instead of delete/add pairs so that state keyed by
/// position (hidden sets, selections) follows the moved elements.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionMove {
    range: Range,
    targets: Vec<usize>,
}

impl PositionMove {
    /// The element at `range.start + i` moves to `targets[i]`.
    ///
    /// Returns `None` unless `targets` is a permutation of `range`.
    #[must_use]
    pub fn new(range: Range, targets: Vec<usize>) -> Option<Self> {
        if targets.len() != range.len() {
            return None;
        }
        let mut seen = targets.clone();
        seen.sort_unstable();
        if !seen.iter().copied().eq(range.iter()) {
            return None;
        }
        Some(Self { range, targets })
    }

    /// The affected range (identical in old and new space).
    #[must_use]
    pub const fn range(&self) -> Range {
        self.range
    }

    /// New position of the element at old `position`.
    #[must_use]
    pub fn map(&self, position: usize) -> usize {
        if self.range.contains(position) {
            self.targets[position - self.range.start]
        } else {
            position
        }
    }

    /// `(old, new)` pairs for every position inside the range.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.range.iter().zip(self.targets.iter().copied())
    }

    /// Returns `true` if no element changes position.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.iter().all(|(old, new)| old == new)
    }

    /// The move viewed as an in-place update of its range, for consumers that only
    /// track which positions changed.
    #[must_use]
    pub fn as_update(&self) -> StructuralDiff {
        StructuralDiff::update(self.range, self.range)
    }
}
