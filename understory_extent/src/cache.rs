// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A lazily-maintained prefix-sum cache of element start offsets.

use alloc::vec::Vec;

/// Lazily-maintained start offsets for a strip of `len` elements.
///
/// The cache does not own extents. Every query receives the strip length and a
/// callback that reports the extent of a position, and the cache extends its
/// prefix sums only as far as the query needs. Owners call
/// [`ExtentCache::invalidate`] or [`ExtentCache::invalidate_from`] whenever an
/// extent or the strip length changes.
#[derive(Clone, Debug, Default)]
pub struct ExtentCache {
    // `starts[i]` is the start of element `i`; `starts[len]` is the total extent.
    starts: Vec<i64>,
}

impl ExtentCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { starts: Vec::new() }
    }

    /// Drops every cached offset.
    pub fn invalidate(&mut self) {
        self.starts.clear();
    }

    /// Drops cached offsets that depend on the extent of `position`.
    ///
    /// The start of `position` itself stays valid; everything after it is recomputed
    /// on demand.
    pub fn invalidate_from(&mut self, position: usize) {
        self.starts.truncate(position.saturating_add(1));
    }

    /// Number of start offsets currently cached.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.starts.len()
    }

    /// Returns the start offset of `position` within a strip of `len` elements.
    ///
    /// `position == len` yields the total extent. Positions beyond `len` yield `None`.
    pub fn start_of(
        &mut self,
        position: usize,
        len: usize,
        mut extent_of: impl FnMut(usize) -> u32,
    ) -> Option<i64> {
        if position > len {
            return None;
        }
        debug_assert!(
            self.starts.len() <= len + 1,
            "ExtentCache holds {} offsets for a strip of {len}; owner forgot to invalidate",
            self.starts.len()
        );
        if self.starts.is_empty() {
            self.starts.push(0);
        }
        while self.starts.len() <= position {
            let last = self.starts.len() - 1;
            let next = self.starts[last] + i64::from(extent_of(last));
            self.starts.push(next);
        }
        self.starts.get(position).copied()
    }

    /// Returns the total extent of a strip of `len` elements.
    pub fn total(&mut self, len: usize, extent_of: impl FnMut(usize) -> u32) -> i64 {
        self.start_of(len, len, extent_of).unwrap_or(0)
    }
}
