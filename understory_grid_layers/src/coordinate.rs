// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate primitives: axes, ranges, cell coordinates, regions and indexes.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

/// One of the two grid axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Horizontal axis; elements are columns.
    Column,
    /// Vertical axis; elements are rows.
    Row,
}

impl Axis {
    /// Both axes, columns first.
    pub const ALL: [Self; 2] = [Self::Column, Self::Row];

    /// The perpendicular axis.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Column => Self::Row,
            Self::Row => Self::Column,
        }
    }

    /// Lower-case element name (`"column"` or `"row"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Row => "row",
        }
    }

    /// Capitalized element name, used inside persisted property keys.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Column => "Column",
            Self::Row => "Row",
        }
    }

    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::Column => 0,
            Self::Row => 1,
        }
    }
}

/// Half-open interval `[start, end)` over positions or indexes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    /// First element (inclusive).
    pub start: usize,
    /// One past the last element (exclusive).
    pub end: usize,
}

impl Range {
    /// Creates `[start, end)`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range start must not exceed its end");
        Self { start, end }
    }

    /// Zero-width range anchored at `at`.
    #[must_use]
    pub const fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// Number of elements covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the range covers nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if `value` lies in `[start, end)`.
    #[must_use]
    pub const fn contains(&self, value: usize) -> bool {
        self.start <= value && value < self.end
    }

    /// Returns `true` if `other` lies entirely inside this range.
    #[must_use]
    pub const fn contains_range(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Overlap of two ranges, or `None` if they do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Self { start, end })
    }

    /// Iterates the covered values.
    pub fn iter(&self) -> core::ops::Range<usize> {
        self.start..self.end
    }

    /// Sorts and merges values into maximal contiguous ranges.
    #[must_use]
    pub fn coalesce(values: impl IntoIterator<Item = usize>) -> Vec<Self> {
        let mut values: Vec<usize> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        let mut out: Vec<Self> = Vec::new();
        for value in values {
            match out.last_mut() {
                Some(last) if last.end == value => last.end += 1,
                _ => out.push(Self::new(value, value + 1)),
            }
        }
        out
    }
}

impl From<core::ops::Range<usize>> for Range {
    fn from(range: core::ops::Range<usize>) -> Self {
        Self::new(range.start, range.end.max(range.start))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A cell address as a (column, row) position pair in one layer's space.
///
/// Coordinates order by row first, then column, which is the reading order used
/// for selection listings and search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionCoordinate {
    /// Column position.
    pub column: usize,
    /// Row position.
    pub row: usize,
}

impl PositionCoordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// Component along `axis`.
    #[must_use]
    pub const fn get(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.column,
            Axis::Row => self.row,
        }
    }

    /// Copy with the component along `axis` replaced.
    #[must_use]
    pub const fn with(mut self, axis: Axis, value: usize) -> Self {
        match axis {
            Axis::Column => self.column = value,
            Axis::Row => self.row = value,
        }
        self
    }
}

impl Ord for PositionCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for PositionCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A rectangular block of cells: origin plus width and height in positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRegion {
    /// Leftmost column.
    pub column: usize,
    /// Topmost row.
    pub row: usize,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl CellRegion {
    /// Creates a region.
    #[must_use]
    pub const fn new(column: usize, row: usize, width: usize, height: usize) -> Self {
        Self {
            column,
            row,
            width,
            height,
        }
    }

    /// A single cell.
    #[must_use]
    pub const fn cell(coordinate: PositionCoordinate) -> Self {
        Self::new(coordinate.column, coordinate.row, 1, 1)
    }

    /// Smallest region containing both coordinates.
    #[must_use]
    pub fn spanning(a: PositionCoordinate, b: PositionCoordinate) -> Self {
        let column = a.column.min(b.column);
        let row = a.row.min(b.row);
        Self::new(
            column,
            row,
            a.column.max(b.column) - column + 1,
            a.row.max(b.row) - row + 1,
        )
    }

    /// Region covering `range` along `axis` and `other` along the other axis.
    #[must_use]
    pub const fn from_ranges(axis: Axis, range: Range, other: Range) -> Self {
        match axis {
            Axis::Column => Self::new(range.start, other.start, range.len(), other.len()),
            Axis::Row => Self::new(other.start, range.start, other.len(), range.len()),
        }
    }

    /// Top-left cell.
    #[must_use]
    pub const fn origin(&self) -> PositionCoordinate {
        PositionCoordinate::new(self.column, self.row)
    }

    /// Bottom-right cell, or `None` for an empty region.
    #[must_use]
    pub const fn far_corner(&self) -> Option<PositionCoordinate> {
        if self.is_empty() {
            None
        } else {
            Some(PositionCoordinate::new(
                self.column + self.width - 1,
                self.row + self.height - 1,
            ))
        }
    }

    /// Covered positions along `axis`.
    #[must_use]
    pub const fn range(&self, axis: Axis) -> Range {
        match axis {
            Axis::Column => Range::new(self.column, self.column + self.width),
            Axis::Row => Range::new(self.row, self.row + self.height),
        }
    }

    /// Returns `true` if the region covers no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if `coordinate` lies inside the region.
    #[must_use]
    pub const fn contains(&self, coordinate: PositionCoordinate) -> bool {
        self.range(Axis::Column).contains(coordinate.column)
            && self.range(Axis::Row).contains(coordinate.row)
    }

    /// Overlap with `[0, columns) x [0, rows)`.
    #[must_use]
    pub fn clip(&self, columns: usize, rows: usize) -> Self {
        let column_end = (self.column + self.width).min(columns);
        let row_end = (self.row + self.height).min(rows);
        Self::new(
            self.column,
            self.row,
            column_end.saturating_sub(self.column),
            row_end.saturating_sub(self.row),
        )
    }

    /// Covered cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = PositionCoordinate> + use<> {
        let columns = self.range(Axis::Column);
        self.range(Axis::Row)
            .iter()
            .flat_map(move |row| {
                columns
                    .iter()
                    .map(move |column| PositionCoordinate::new(column, row))
            })
    }
}

/// Identity of a synthesized element that has no backing data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyntheticId {
    /// Tag of the layer that synthesized the element.
    pub tag: u32,
    /// Ordinal among that layer's synthesized elements.
    pub ordinal: usize,
}

/// Stable identity of an element along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Index {
    /// An element of the backing data source.
    Backed(usize),
    /// An element synthesized by a layer, such as a summary row.
    Synthetic(SyntheticId),
}

impl Index {
    /// The backing index, if this element has one.
    #[must_use]
    pub const fn backed(self) -> Option<usize> {
        match self {
            Self::Backed(index) => Some(index),
            Self::Synthetic(_) => None,
        }
    }
}

impl From<usize> for Index {
    fn from(index: usize) -> Self {
        Self::Backed(index)
    }
}
