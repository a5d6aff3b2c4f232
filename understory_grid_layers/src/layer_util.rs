// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lookups shared by every layer: pixel search, cross-layer translation and cells.

use kurbo::Rect;

use crate::{Axis, CellRegion, Index, Layer, PositionCoordinate, Range};

/// Position of `layer` containing `pixel` along `axis`.
///
/// Narrows an average-extent estimate using the layer's own start pixels and
/// extents; see [`understory_extent::position_at_pixel`].
pub fn position_at_pixel<L: Layer + ?Sized>(
    layer: &mut L,
    axis: Axis,
    pixel: i64,
) -> Option<usize> {
    let total = layer.total_extent(axis);
    let count = layer.element_count(axis);
    understory_extent::position_at_pixel(pixel, count, total, |position| {
        (
            layer.start_pixel_of_position(axis, position).unwrap_or(total),
            layer.extent_of_position(axis, position).unwrap_or(0),
        )
    })
}

/// Translates a position between two layers that share backing indexes but not
/// necessarily a wrapping relation (for example a row header and the body).
///
/// Returns `None` if the element is absent from either layer.
pub fn convert_position<S, T>(source: &S, axis: Axis, position: usize, target: &T) -> Option<usize>
where
    S: Layer + ?Sized,
    T: Layer + ?Sized,
{
    let index = source.index_of_position(axis, position)?;
    target.position_of_index(axis, index)
}

/// A cell as seen from one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// Positions covered by the cell. A plain cell covers one position per axis; a
    /// spanning cell covers every shown position of its span.
    pub region: CellRegion,
    /// Position the cell was looked up at.
    pub position: PositionCoordinate,
    /// Identity of the cell's column at `position`.
    pub column_index: Index,
    /// Identity of the cell's row at `position`.
    pub row_index: Index,
}

impl Cell {
    /// Returns `true` if the cell covers more than one position.
    #[must_use]
    pub const fn is_spanning(&self) -> bool {
        self.region.width > 1 || self.region.height > 1
    }

    /// Top-left position of the cell.
    #[must_use]
    pub const fn origin(&self) -> PositionCoordinate {
        self.region.origin()
    }
}

/// Looks up the cell at a position, resolving spans.
///
/// A span is declared in backing indexes. The reported region is the contiguous
/// block of positions around `(column, row)` whose elements belong to the span, so
/// it shrinks when spanned elements are hidden, reordered away or scrolled out.
pub fn cell_by_position<L: Layer + ?Sized>(layer: &L, column: usize, row: usize) -> Option<Cell> {
    let column_index = layer.index_of_position(Axis::Column, column)?;
    let row_index = layer.index_of_position(Axis::Row, row)?;
    let position = PositionCoordinate::new(column, row);
    let region = match layer.span_of_index(column_index, row_index) {
        Some(span) => CellRegion::from_ranges(
            Axis::Column,
            shown_span(layer, Axis::Column, column, span.range(Axis::Column)),
            shown_span(layer, Axis::Row, row, span.range(Axis::Row)),
        ),
        None => CellRegion::cell(position),
    };
    Some(Cell {
        region,
        position,
        column_index,
        row_index,
    })
}

fn shown_span<L: Layer + ?Sized>(layer: &L, axis: Axis, position: usize, indexes: Range) -> Range {
    let in_span = |p: usize| {
        layer
            .index_of_position(axis, p)
            .and_then(Index::backed)
            .is_some_and(|i| indexes.contains(i))
    };
    let mut start = position;
    while start > 0 && in_span(start - 1) {
        start -= 1;
    }
    let mut end = position + 1;
    while in_span(end) {
        end += 1;
    }
    Range::new(start, end)
}

/// Pixel rectangle covered by `cell` in `layer`'s pixel space.
pub fn cell_bounds<L: Layer + ?Sized>(layer: &mut L, cell: &Cell) -> Option<Rect> {
    let columns = cell.region.range(Axis::Column);
    let rows = cell.region.range(Axis::Row);
    let (x0, x1) = pixel_span(layer, Axis::Column, columns)?;
    let (y0, y1) = pixel_span(layer, Axis::Row, rows)?;
    Some(Rect::new(x0 as f64, y0 as f64, x1 as f64, y1 as f64))
}

fn pixel_span<L: Layer + ?Sized>(layer: &mut L, axis: Axis, range: Range) -> Option<(i64, i64)> {
    let last = range.end.checked_sub(1)?;
    let start = layer.start_pixel_of_position(axis, range.start)?;
    let end = layer.start_pixel_of_position(axis, last)?
        + i64::from(layer.extent_of_position(axis, last)?);
    Some((start, end))
}
