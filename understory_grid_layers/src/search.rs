// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell search over any layer.

use crate::{Axis, DataProvider, Direction, Index, Layer, PositionCoordinate};

/// Which axis a search walks first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchOrder {
    /// Walk along each row, then move to the next row.
    #[default]
    RowFirst,
    /// Walk down each column, then move to the next column.
    ColumnFirst,
}

/// How [`find_cell`] walks the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOptions {
    /// Walk direction.
    pub direction: Direction,
    /// Continue from the other end after the last cell, ending on the start cell.
    pub wrap: bool,
    /// Traversal order.
    pub order: SearchOrder,
}

/// Finds the next cell of `layer` whose value satisfies `matches`.
///
/// The walk starts after `start` (exclusive) in the configured direction, or at
/// the first cell in that direction when `start` is `None`. Values are read from
/// `provider` by backing index; cells with a synthetic identity are skipped.
///
/// Returns the position of the match in `layer`'s space.
pub fn find_cell<L, P>(
    layer: &L,
    provider: &P,
    start: Option<PositionCoordinate>,
    options: &SearchOptions,
    mut matches: impl FnMut(&P::Value) -> bool,
) -> Option<PositionCoordinate>
where
    L: Layer + ?Sized,
    P: DataProvider + ?Sized,
{
    let columns = layer.element_count(Axis::Column);
    let rows = layer.element_count(Axis::Row);
    let total = columns * rows;
    if total == 0 {
        return None;
    }
    let linear = |cell: PositionCoordinate| match options.order {
        SearchOrder::RowFirst => cell.row * columns + cell.column,
        SearchOrder::ColumnFirst => cell.column * rows + cell.row,
    };
    let cell_at = |step: usize| match options.order {
        SearchOrder::RowFirst => PositionCoordinate::new(step % columns, step / columns),
        SearchOrder::ColumnFirst => PositionCoordinate::new(step / rows, step % rows),
    };

    let start = start.filter(|cell| cell.column < columns && cell.row < rows);
    let (from, steps) = match (start, options.direction) {
        (None, Direction::Forward) => (total - 1, total),
        (None, Direction::Backward) => (0, total),
        (Some(cell), direction) => {
            let from = linear(cell);
            let steps = match (options.wrap, direction) {
                (true, _) => total,
                (false, Direction::Forward) => total - 1 - from,
                (false, Direction::Backward) => from,
            };
            (from, steps)
        }
    };

    (1..=steps)
        .map(|k| match options.direction {
            Direction::Forward => (from + k) % total,
            Direction::Backward => (from + total - k) % total,
        })
        .map(cell_at)
        .find(|cell| {
            let column = layer.index_of_position(Axis::Column, cell.column).and_then(Index::backed);
            let row = layer.index_of_position(Axis::Row, cell.row).and_then(Index::backed);
            column
                .zip(row)
                .and_then(|(column, row)| provider.value(column, row))
                .is_some_and(|value| matches(&value))
        })
}
