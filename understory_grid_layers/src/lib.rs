// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_grid_layers --heading-base-level=0

//! Understory Grid Layers: a composable stack of grid transformations.
//!
//! A virtualized grid is modeled as a stack of [`Layer`]s. Each layer maps its own
//! *positions* onto the positions of the layer it wraps, reports a pixel extent per
//! position, and re-expresses structural changes from below in its own space.
//! Three coordinate spaces are in play:
//!
//! - **index**: stable identity of an element in the backing data ([`Index`]);
//! - **position**: where an element sits in one particular layer;
//! - **pixel**: where a position sits on screen in that layer.
//!
//! The layers provided here:
//!
//! - [`DataLayer`]: the bottom of every stack; positions equal backing indexes and
//!   pixel sizes come from an [`understory_extent::SizeConfig`] per axis.
//! - [`ReorderLayer`]: a mutable permutation of one axis.
//! - [`HideShowLayer`]: removes elements of one axis, manually or through a filter.
//! - [`SummaryLayer`]: appends synthetic elements, such as a totals row.
//! - [`SelectionLayer`]: selected cells and an anchor that follow structural changes.
//! - [`ViewportLayer`]: the window of positions intersecting a client area.
//!
//! Mutations arrive as [`Command`]s at the top of a stack. Each layer handles a
//! command or converts it into the space below and forwards it. The resulting
//! [`LayerEvent`] travels back up, rebuilt in each layer's space: structural
//! changes are minimal, sorted lists of add/delete/update ranges
//! ([`StructuralChange`]), or a permutation ([`PositionMove`]) for reorders.
//! [`LayerStack`] owns a composed stack and fans events out to listeners.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_grid_layers::{
//!     Axis, Command, DataLayer, HideShowLayer, Index, LayerExt, LayerStack, ReorderLayer,
//! };
//!
//! let data = DataLayer::new(5, 100, 80, 20);
//! let body = HideShowLayer::new(ReorderLayer::new(data, Axis::Column), Axis::Column);
//! let mut stack = LayerStack::new(body);
//!
//! // Move the last column to the front, then hide what is now the second column.
//! stack.do_command(&Command::Reorder { axis: Axis::Column, from: vec![4], to: 0 })?;
//! stack.do_command(&Command::Hide { axis: Axis::Column, positions: vec![1] })?;
//!
//! let top = stack.top();
//! assert_eq!(top.column_count(), 4);
//! assert_eq!(top.column_index_by_position(0), Some(Index::Backed(4)));
//! assert_eq!(top.column_index_by_position(1), Some(Index::Backed(1)));
//! assert_eq!(top.column_position_by_index(0), None);
//! # Ok::<(), understory_grid_layers::GridError>(())
//! ```
//!
//! Queries answer `None` for anything outside a layer, so lookups chain with `?`.
//! Commands return [`GridError`] only for requests a layer cannot honor, such as a
//! position-relative show on a filtered [`HideShowLayer`].
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std`.
//! - `libm`: `no_std` float support for `kurbo`.
//! - `tracing`: `debug!` events for every mutation.
//! - `serde`: `Serialize`/`Deserialize` for value types, events and [`Properties`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod command;
mod coordinate;
mod data;
mod diff;
mod error;
mod event;
mod hide_show;
mod layer;
pub mod layer_util;
mod properties;
mod provider;
mod reorder;
mod search;
mod selection;
mod stack;
mod summary;
mod viewport;

pub use command::{Command, CommandOutcome, DataChange, Direction, Modifiers};
pub use coordinate::{Axis, CellRegion, Index, PositionCoordinate, Range, SyntheticId};
pub use data::{DataLayer, SpanSource};
pub use diff::{DiffKind, PositionMove, StructuralChange, StructuralDiff};
pub use error::GridError;
pub use event::{Axes, AxisChange, LayerEvent, StructuralEvent, VisualEvent};
pub use hide_show::HideShowLayer;
pub use layer::{Layer, LayerExt, forward_command};
pub use layer_util::{Cell, convert_position};
pub use properties::Properties;
pub use provider::{ColumnAccessor, DataProvider, ListDataProvider};
pub use reorder::ReorderLayer;
pub use search::{SearchOptions, SearchOrder, find_cell};
pub use selection::SelectionLayer;
pub use stack::{LayerStack, ListenerId};
pub use summary::SummaryLayer;
pub use viewport::ViewportLayer;

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use proptest::prelude::*;

    use crate::{
        Axis, CellRegion, ColumnAccessor, Command, DataChange, DataLayer, HideShowLayer, Index,
        Layer, LayerExt, ListDataProvider, Modifiers, PositionCoordinate, ReorderLayer,
        SearchOptions, SelectionLayer, ViewportLayer, find_cell,
    };

    type Body = HideShowLayer<ReorderLayer<DataLayer>>;

    #[test]
    fn scenario_reorder_last_to_front() {
        let mut layer = ReorderLayer::new(DataLayer::new(4, 1, 10, 10), Axis::Column);
        layer.reorder(3, 0);
        assert_eq!(layer.order(), &[3, 0, 1, 2]);
        assert_eq!(layer.column_position_by_index(3), Some(0));
        assert_eq!(layer.column_position_by_index(0), Some(1));
    }

    #[test]
    fn scenario_hide_then_show_column() {
        let mut layer = HideShowLayer::new(DataLayer::new(5, 1, 10, 10), Axis::Column);
        layer.hide_positions(&[1]).unwrap();
        assert_eq!(layer.column_count(), 4);
        assert_eq!(layer.column_index_by_position(1), Some(Index::Backed(2)));
        layer.show_indexes(&[Index::Backed(1)]).unwrap();
        assert_eq!(layer.column_index_by_position(1), Some(Index::Backed(1)));
    }

    #[test]
    fn scenario_viewport_scrolls_back_one_pixel() {
        let mut data = DataLayer::new(5, 1, 100, 10);
        for (position, width) in [(0, 150), (2, 35), (4, 80)] {
            data.size_config_mut(Axis::Column).set_size(position, width);
        }
        let mut viewport = ViewportLayer::new(data, 200, 10);
        let origin = viewport.inner_mut().start_x_of_column_position(2).unwrap();
        viewport
            .do_command(&Command::SetOrigin {
                axis: Axis::Column,
                pixel: origin,
            })
            .unwrap();
        viewport
            .do_command(&Command::ScrollBy {
                axis: Axis::Column,
                delta: -1,
            })
            .unwrap();
        assert_eq!(viewport.first_position(Axis::Column), Some(1));
        assert_eq!(viewport.column_index_by_position(0), Some(Index::Backed(1)));
    }

    #[test]
    fn scenario_ctrl_reselect_clears_region() {
        let mut layer = SelectionLayer::new(DataLayer::new(3, 3, 10, 10));
        let region = CellRegion::new(0, 0, 1, 1);
        layer.select_region(region, Modifiers::empty(), None);
        layer.select_region(region, Modifiers::CTRL, None);
        assert!(layer.selected_positions().is_empty());
        assert_eq!(layer.anchor(), None);

        layer.select_region(CellRegion::new(2, 1, 1, 1), Modifiers::empty(), None);
        layer.select_region(region, Modifiers::CTRL, None);
        layer.select_region(region, Modifiers::CTRL, None);
        assert_eq!(layer.anchor(), Some(PositionCoordinate::new(2, 1)));
    }

    #[derive(Debug)]
    struct Digits;

    impl ColumnAccessor<[u8; 10]> for Digits {
        type Value = u8;

        fn column_count(&self) -> usize {
            10
        }

        fn get(&self, row: &[u8; 10], column: usize) -> Option<u8> {
            row.get(column).copied()
        }

        fn set(&self, row: &mut [u8; 10], column: usize, value: u8) -> bool {
            row.get_mut(column).map(|cell| *cell = value).is_some()
        }
    }

    #[test]
    fn scenario_search_wraps_to_the_first_cell() {
        let mut rows = vec![[0_u8; 10]; 5];
        rows[0][3] = 7;
        let provider = ListDataProvider::new(rows, Digits);
        let layer = DataLayer::for_provider(&provider, 40, 20);
        let start = Some(PositionCoordinate::new(4, 2));
        let is_seven = |v: &u8| *v == 7;

        let plain = SearchOptions::default();
        assert_eq!(find_cell(&layer, &provider, start, &plain, is_seven), None);
        let wrapping = SearchOptions {
            wrap: true,
            ..plain
        };
        assert_eq!(
            find_cell(&layer, &provider, start, &wrapping, is_seven),
            Some(PositionCoordinate::new(3, 0))
        );
    }

    #[test]
    fn full_stack_keeps_selection_on_its_cells() {
        let data = DataLayer::new(6, 20, 10, 10);
        let body = HideShowLayer::new(ReorderLayer::new(data, Axis::Column), Axis::Column);
        let mut grid = ViewportLayer::new(SelectionLayer::new(body), 40, 50);

        // The viewport shows columns 0..4; select what is on screen at column 3.
        grid.do_command(&Command::SelectAxis {
            axis: Axis::Column,
            position: 3,
            modifiers: Modifiers::empty(),
        })
        .unwrap();
        grid.do_command(&Command::Reorder {
            axis: Axis::Column,
            from: vec![3],
            to: 0,
        })
        .unwrap();
        let selection = grid.inner();
        assert!(selection.is_fully_selected(Axis::Column, 0));
        assert_eq!(grid.column_index_by_position(0), Some(Index::Backed(3)));

        grid.do_command(&Command::Hide {
            axis: Axis::Column,
            positions: vec![1],
        })
        .unwrap();
        assert!(grid.inner().is_fully_selected(Axis::Column, 0));
        assert_eq!(grid.column_index_by_position(1), Some(Index::Backed(1)));

        grid.do_command(&Command::Data {
            axis: Axis::Row,
            change: DataChange::Delete {
                indexes: vec![0, 1],
            },
        })
        .unwrap();
        assert_eq!(grid.inner().selected_positions().len(), 18);
        assert_eq!(grid.row_count(), 5);
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn mutations_emit_tracing_events() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        struct Count(Arc<AtomicUsize>);

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Count {
            fn on_event(
                &self,
                _event: &tracing::Event<'_>,
                _ctx: tracing_subscriber::layer::Context<'_, S>,
            ) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let events = Arc::new(AtomicUsize::new(0));
        let _guard = tracing_subscriber::registry()
            .with(Count(Arc::clone(&events)))
            .set_default();
        let mut layer = transformed(DataLayer::new(4, 1, 10, 10), &[], &[]);
        layer.inner_mut().reorder(3, 0);
        layer.hide_positions(&[0]).unwrap();
        assert!(events.load(Ordering::Relaxed) >= 2);
    }

    /// Wraps `data` and applies `moves` reorders and `hidden` positions.
    fn transformed(data: DataLayer, moves: &[(usize, usize)], hidden: &[usize]) -> Body {
        let columns = data.element_count(Axis::Column);
        let mut layer = HideShowLayer::new(ReorderLayer::new(data, Axis::Column), Axis::Column);
        for &(from, to) in moves {
            layer
                .do_command(&Command::Reorder {
                    axis: Axis::Column,
                    from: vec![from % columns],
                    to: to % (columns + 1),
                })
                .unwrap();
        }
        layer.hide_positions(hidden).unwrap();
        layer
    }

    proptest! {
        #[test]
        fn positions_and_indexes_are_inverse(
            columns in 1_usize..24,
            moves in proptest::collection::vec((0_usize..24, 0_usize..25), 0..8),
            hidden in proptest::collection::vec(0_usize..24, 0..8),
        ) {
            let layer = transformed(DataLayer::new(columns, 1, 10, 10), &moves, &hidden);
            for position in 0..layer.column_count() {
                let index = layer.column_index_by_position(position);
                prop_assert!(index.is_some());
                prop_assert_eq!(layer.column_position_by_index(index.unwrap()), Some(position));
            }
            for index in 0..columns {
                if let Some(position) = layer.column_position_by_index(index) {
                    prop_assert_eq!(
                        layer.column_index_by_position(position),
                        Some(Index::Backed(index))
                    );
                }
            }
        }

        #[test]
        fn start_pixels_tile_the_axis(
            widths in proptest::collection::vec(1_u32..60, 1..24),
            moves in proptest::collection::vec((0_usize..24, 0_usize..25), 0..6),
            hidden in proptest::collection::vec(0_usize..24, 0..6),
        ) {
            let mut data = DataLayer::new(widths.len(), 1, 10, 10);
            for (position, width) in widths.iter().enumerate() {
                data.size_config_mut(Axis::Column).set_size(position, *width);
            }
            let mut layer = transformed(data, &moves, &hidden);

            let mut expected = 0;
            for position in 0..layer.column_count() {
                prop_assert_eq!(layer.start_x_of_column_position(position), Some(expected));
                expected += i64::from(layer.column_width_by_position(position).unwrap());
            }
            prop_assert_eq!(layer.width(), expected);
            for pixel in 0..expected {
                let position = layer.column_position_by_x(pixel).unwrap();
                let start = layer.start_x_of_column_position(position).unwrap();
                let width = i64::from(layer.column_width_by_position(position).unwrap());
                prop_assert!(start <= pixel && pixel < start + width);
            }
            prop_assert_eq!(layer.column_position_by_x(expected), None);
        }

        #[test]
        fn hide_then_show_restores_position(
            columns in 1_usize..24,
            moves in proptest::collection::vec((0_usize..24, 0_usize..25), 0..6),
            hidden in proptest::collection::vec(0_usize..24, 0..6),
            pick in 0_usize..24,
        ) {
            let mut layer = transformed(DataLayer::new(columns, 1, 10, 10), &moves, &hidden);
            let visible: Vec<Index> = (0..layer.column_count())
                .filter_map(|p| layer.column_index_by_position(p))
                .collect();
            prop_assume!(!visible.is_empty());
            let index = visible[pick % visible.len()];
            let position = layer.column_position_by_index(index).unwrap();
            let count = layer.column_count();

            layer.hide_positions(&[position]).unwrap();
            prop_assert_eq!(layer.column_position_by_index(index), None);
            layer.show_indexes(&[index]).unwrap();
            prop_assert_eq!(layer.column_position_by_index(index), Some(position));
            prop_assert_eq!(layer.column_count(), count);
        }

        #[test]
        fn deletes_shift_selection_down(
            rows in 1_usize..30,
            selected in proptest::collection::btree_set(0_usize..30, 0..10),
            start in 0_usize..30,
            width in 1_usize..6,
        ) {
            let start = start % rows;
            let end = (start + width).min(rows);
            let width = end - start;
            let mut layer = SelectionLayer::new(DataLayer::new(1, rows, 10, 10));
            for row in selected.iter().filter(|row| **row < rows) {
                layer.select(PositionCoordinate::new(0, *row), false, true);
            }
            let before = layer.selected_positions();
            layer
                .do_command(&Command::Data {
                    axis: Axis::Row,
                    change: DataChange::Delete { indexes: (start..end).collect() },
                })
                .unwrap();
            let after = layer.selected_positions();

            let expected: Vec<PositionCoordinate> = before
                .iter()
                .filter(|cell| cell.row < start || cell.row >= end)
                .map(|cell| {
                    if cell.row >= end {
                        PositionCoordinate::new(0, cell.row - width)
                    } else {
                        *cell
                    }
                })
                .collect();
            prop_assert_eq!(after, expected);
        }
    }
}
