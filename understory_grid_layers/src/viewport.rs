// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scrollable window over a large position space.

use crate::{
    Axes, Axis, AxisChange, Command, CommandOutcome, Direction, GridError, Layer, LayerEvent,
    PositionMove, Range, StructuralChange, StructuralEvent, VisualEvent, forward_command,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Window {
    /// Left or top edge in underlying pixels.
    origin: i64,
    client: u32,
    first: usize,
    count: usize,
    /// Underlying start pixel of `first`.
    first_start: i64,
}

impl Window {
    fn range(&self) -> Range {
        Range::new(self.first, self.first + self.count)
    }
}

/// Exposes the positions that intersect a client area of fixed pixel size.
///
/// Each axis keeps a pixel origin in the underlying layer's pixel space. Local
/// position `0` is the first underlying position intersecting the client area and
/// the last partially visible position is included. Start pixels are relative to
/// the origin, so the first position may start at a negative pixel.
///
/// The origin is clamped to `[0, total - client]`, or `0` when the content is
/// smaller than the client area. When structure changes below, the window keeps
/// the element it started with; if that element is gone, the window anchors on the
/// nearest surviving element before it.
#[derive(Debug)]
pub struct ViewportLayer<L> {
    underlying: L,
    windows: [Window; 2],
}

impl<L: Layer> ViewportLayer<L> {
    /// Wraps `underlying` with a client area of `width x height` pixels.
    pub fn new(underlying: L, width: u32, height: u32) -> Self {
        let mut viewport = Self {
            underlying,
            windows: [Window::default(); 2],
        };
        viewport.windows[Axis::Column.slot()].client = width;
        viewport.windows[Axis::Row.slot()].client = height;
        viewport.recompute(Axis::Column);
        viewport.recompute(Axis::Row);
        viewport
    }

    /// The wrapped layer.
    pub fn inner(&self) -> &L {
        &self.underlying
    }

    /// Mutable access to the wrapped layer.
    ///
    /// Events returned by direct mutations of the wrapped layer must be passed to
    /// [`Layer::handle_underlying_event`] to keep the window consistent.
    pub fn inner_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    /// Pixel origin along `axis` in underlying pixel space.
    pub fn origin(&self, axis: Axis) -> i64 {
        self.windows[axis.slot()].origin
    }

    /// Client area extent along `axis`.
    pub fn client_extent(&self, axis: Axis) -> u32 {
        self.windows[axis.slot()].client
    }

    /// Underlying positions in the window along `axis`.
    pub fn visible_range(&self, axis: Axis) -> Range {
        self.windows[axis.slot()].range()
    }

    /// Underlying position shown at local position `0`, or `None` if the window is
    /// empty.
    pub fn first_position(&self, axis: Axis) -> Option<usize> {
        let window = &self.windows[axis.slot()];
        (window.count > 0).then_some(window.first)
    }

    /// Moves the origin along `axis`, clamped to the scrollable range.
    pub fn set_origin(&mut self, axis: Axis, pixel: i64) -> Option<LayerEvent> {
        let slot = axis.slot();
        let before = self.windows[slot];
        self.windows[slot].origin = pixel;
        self.recompute(axis);
        let after = self.windows[slot];
        if after == before {
            return None;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            axis = axis.name(),
            origin = after.origin,
            first = after.first,
            count = after.count,
            "scrolled"
        );
        Some(LayerEvent::Visual(VisualEvent::Scrolled(Axes::from(axis))))
    }

    /// Moves the origin by `delta` pixels.
    pub fn scroll_by(&mut self, axis: Axis, delta: i64) -> Option<LayerEvent> {
        let origin = self.origin(axis).saturating_add(delta);
        self.set_origin(axis, origin)
    }

    /// Moves the origin by one client area.
    pub fn scroll_page(&mut self, axis: Axis, direction: Direction) -> Option<LayerEvent> {
        let page = i64::from(self.client_extent(axis));
        match direction {
            Direction::Backward => self.scroll_by(axis, -page),
            Direction::Forward => self.scroll_by(axis, page),
        }
    }

    /// Scrolls the least distance that makes underlying `position` fully visible.
    ///
    /// An element larger than the client area is aligned to its start.
    pub fn show_position(&mut self, axis: Axis, position: usize) -> Option<LayerEvent> {
        let start = self.underlying.start_pixel_of_position(axis, position)?;
        let extent = i64::from(self.underlying.extent_of_position(axis, position)?);
        let window = self.windows[axis.slot()];
        let client = i64::from(window.client);
        if start < window.origin || extent >= client {
            self.set_origin(axis, start)
        } else if start + extent > window.origin + client {
            self.set_origin(axis, start + extent - client)
        } else {
            None
        }
    }

    /// Changes the client area.
    ///
    /// Axes whose window changed are refreshed.
    pub fn set_client_area(&mut self, width: u32, height: u32) -> Option<LayerEvent> {
        let mut event = StructuralEvent::default();
        for (axis, client) in [(Axis::Column, width), (Axis::Row, height)] {
            let slot = axis.slot();
            let before = self.windows[slot];
            self.windows[slot].client = client;
            self.recompute(axis);
            if self.windows[slot] != before {
                event.set(axis, Some(AxisChange::Refresh));
            }
        }
        event.into_layer_event()
    }

    fn recompute(&mut self, axis: Axis) {
        let Self {
            underlying,
            windows,
        } = self;
        let window = &mut windows[axis.slot()];
        let total = underlying.total_extent(axis);
        let client = i64::from(window.client);
        window.origin = window.origin.clamp(0, (total - client).max(0));
        let end = (window.origin + client).min(total);
        let first = if end > window.origin {
            underlying.position_at_pixel(axis, window.origin)
        } else {
            None
        };
        match first {
            Some(first) => {
                let last = underlying
                    .position_at_pixel(axis, end - 1)
                    .unwrap_or(first);
                window.first = first;
                window.count = last + 1 - first;
                window.first_start = underlying
                    .start_pixel_of_position(axis, first)
                    .unwrap_or(0);
            }
            None => {
                window.first = 0;
                window.count = 0;
                window.first_start = 0;
            }
        }
    }

    fn reconcile_diffs(&mut self, axis: Axis, change: &StructuralChange) -> Option<AxisChange> {
        let slot = axis.slot();
        let old = self.windows[slot];
        let kept = if old.count > 0 {
            change.map_old(old.first)
        } else {
            None
        };
        let offset = if kept.is_some() {
            old.origin - old.first_start
        } else {
            0
        };
        let first = kept
            .or_else(|| change.nearest_surviving_before(old.first))
            .unwrap_or(0);
        let start = self
            .underlying
            .start_pixel_of_position(axis, first)
            .unwrap_or(0);
        self.windows[slot].origin = start + offset;
        self.recompute(axis);
        let new = self.windows[slot];

        let (old_range, new_range) = (old.range(), new.range());
        let deleted = old_range
            .iter()
            .filter(|u| change.map_old(*u).is_none_or(|n| !new_range.contains(n)))
            .map(|u| u - old.first);
        let added = new_range
            .iter()
            .filter(|n| change.map_new(*n).is_none_or(|u| !old_range.contains(u)))
            .map(|n| n - new.first);
        let updated = change
            .updated_pairs()
            .filter(|(u, n)| old_range.contains(*u) && new_range.contains(*n))
            .map(|(u, n)| (u - old.first, n - new.first));
        let local = StructuralChange::build(deleted, added, updated);
        (!local.is_empty()).then_some(AxisChange::Diffs(local))
    }

    fn follow_move(&mut self, axis: Axis, moved: &PositionMove) -> Option<AxisChange> {
        let slot = axis.slot();
        let old = self.windows[slot];
        self.recompute(axis);
        let new = self.windows[slot];
        let window = new.range();
        let range = moved.range();
        if old.range() != window {
            return Some(AxisChange::Refresh);
        }
        if window.intersection(&range).is_none() {
            return None;
        }
        if !window.contains_range(&range) {
            return Some(AxisChange::Refresh);
        }
        let targets = moved.iter().map(|(_, target)| target - new.first).collect();
        let local = PositionMove::new(
            Range::new(range.start - new.first, range.end - new.first),
            targets,
        )?;
        Some(AxisChange::Moved(local))
    }
}

impl<L: Layer> Layer for ViewportLayer<L> {
    fn underlying(&self) -> Option<&dyn Layer> {
        Some(&self.underlying)
    }

    fn underlying_mut(&mut self) -> Option<&mut dyn Layer> {
        Some(&mut self.underlying)
    }

    fn element_count(&self, axis: Axis) -> usize {
        self.windows[axis.slot()].count
    }

    fn underlying_position(&self, axis: Axis, position: usize) -> Option<usize> {
        let window = &self.windows[axis.slot()];
        (position < window.count).then(|| window.first + position)
    }

    fn local_position(&self, axis: Axis, underlying: usize) -> Option<usize> {
        let window = &self.windows[axis.slot()];
        window
            .range()
            .contains(underlying)
            .then(|| underlying - window.first)
    }

    fn extent_of_position(&mut self, axis: Axis, position: usize) -> Option<u32> {
        let underlying = self.underlying_position(axis, position)?;
        self.underlying.extent_of_position(axis, underlying)
    }

    fn start_pixel_of_position(&mut self, axis: Axis, position: usize) -> Option<i64> {
        let underlying = self.underlying_position(axis, position)?;
        let start = self.underlying.start_pixel_of_position(axis, underlying)?;
        Some(start - self.windows[axis.slot()].origin)
    }

    fn total_extent(&mut self, axis: Axis) -> i64 {
        let window = self.windows[axis.slot()];
        (self.underlying.total_extent(axis) - window.origin).clamp(0, i64::from(window.client))
    }

    fn position_at_pixel(&mut self, axis: Axis, pixel: i64) -> Option<usize> {
        if pixel < 0 || pixel >= self.total_extent(axis) {
            return None;
        }
        let origin = self.windows[axis.slot()].origin;
        let underlying = self.underlying.position_at_pixel(axis, pixel + origin)?;
        self.local_position(axis, underlying)
    }

    fn do_command(&mut self, command: &Command) -> Result<CommandOutcome, GridError> {
        let event = match command {
            Command::SetOrigin { axis, pixel } => self.set_origin(*axis, *pixel),
            Command::ScrollBy { axis, delta } => self.scroll_by(*axis, *delta),
            Command::ScrollPage { axis, direction } => self.scroll_page(*axis, *direction),
            Command::ShowPosition { axis, position } => self.show_position(*axis, *position),
            Command::ClientAreaResized { width, height } => {
                let below = forward_command(self, command)?.event;
                let local = self.set_client_area(*width, *height);
                LayerEvent::merge_opt(below, local)
            }
            _ => return forward_command(self, command),
        };
        Ok(CommandOutcome::handled(event))
    }

    fn handle_underlying_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        let mut structural = match event {
            LayerEvent::Structural(structural) => structural,
            visual @ LayerEvent::Visual(_) => return Some(visual),
        };
        for axis in Axis::ALL {
            let local = match structural.take(axis) {
                None => continue,
                Some(AxisChange::Diffs(change)) => self.reconcile_diffs(axis, &change),
                Some(AxisChange::Moved(moved)) => self.follow_move(axis, &moved),
                Some(AxisChange::Refresh) => {
                    self.recompute(axis);
                    Some(AxisChange::Refresh)
                }
            };
            structural.set(axis, local);
        }
        structural.into_layer_event()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::ViewportLayer;
    use crate::{
        Axes, Axis, AxisChange, Command, DataChange, DataLayer, Direction, Index, Layer,
        LayerEvent, LayerExt, PositionMove, Range, ReorderLayer, StructuralChange, VisualEvent,
    };

    fn columns() -> ViewportLayer<DataLayer> {
        let mut data = DataLayer::new(5, 1, 100, 10);
        for (position, width) in [(0, 150), (2, 35), (4, 80)] {
            data.size_config_mut(Axis::Column).set_size(position, width);
        }
        ViewportLayer::new(data, 200, 10)
    }

    fn rows(count: usize, height: u32) -> ViewportLayer<DataLayer> {
        ViewportLayer::new(DataLayer::new(1, count, 10, 10), 10, height)
    }

    #[test]
    fn scrolling_left_by_one_pixel_reveals_previous_column() {
        let mut layer = columns();
        let start = layer.inner_mut().start_x_of_column_position(2).unwrap();
        assert_eq!(start, 250);
        let event = layer.set_origin(Axis::Column, start);
        assert_eq!(
            event,
            Some(LayerEvent::Visual(VisualEvent::Scrolled(Axes::COLUMNS)))
        );
        assert_eq!(layer.first_position(Axis::Column), Some(2));
        layer.scroll_by(Axis::Column, -1);
        assert_eq!(layer.first_position(Axis::Column), Some(1));
        assert_eq!(layer.start_x_of_column_position(0), Some(-99));
    }

    #[test]
    fn origin_is_clamped() {
        let mut layer = columns();
        layer.set_origin(Axis::Column, 1_000);
        assert_eq!(layer.origin(Axis::Column), 265);
        assert_eq!(layer.visible_range(Axis::Column), Range::new(2, 5));
        assert_eq!(layer.set_origin(Axis::Column, 5_000), None);
        layer.set_origin(Axis::Column, -5);
        assert_eq!(layer.origin(Axis::Column), 0);

        let mut small = ViewportLayer::new(DataLayer::new(3, 1, 10, 10), 1_000, 10);
        assert_eq!(small.set_origin(Axis::Column, 20), None);
        assert_eq!(small.column_count(), 3);
        assert_eq!(small.width(), 30);
    }

    #[test]
    fn local_positions_start_at_the_window() {
        let mut layer = columns();
        layer.set_origin(Axis::Column, 250);
        assert_eq!(layer.column_count(), 3);
        assert_eq!(layer.column_index_by_position(0), Some(Index::Backed(2)));
        assert_eq!(layer.column_position_by_index(1), None);
        assert_eq!(layer.start_x_of_column_position(1), Some(35));
        assert_eq!(layer.column_width_by_position(2), Some(80));
        assert_eq!(layer.width(), 200);
        assert_eq!(layer.column_position_by_x(199), Some(2));
        assert_eq!(layer.column_position_by_x(200), None);
        assert_eq!(layer.column_position_by_x(-1), None);

        layer.set_origin(Axis::Column, 100);
        assert_eq!(layer.visible_range(Axis::Column), Range::new(0, 4));
        assert_eq!(layer.start_x_of_column_position(0), Some(-100));
        assert_eq!(layer.column_position_by_x(0), Some(0));
        assert_eq!(layer.column_position_by_x(60), Some(1));
    }

    #[test]
    fn show_position_scrolls_minimally() {
        let mut layer = columns();
        layer.show_position(Axis::Column, 3);
        assert_eq!(layer.origin(Axis::Column), 185);
        assert_eq!(layer.first_position(Axis::Column), Some(1));
        assert_eq!(layer.show_position(Axis::Column, 2), None);
        layer.show_position(Axis::Column, 0);
        assert_eq!(layer.origin(Axis::Column), 0);
        assert_eq!(layer.show_position(Axis::Column, 9), None);
    }

    #[test]
    fn pages_move_by_the_client_area() {
        let mut layer = rows(100, 50);
        layer.scroll_page(Axis::Row, Direction::Forward);
        assert_eq!(layer.origin(Axis::Row), 50);
        assert_eq!(layer.first_position(Axis::Row), Some(5));
        layer.scroll_page(Axis::Row, Direction::Backward);
        layer.scroll_page(Axis::Row, Direction::Backward);
        assert_eq!(layer.origin(Axis::Row), 0);
    }

    #[test]
    fn window_keeps_its_element_when_rows_are_deleted_above() {
        let mut layer = rows(100, 50);
        layer.set_origin(Axis::Row, 205);
        assert_eq!(layer.visible_range(Axis::Row), Range::new(20, 26));
        let outcome = layer
            .do_command(&Command::Data {
                axis: Axis::Row,
                change: DataChange::Delete {
                    indexes: vec![0, 1, 2, 3, 4],
                },
            })
            .unwrap();
        assert!(outcome.handled);
        assert_eq!(outcome.event, None);
        assert_eq!(layer.first_position(Axis::Row), Some(15));
        assert_eq!(layer.start_y_of_row_position(0), Some(-5));
    }

    #[test]
    fn window_falls_back_when_its_first_row_is_deleted() {
        let mut layer = rows(100, 50);
        layer.set_origin(Axis::Row, 205);
        let outcome = layer
            .do_command(&Command::Data {
                axis: Axis::Row,
                change: DataChange::Delete { indexes: vec![20] },
            })
            .unwrap();
        assert!(outcome.event.is_some());
        assert_eq!(layer.first_position(Axis::Row), Some(19));
        assert_eq!(layer.start_y_of_row_position(0), Some(0));

        // Deleting everything leaves an empty window, and new rows show up again.
        layer
            .do_command(&Command::Data {
                axis: Axis::Row,
                change: DataChange::Delete {
                    indexes: (0..99).collect(),
                },
            })
            .unwrap();
        assert_eq!(layer.row_count(), 0);
        assert_eq!(layer.first_position(Axis::Row), None);
        layer
            .do_command(&Command::Data {
                axis: Axis::Row,
                change: DataChange::Insert { at: 0, count: 3 },
            })
            .unwrap();
        assert_eq!(layer.row_count(), 3);
    }

    #[test]
    fn inserts_inside_the_window_are_translated() {
        let mut layer = rows(10, 50);
        let outcome = layer
            .do_command(&Command::Data {
                axis: Axis::Row,
                change: DataChange::Insert { at: 2, count: 1 },
            })
            .unwrap();
        assert_eq!(
            outcome.event,
            Some(LayerEvent::structural(
                Axis::Row,
                AxisChange::Diffs(StructuralChange::build([4], [2], []))
            ))
        );
        assert_eq!(layer.row_index_by_position(2), Some(Index::Backed(2)));
        assert_eq!(layer.row_count(), 5);
    }

    #[test]
    fn moves_inside_the_window_pass_through() {
        let data = DataLayer::new(10, 1, 10, 10);
        let mut layer = ViewportLayer::new(ReorderLayer::new(data, Axis::Column), 50, 10);
        let outcome = layer
            .do_command(&Command::Reorder {
                axis: Axis::Column,
                from: vec![1],
                to: 3,
            })
            .unwrap();
        let expected = PositionMove::new(Range::new(1, 3), vec![2, 1]).unwrap();
        assert_eq!(
            outcome.event,
            Some(LayerEvent::structural(Axis::Column, AxisChange::Moved(expected)))
        );

        // A move reaching past the window refreshes it.
        let event = layer.inner_mut().reorder(0, 8).unwrap();
        assert_eq!(
            layer.handle_underlying_event(event),
            Some(LayerEvent::structural(Axis::Column, AxisChange::Refresh))
        );
        assert_eq!(layer.column_index_by_position(4), Some(Index::Backed(5)));
    }

    #[test]
    fn client_area_changes_refresh_the_window() {
        let mut layer = rows(100, 50);
        let outcome = layer
            .do_command(&Command::ClientAreaResized {
                width: 10,
                height: 100,
            })
            .unwrap();
        assert!(outcome.handled);
        assert_eq!(
            outcome.event,
            Some(LayerEvent::structural(Axis::Row, AxisChange::Refresh))
        );
        assert_eq!(layer.row_count(), 10);
        assert_eq!(layer.client_extent(Axis::Row), 100);
        assert_eq!(layer.set_client_area(10, 100), None);
        assert_eq!(layer.element_count(Axis::Column), 1);
    }
}
