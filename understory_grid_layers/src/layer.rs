// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer contract.

use core::fmt;

use kurbo::Rect;

use crate::layer_util::{self, Cell};
use crate::{
    Axis, CellRegion, Command, CommandOutcome, GridError, Index, LayerEvent, Properties,
};

/// One stage of a grid's transformation stack.
///
/// A layer exposes a column axis and a row axis. Along each axis it maps its own
/// *positions* onto the positions of the layer it wraps (its *underlying* layer) and
/// reports a pixel extent for each position. The bottom layer has no underlying
/// layer; its positions are backing indexes.
///
/// Every query answers `None` for positions outside the layer, so composed lookups
/// chain with `?`. Pixel queries take `&mut self` so layers can keep prefix-sum
/// caches without interior mutability.
///
/// Layers that do not transform an axis pass positions through unchanged. Only the
/// required methods know a layer's own mapping; everything else has a default that
/// walks the stack through them.
pub trait Layer: fmt::Debug {
    /// The wrapped layer, or `None` at the bottom of the stack.
    fn underlying(&self) -> Option<&dyn Layer>;

    /// Mutable access to the wrapped layer.
    fn underlying_mut(&mut self) -> Option<&mut dyn Layer>;

    /// Number of positions along `axis`.
    fn element_count(&self, axis: Axis) -> usize;

    /// The underlying position that local `position` shows.
    fn underlying_position(&self, axis: Axis, position: usize) -> Option<usize>;

    /// The local position showing underlying position `underlying`, if it is shown.
    fn local_position(&self, axis: Axis, underlying: usize) -> Option<usize>;

    /// Pixel extent of `position`.
    fn extent_of_position(&mut self, axis: Axis, position: usize) -> Option<u32>;

    /// Start pixel of `position` in this layer's pixel space.
    fn start_pixel_of_position(&mut self, axis: Axis, position: usize) -> Option<i64>;

    /// Pixel extent of the whole axis.
    fn total_extent(&mut self, axis: Axis) -> i64;

    /// Position containing `pixel`, or `None` outside `[0, total_extent)`.
    fn position_at_pixel(&mut self, axis: Axis, pixel: i64) -> Option<usize> {
        layer_util::position_at_pixel(self, axis, pixel)
    }

    /// Identity of the element at `position`.
    fn index_of_position(&self, axis: Axis, position: usize) -> Option<Index> {
        let underlying = self.underlying_position(axis, position)?;
        match self.underlying() {
            Some(layer) => layer.index_of_position(axis, underlying),
            None => Some(Index::Backed(underlying)),
        }
    }

    /// Position of the element with identity `index`, or `None` if this layer does
    /// not show it.
    fn position_of_index(&self, axis: Axis, index: Index) -> Option<usize> {
        let underlying = match self.underlying() {
            Some(layer) => layer.position_of_index(axis, index)?,
            None => index.backed()?,
        };
        self.local_position(axis, underlying)
    }

    /// The spanning block containing the cell with these identities, as a region of
    /// backing indexes, or `None` if the cell does not span.
    fn span_of_index(&self, column: Index, row: Index) -> Option<CellRegion> {
        self.underlying()?.span_of_index(column, row)
    }

    /// Offers a command to this layer.
    ///
    /// The default forwards it to the underlying layer.
    fn do_command(&mut self, command: &Command) -> Result<CommandOutcome, GridError> {
        forward_command(self, command)
    }

    /// Translates an event from the underlying layer into this layer's space,
    /// updating local state on the way.
    ///
    /// Returns `None` if the change is invisible from this layer. The default passes
    /// the event through, which is right for layers whose positions equal the
    /// underlying positions.
    fn handle_underlying_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        Some(event)
    }

    /// Writes this layer's state, and that of every layer below, under `prefix`.
    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        if let Some(layer) = self.underlying() {
            layer.save_state(prefix, properties);
        }
    }

    /// Restores state written by [`Layer::save_state`], bottom layer first.
    ///
    /// Returns the resulting event in this layer's space.
    fn load_state(
        &mut self,
        prefix: &str,
        properties: &Properties,
    ) -> Result<Option<LayerEvent>, GridError> {
        let event = match self.underlying_mut() {
            Some(layer) => layer.load_state(prefix, properties)?,
            None => None,
        };
        Ok(event.and_then(|event| self.handle_underlying_event(event)))
    }
}

/// Converts `command` into `layer`'s underlying space, runs it there, and
/// translates the resulting event back up.
///
/// Layers call this from [`Layer::do_command`] for commands they do not handle.
pub fn forward_command<L: Layer + ?Sized>(
    layer: &mut L,
    command: &Command,
) -> Result<CommandOutcome, GridError> {
    let Some(converted) = command.to_underlying(&*layer) else {
        return Ok(CommandOutcome::unhandled());
    };
    let Some(underlying) = layer.underlying_mut() else {
        return Ok(CommandOutcome::unhandled());
    };
    let outcome = underlying.do_command(&converted)?;
    let event = outcome
        .event
        .and_then(|event| layer.handle_underlying_event(event));
    Ok(CommandOutcome {
        handled: outcome.handled,
        event,
    })
}

/// Column/row named conveniences over [`Layer`].
///
/// These cover the query surface rendering and export collaborators consume.
pub trait LayerExt: Layer {
    /// Number of columns.
    fn column_count(&self) -> usize {
        self.element_count(Axis::Column)
    }

    /// Number of rows.
    fn row_count(&self) -> usize {
        self.element_count(Axis::Row)
    }

    /// Total width in pixels.
    fn width(&mut self) -> i64 {
        self.total_extent(Axis::Column)
    }

    /// Total height in pixels.
    fn height(&mut self) -> i64 {
        self.total_extent(Axis::Row)
    }

    /// Width of the column at `position`.
    fn column_width_by_position(&mut self, position: usize) -> Option<u32> {
        self.extent_of_position(Axis::Column, position)
    }

    /// Height of the row at `position`.
    fn row_height_by_position(&mut self, position: usize) -> Option<u32> {
        self.extent_of_position(Axis::Row, position)
    }

    /// Left edge of the column at `position`.
    fn start_x_of_column_position(&mut self, position: usize) -> Option<i64> {
        self.start_pixel_of_position(Axis::Column, position)
    }

    /// Top edge of the row at `position`.
    fn start_y_of_row_position(&mut self, position: usize) -> Option<i64> {
        self.start_pixel_of_position(Axis::Row, position)
    }

    /// Backing column index at `position`.
    fn column_index_by_position(&self, position: usize) -> Option<Index> {
        self.index_of_position(Axis::Column, position)
    }

    /// Backing row index at `position`.
    fn row_index_by_position(&self, position: usize) -> Option<Index> {
        self.index_of_position(Axis::Row, position)
    }

    /// Position of backing column `index`.
    fn column_position_by_index(&self, index: impl Into<Index>) -> Option<usize> {
        self.position_of_index(Axis::Column, index.into())
    }

    /// Position of backing row `index`.
    fn row_position_by_index(&self, index: impl Into<Index>) -> Option<usize> {
        self.position_of_index(Axis::Row, index.into())
    }

    /// Column containing pixel `x`.
    fn column_position_by_x(&mut self, x: i64) -> Option<usize> {
        self.position_at_pixel(Axis::Column, x)
    }

    /// Row containing pixel `y`.
    fn row_position_by_y(&mut self, y: i64) -> Option<usize> {
        self.position_at_pixel(Axis::Row, y)
    }

    /// Spanning-aware descriptor of the cell at a position.
    fn cell_by_position(&self, column: usize, row: usize) -> Option<Cell> {
        layer_util::cell_by_position(self, column, row)
    }

    /// Pixel bounds of a cell in this layer's pixel space.
    fn cell_bounds(&mut self, cell: &Cell) -> Option<Rect> {
        layer_util::cell_bounds(self, cell)
    }
}

impl<L: Layer + ?Sized> LayerExt for L {}
