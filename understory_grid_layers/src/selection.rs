// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection state that follows structural changes.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::{
    Axis, AxisChange, CellRegion, Command, CommandOutcome, GridError, Layer, LayerEvent, Modifiers,
    PositionCoordinate, Range, StructuralEvent, VisualEvent, forward_command,
};

/// Tracks selected cells, an anchor and the last selected cell.
///
/// Positions pass through unchanged, so selection is expressed in the space of
/// the layer directly below. Structural events from below remap the selection so
/// it stays on the same logical cells: cells inside deleted ranges are dropped,
/// cells after an insertion or deletion shift, and moved cells follow their
/// elements. A refresh clears the selection.
///
/// Selection gestures follow the usual modifier rules:
///
/// - no modifiers replace the selection with the region;
/// - `SHIFT` (with or without `CTRL`) extends from the anchor to the region,
///   replacing only the previous extension;
/// - `CTRL` alone toggles the region.
#[derive(Debug)]
pub struct SelectionLayer<L> {
    underlying: L,
    selected: BTreeSet<PositionCoordinate>,
    anchor: Option<PositionCoordinate>,
    last_selected: Option<PositionCoordinate>,
    last_region: Option<CellRegion>,
    /// Cells added by the latest shift extension.
    extended: Vec<PositionCoordinate>,
}

impl<L: Layer> SelectionLayer<L> {
    /// Wraps `underlying` with an empty selection.
    pub fn new(underlying: L) -> Self {
        Self {
            underlying,
            selected: BTreeSet::new(),
            anchor: None,
            last_selected: None,
            last_region: None,
            extended: Vec::new(),
        }
    }

    /// The wrapped layer.
    pub fn inner(&self) -> &L {
        &self.underlying
    }

    /// Mutable access to the wrapped layer.
    pub fn inner_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    /// Applies a region gesture.
    ///
    /// The region is clipped to the layer. `anchor` overrides the anchor a plain or
    /// control gesture would set; shift gestures keep the current anchor.
    pub fn select_region(
        &mut self,
        region: CellRegion,
        modifiers: Modifiers,
        anchor: Option<PositionCoordinate>,
    ) -> Option<LayerEvent> {
        let region = region.clip(
            self.underlying.element_count(Axis::Column),
            self.underlying.element_count(Axis::Row),
        );
        let far = region.far_corner()?;
        let origin = region.origin();
        let previous_anchor = self.anchor;

        let changed = if modifiers.contains(Modifiers::SHIFT) {
            let anchor = self.anchor.unwrap_or(origin);
            let previous = core::mem::take(&mut self.extended);
            for cell in &previous {
                self.selected.remove(cell);
            }
            let covering = CellRegion::spanning(
                PositionCoordinate::new(
                    anchor.column.min(origin.column),
                    anchor.row.min(origin.row),
                ),
                PositionCoordinate::new(anchor.column.max(far.column), anchor.row.max(far.row)),
            );
            for cell in covering.cells() {
                if self.selected.insert(cell) {
                    self.extended.push(cell);
                }
            }
            self.anchor = Some(anchor);
            previous != self.extended
        } else if modifiers.contains(Modifiers::CTRL) {
            self.extended.clear();
            if region.cells().all(|cell| self.selected.contains(&cell)) {
                for cell in region.cells() {
                    self.selected.remove(&cell);
                }
                self.anchor = self.replacement_anchor(origin);
            } else {
                self.selected.extend(region.cells());
                self.anchor = Some(anchor.unwrap_or(origin));
            }
            true
        } else {
            self.extended.clear();
            let before = core::mem::take(&mut self.selected);
            self.selected.extend(region.cells());
            self.anchor = Some(anchor.unwrap_or(origin));
            before != self.selected
        };

        self.last_selected = Some(origin);
        self.last_region = Some(region);
        self.selection_changed(changed || previous_anchor != self.anchor)
    }

    /// Selects one cell; `extend` acts as shift and `add` as control.
    pub fn select(
        &mut self,
        coordinate: PositionCoordinate,
        extend: bool,
        add: bool,
    ) -> Option<LayerEvent> {
        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::SHIFT, extend);
        modifiers.set(Modifiers::CTRL, add);
        self.select_cell(coordinate, modifiers)
    }

    /// Selects one cell with explicit modifiers.
    pub fn select_cell(
        &mut self,
        coordinate: PositionCoordinate,
        modifiers: Modifiers,
    ) -> Option<LayerEvent> {
        self.select_region(CellRegion::cell(coordinate), modifiers, None)
    }

    /// Selects the whole column or row at `position`.
    ///
    /// With `SHIFT` every band between the anchor and `position` is selected.
    pub fn select_axis(
        &mut self,
        axis: Axis,
        position: usize,
        modifiers: Modifiers,
    ) -> Option<LayerEvent> {
        let across = self.underlying.element_count(axis.other());
        let band = CellRegion::from_ranges(
            axis,
            Range::new(position, position + 1),
            Range::new(0, across),
        );
        self.select_region(band, modifiers, None)
    }

    /// Selects every cell, keeping the anchor if there is one.
    pub fn select_all(&mut self) -> Option<LayerEvent> {
        let everything = CellRegion::new(
            0,
            0,
            self.underlying.element_count(Axis::Column),
            self.underlying.element_count(Axis::Row),
        );
        let before = self.selected.len();
        self.selected.extend(everything.cells());
        self.extended.clear();
        self.last_region = Some(everything);
        if self.anchor.is_none() && !everything.is_empty() {
            self.anchor = Some(everything.origin());
        }
        self.selection_changed(before != self.selected.len())
    }

    /// Clears the selection, the anchor and the last selected cell.
    pub fn clear(&mut self) -> Option<LayerEvent> {
        let changed = !self.selected.is_empty() || self.anchor.is_some();
        self.selected.clear();
        self.extended.clear();
        self.anchor = None;
        self.last_selected = None;
        self.last_region = None;
        self.selection_changed(changed)
    }

    /// Moves the anchor without touching the selection.
    pub fn move_anchor(&mut self, coordinate: PositionCoordinate) -> Option<LayerEvent> {
        let inside = coordinate.column < self.underlying.element_count(Axis::Column)
            && coordinate.row < self.underlying.element_count(Axis::Row);
        if !inside || self.anchor == Some(coordinate) {
            return None;
        }
        self.anchor = Some(coordinate);
        self.extended.clear();
        self.selection_changed(true)
    }

    /// Returns `true` if the cell is selected.
    pub fn is_selected(&self, coordinate: PositionCoordinate) -> bool {
        self.selected.contains(&coordinate)
    }

    /// Selected cells, ordered by row and then column.
    pub fn selected_positions(&self) -> Vec<PositionCoordinate> {
        self.selected.iter().copied().collect()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// The anchor of shift gestures.
    pub fn anchor(&self) -> Option<PositionCoordinate> {
        self.anchor
    }

    /// The most recently selected cell.
    pub fn last_selected(&self) -> Option<PositionCoordinate> {
        self.last_selected
    }

    /// The region of the most recent gesture.
    pub fn last_region(&self) -> Option<CellRegion> {
        self.last_region
    }

    /// Returns `true` if every cell of the column or row at `position` is selected.
    pub fn is_fully_selected(&self, axis: Axis, position: usize) -> bool {
        let across = self.underlying.element_count(axis.other());
        across > 0
            && position < self.underlying.element_count(axis)
            && (0..across).all(|other| {
                let cell = PositionCoordinate::new(0, 0)
                    .with(axis, position)
                    .with(axis.other(), other);
                self.selected.contains(&cell)
            })
    }

    /// Positions along `axis` holding at least one selected cell, ascending.
    pub fn selected_axis_positions(&self, axis: Axis) -> Vec<usize> {
        let positions: BTreeSet<usize> = self.selected.iter().map(|cell| cell.get(axis)).collect();
        positions.into_iter().collect()
    }

    /// Positions along `axis` whose every cell is selected, ascending.
    pub fn fully_selected_positions(&self, axis: Axis) -> Vec<usize> {
        self.selected_axis_positions(axis)
            .into_iter()
            .filter(|position| self.is_fully_selected(axis, *position))
            .collect()
    }

    /// Anchor after deselecting a region at `origin`: a remaining cell in the same
    /// column, else in the same row, else the first remaining cell.
    fn replacement_anchor(&self, origin: PositionCoordinate) -> Option<PositionCoordinate> {
        self.selected
            .iter()
            .find(|cell| cell.column == origin.column)
            .or_else(|| self.selected.iter().find(|cell| cell.row == origin.row))
            .or_else(|| self.selected.first())
            .copied()
    }

    fn selection_changed(&self, changed: bool) -> Option<LayerEvent> {
        if !changed {
            return None;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            selected = self.selected.len(),
            anchor = ?self.anchor,
            "selection changed"
        );
        Some(LayerEvent::Visual(VisualEvent::SelectionChanged))
    }

    fn remap(&mut self, map: impl Fn(PositionCoordinate) -> Option<PositionCoordinate>) {
        self.selected = core::mem::take(&mut self.selected)
            .into_iter()
            .filter_map(&map)
            .collect();
        self.extended.retain_mut(|cell| match map(*cell) {
            Some(mapped) => {
                *cell = mapped;
                true
            }
            None => false,
        });
        self.anchor = self.anchor.and_then(&map);
        self.last_selected = self.last_selected.and_then(&map);
        self.last_region = None;
    }

    fn follow(&mut self, structural: &StructuralEvent) {
        for axis in Axis::ALL {
            match structural.get(axis) {
                None => {}
                Some(AxisChange::Diffs(change)) => {
                    if change.changes_count() {
                        self.remap(|cell| Some(cell.with(axis, change.map_old(cell.get(axis))?)));
                    }
                }
                Some(AxisChange::Moved(moved)) => {
                    self.remap(|cell| Some(cell.with(axis, moved.map(cell.get(axis)))));
                }
                Some(AxisChange::Refresh) => {
                    self.selected.clear();
                    self.extended.clear();
                    self.anchor = None;
                    self.last_selected = None;
                    self.last_region = None;
                }
            }
        }
    }
}

impl<L: Layer> Layer for SelectionLayer<L> {
    fn underlying(&self) -> Option<&dyn Layer> {
        Some(&self.underlying)
    }

    fn underlying_mut(&mut self) -> Option<&mut dyn Layer> {
        Some(&mut self.underlying)
    }

    fn element_count(&self, axis: Axis) -> usize {
        self.underlying.element_count(axis)
    }

    fn underlying_position(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.underlying.element_count(axis)).then_some(position)
    }

    fn local_position(&self, axis: Axis, underlying: usize) -> Option<usize> {
        (underlying < self.underlying.element_count(axis)).then_some(underlying)
    }

    fn extent_of_position(&mut self, axis: Axis, position: usize) -> Option<u32> {
        self.underlying.extent_of_position(axis, position)
    }

    fn start_pixel_of_position(&mut self, axis: Axis, position: usize) -> Option<i64> {
        self.underlying.start_pixel_of_position(axis, position)
    }

    fn total_extent(&mut self, axis: Axis) -> i64 {
        self.underlying.total_extent(axis)
    }

    fn position_at_pixel(&mut self, axis: Axis, pixel: i64) -> Option<usize> {
        self.underlying.position_at_pixel(axis, pixel)
    }

    fn do_command(&mut self, command: &Command) -> Result<CommandOutcome, GridError> {
        let event = match command {
            Command::SelectCell {
                coordinate,
                modifiers,
            } => self.select_cell(*coordinate, *modifiers),
            Command::SelectRegion {
                region,
                modifiers,
                anchor,
            } => self.select_region(*region, *modifiers, *anchor),
            Command::SelectAxis {
                axis,
                position,
                modifiers,
            } => self.select_axis(*axis, *position, *modifiers),
            Command::SelectAll => self.select_all(),
            Command::ClearSelection => self.clear(),
            Command::MoveAnchor { coordinate } => self.move_anchor(*coordinate),
            _ => return forward_command(self, command),
        };
        Ok(CommandOutcome::handled(event))
    }

    fn handle_underlying_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        if let LayerEvent::Structural(structural) = &event {
            self.follow(structural);
        }
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::SelectionLayer;
    use crate::{
        Axis, CellRegion, Command, DataChange, DataLayer, HideShowLayer, Layer, LayerEvent,
        Modifiers, PositionCoordinate, ReorderLayer, VisualEvent,
    };

    fn grid(columns: usize, rows: usize) -> SelectionLayer<DataLayer> {
        SelectionLayer::new(DataLayer::new(columns, rows, 10, 10))
    }

    fn at(column: usize, row: usize) -> PositionCoordinate {
        PositionCoordinate::new(column, row)
    }

    #[test]
    fn plain_selection_replaces_and_sets_anchor() {
        let mut layer = grid(4, 4);
        let event = layer.select_region(CellRegion::new(1, 1, 2, 1), Modifiers::empty(), None);
        assert_eq!(event, Some(LayerEvent::Visual(VisualEvent::SelectionChanged)));
        assert_eq!(layer.selected_positions(), [at(1, 1), at(2, 1)]);
        assert_eq!(layer.anchor(), Some(at(1, 1)));

        layer.select(at(3, 3), false, false);
        assert_eq!(layer.selected_positions(), [at(3, 3)]);
        assert_eq!(layer.last_selected(), Some(at(3, 3)));
        // Selecting the same cell again changes nothing.
        assert_eq!(layer.select(at(3, 3), false, false), None);

        layer.select_region(CellRegion::new(0, 0, 2, 2), Modifiers::empty(), Some(at(1, 1)));
        assert_eq!(layer.anchor(), Some(at(1, 1)));
        assert_eq!(
            layer.select_region(CellRegion::new(9, 9, 1, 1), Modifiers::empty(), None),
            None
        );
    }

    #[test]
    fn shift_replaces_only_the_previous_extension() {
        let mut layer = grid(5, 5);
        layer.select(at(0, 0), false, false);
        layer.select(at(4, 0), false, true);
        assert_eq!(layer.anchor(), Some(at(4, 0)));
        layer.select(at(3, 1), true, false);
        assert_eq!(
            layer.selected_positions(),
            [at(0, 0), at(3, 0), at(4, 0), at(3, 1), at(4, 1)]
        );
        assert_eq!(layer.anchor(), Some(at(4, 0)));
        assert_eq!(layer.last_selected(), Some(at(3, 1)));

        // Shrinking the extension keeps the cells selected before it.
        layer.select(at(4, 1), true, false);
        assert_eq!(layer.selected_positions(), [at(0, 0), at(4, 0), at(4, 1)]);
        assert_eq!(layer.select(at(4, 1), true, false), None);
    }

    #[test]
    fn ctrl_toggle_relocates_or_clears_anchor() {
        let mut layer = grid(3, 3);
        layer.select_region(CellRegion::new(0, 0, 1, 1), Modifiers::empty(), None);
        layer.select_region(CellRegion::new(0, 0, 1, 1), Modifiers::CTRL, None);
        assert!(layer.is_empty());
        assert_eq!(layer.anchor(), None);

        layer.select(at(2, 2), false, false);
        layer.select(at(1, 0), false, true);
        layer.select(at(2, 0), false, true);
        assert_eq!(layer.anchor(), Some(at(2, 0)));
        layer.select(at(2, 0), false, true);
        // Same column as the removed cell wins over same row.
        assert_eq!(layer.anchor(), Some(at(2, 2)));
        layer.select(at(2, 2), false, true);
        assert_eq!(layer.anchor(), Some(at(1, 0)));
    }

    #[test]
    fn whole_axis_selection() {
        let mut layer = grid(3, 4);
        layer.select_axis(Axis::Row, 1, Modifiers::empty());
        assert!(layer.is_fully_selected(Axis::Row, 1));
        assert!(!layer.is_fully_selected(Axis::Column, 0));
        layer.select_axis(Axis::Row, 3, Modifiers::SHIFT);
        assert_eq!(layer.fully_selected_positions(Axis::Row), [1, 2, 3]);
        assert_eq!(layer.selected_axis_positions(Axis::Column), [0, 1, 2]);

        layer.select_all();
        assert_eq!(layer.fully_selected_positions(Axis::Column), [0, 1, 2]);
        assert_eq!(layer.anchor(), Some(at(0, 1)));
        layer.clear();
        assert!(layer.is_empty());
        assert_eq!(layer.clear(), None);
    }

    #[test]
    fn selection_follows_deletes_and_inserts() {
        let mut layer = grid(2, 6);
        layer.select_region(CellRegion::new(0, 1, 1, 4), Modifiers::empty(), None);
        let outcome = layer
            .do_command(&Command::Data {
                axis: Axis::Row,
                change: DataChange::Delete {
                    indexes: vec![0, 2],
                },
            })
            .unwrap();
        assert!(outcome.event.is_some());
        assert_eq!(layer.selected_positions(), [at(0, 0), at(0, 1), at(0, 2)]);
        assert_eq!(layer.anchor(), Some(at(0, 0)));

        layer
            .do_command(&Command::Data {
                axis: Axis::Row,
                change: DataChange::Insert { at: 1, count: 2 },
            })
            .unwrap();
        assert_eq!(layer.selected_positions(), [at(0, 0), at(0, 3), at(0, 4)]);
    }

    #[test]
    fn selection_follows_reordered_cells() {
        let data = DataLayer::new(4, 1, 10, 10);
        let mut layer = SelectionLayer::new(ReorderLayer::new(data, Axis::Column));
        layer.select(at(0, 0), false, false);
        layer.select(at(2, 0), false, true);
        layer
            .do_command(&Command::Reorder {
                axis: Axis::Column,
                from: vec![0],
                to: 4,
            })
            .unwrap();
        assert_eq!(layer.selected_positions(), [at(1, 0), at(3, 0)]);
    }

    #[test]
    fn selection_follows_a_reset_order() {
        let data = DataLayer::new(4, 1, 10, 10);
        let mut layer = SelectionLayer::new(ReorderLayer::new(data, Axis::Column));
        layer
            .do_command(&Command::Reorder {
                axis: Axis::Column,
                from: vec![3],
                to: 0,
            })
            .unwrap();
        layer.select(at(0, 0), false, false);
        layer
            .do_command(&Command::ResetReorder { axis: Axis::Column })
            .unwrap();
        assert_eq!(layer.selected_positions(), [at(3, 0)]);
        assert_eq!(layer.anchor(), Some(at(3, 0)));
    }

    #[test]
    fn hiding_a_selected_column_drops_it() {
        let data = DataLayer::new(4, 1, 10, 10);
        let mut layer = SelectionLayer::new(HideShowLayer::new(data, Axis::Column));
        layer.select_all();
        layer
            .do_command(&Command::Hide {
                axis: Axis::Column,
                positions: vec![1],
            })
            .unwrap();
        let columns: Vec<usize> = layer.selected_axis_positions(Axis::Column);
        assert_eq!(columns, [0, 1, 2]);
        assert_eq!(layer.selected_positions().len(), 3);

        let outcome = layer
            .do_command(&Command::ResetReorder { axis: Axis::Column })
            .unwrap();
        assert!(!outcome.handled);
        assert_eq!(layer.selected_positions().len(), 3);
    }

    #[test]
    fn commands_drive_selection() {
        let mut layer = grid(3, 3);
        let outcome = layer
            .do_command(&Command::SelectCell {
                coordinate: at(1, 1),
                modifiers: Modifiers::empty(),
            })
            .unwrap();
        assert!(outcome.handled);
        layer
            .do_command(&Command::MoveAnchor {
                coordinate: at(2, 2),
            })
            .unwrap();
        assert_eq!(layer.anchor(), Some(at(2, 2)));
        assert!(layer.is_selected(at(1, 1)));
        layer.do_command(&Command::ClearSelection).unwrap();
        assert!(layer.is_empty());
    }
}
