// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hiding elements of one axis.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use understory_extent::ExtentCache;

use crate::{
    Axis, AxisChange, Command, CommandOutcome, Direction, GridError, Index, Layer, LayerEvent,
    PositionMove, Properties, Range, StructuralChange, forward_command,
};

struct Filter(Box<dyn Fn(Index) -> bool>);

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filter(..)")
    }
}

/// Local position of underlying `u`, or `None` if it is hidden.
fn visible_rank(hidden: &[usize], u: usize) -> Option<usize> {
    hidden.binary_search(&u).err().map(|before| u - before)
}

/// Number of visible underlying positions before `u`.
fn visible_before(hidden: &[usize], u: usize) -> usize {
    u - hidden.partition_point(|h| *h < u)
}

/// Underlying position of the `p`-th visible element.
fn nth_visible(hidden: &[usize], p: usize) -> usize {
    // `hidden[i] - i` counts the visible elements before `hidden[i]` and never
    // decreases, so the hidden entries before the answer form a prefix.
    let (mut lo, mut hi) = (0, hidden.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if hidden[mid] - mid <= p {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    p + lo
}

/// Removes elements of one axis from position space.
///
/// The hidden set is kept as sorted underlying positions and follows structural
/// changes from below: deleted elements leave the set and survivors shift with
/// their elements. Persisted state uses backing indexes.
///
/// The layer runs in one of two modes. Manually, elements are hidden and shown
/// by position or identity. With a filter installed, visibility is a predicate
/// over element identity; position-relative operations then fail with
/// [`GridError::Unsupported`] until the filter is cleared.
#[derive(Debug)]
pub struct HideShowLayer<L> {
    underlying: L,
    axis: Axis,
    hidden: Vec<usize>,
    /// Identities of the hidden elements, for re-resolving the set after a
    /// refresh from below.
    hidden_ids: Vec<Index>,
    filter: Option<Filter>,
    pixels: ExtentCache,
}

impl<L: Layer> HideShowLayer<L> {
    /// Wraps `underlying` with nothing hidden along `axis`.
    pub fn new(underlying: L, axis: Axis) -> Self {
        Self {
            underlying,
            axis,
            hidden: Vec::new(),
            hidden_ids: Vec::new(),
            filter: None,
            pixels: ExtentCache::new(),
        }
    }

    /// The wrapped layer.
    pub fn inner(&self) -> &L {
        &self.underlying
    }

    /// Mutable access to the wrapped layer.
    ///
    /// Events returned by direct mutations of the wrapped layer must be passed to
    /// [`Layer::handle_underlying_event`] to keep this layer consistent.
    pub fn inner_mut(&mut self) -> &mut L {
        &mut self.underlying
    }

    /// The axis elements are hidden along.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Hidden underlying positions, ascending.
    pub fn hidden_positions(&self) -> &[usize] {
        &self.hidden
    }

    /// Identities of the hidden elements.
    pub fn hidden_indexes(&self) -> Vec<Index> {
        self.hidden
            .iter()
            .filter_map(|u| self.underlying.index_of_position(self.axis, *u))
            .collect()
    }

    /// Returns `true` if a filter drives visibility.
    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    /// Hides the elements at local `positions`.
    ///
    /// The event lists the removed ranges in positions from before the hide.
    pub fn hide_positions(&mut self, positions: &[usize]) -> Result<Option<LayerEvent>, GridError> {
        self.ensure_manual("hide_positions")?;
        let mut next = self.hidden.clone();
        next.extend(positions.iter().filter_map(|p| self.underlying_position(self.axis, *p)));
        Ok(self.replace_hidden(next))
    }

    /// Hides the elements with these identities.
    pub fn hide_indexes(&mut self, indexes: &[Index]) -> Result<Option<LayerEvent>, GridError> {
        self.ensure_manual("hide_indexes")?;
        let mut next = self.hidden.clone();
        next.extend(
            indexes
                .iter()
                .filter_map(|i| self.underlying.position_of_index(self.axis, *i)),
        );
        Ok(self.replace_hidden(next))
    }

    /// Shows the elements with these identities.
    ///
    /// The event lists the revealed ranges in positions from after the show.
    pub fn show_indexes(&mut self, indexes: &[Index]) -> Result<Option<LayerEvent>, GridError> {
        self.ensure_manual("show_indexes")?;
        let shown: Vec<usize> = indexes
            .iter()
            .filter_map(|i| self.underlying.position_of_index(self.axis, *i))
            .collect();
        let next = self
            .hidden
            .iter()
            .copied()
            .filter(|u| !shown.contains(u))
            .collect();
        Ok(self.replace_hidden(next))
    }

    /// Shows every hidden element.
    pub fn show_all(&mut self) -> Result<Option<LayerEvent>, GridError> {
        self.ensure_manual("show_all")?;
        Ok(self.replace_hidden(Vec::new()))
    }

    /// Shows the hidden block directly next to local `position`.
    ///
    /// `Backward` reveals the block between `position - 1` and `position`, and
    /// `position` may equal the count to reveal a trailing block. `Forward` reveals
    /// the block right after `position`. With `show_all` every hidden element is
    /// revealed instead. Nothing happens when no block touches that side.
    pub fn show_adjacent(
        &mut self,
        position: usize,
        direction: Direction,
        show_all: bool,
    ) -> Result<Option<LayerEvent>, GridError> {
        self.ensure_manual("show_adjacent")?;
        if show_all {
            return self.show_all();
        }
        let count = self.element_count(self.axis);
        let block = match direction {
            Direction::Backward => {
                let end = if position < count {
                    nth_visible(&self.hidden, position)
                } else if position == count {
                    self.underlying.element_count(self.axis)
                } else {
                    return Ok(None);
                };
                let mut start = end;
                while start > 0 && self.hidden.binary_search(&(start - 1)).is_ok() {
                    start -= 1;
                }
                Range::new(start, end)
            }
            Direction::Forward => {
                if position >= count {
                    return Ok(None);
                }
                let start = nth_visible(&self.hidden, position) + 1;
                let mut end = start;
                while self.hidden.binary_search(&end).is_ok() {
                    end += 1;
                }
                Range::new(start, end)
            }
        };
        if block.is_empty() {
            return Ok(None);
        }
        let next = self
            .hidden
            .iter()
            .copied()
            .filter(|u| !block.contains(*u))
            .collect();
        Ok(self.replace_hidden(next))
    }

    /// Switches to filter mode: elements whose identity fails `keep` are hidden.
    pub fn set_filter(
        &mut self,
        keep: impl Fn(Index) -> bool + 'static,
    ) -> Result<Option<LayerEvent>, GridError> {
        if self.filter.is_some() {
            return Err(GridError::AlreadySet {
                what: "visibility filter",
                reset: "clear_filter",
            });
        }
        self.filter = Some(Filter(Box::new(keep)));
        Ok(self.refilter())
    }

    /// Leaves filter mode, showing everything.
    pub fn clear_filter(&mut self) -> Option<LayerEvent> {
        self.filter.take()?;
        self.replace_hidden(Vec::new())
    }

    /// Re-evaluates the filter over every element, for example after cell values
    /// changed.
    pub fn refilter(&mut self) -> Option<LayerEvent> {
        let next = self.filtered_out()?;
        self.replace_hidden(next)
    }

    fn filtered_out(&self) -> Option<Vec<usize>> {
        let keep = &self.filter.as_ref()?.0;
        let count = self.underlying.element_count(self.axis);
        Some(
            (0..count)
                .filter(|u| {
                    self.underlying
                        .index_of_position(self.axis, *u)
                        .is_some_and(|index| !keep(index))
                })
                .collect(),
        )
    }

    fn ensure_manual(&self, operation: &'static str) -> Result<(), GridError> {
        if self.filter.is_some() {
            return Err(GridError::Unsupported {
                operation,
                layer: "a filtered HideShowLayer",
            });
        }
        Ok(())
    }

    fn replace_hidden(&mut self, mut next: Vec<usize>) -> Option<LayerEvent> {
        let count = self.underlying.element_count(self.axis);
        next.retain(|u| *u < count);
        next.sort_unstable();
        next.dedup();
        let previous = core::mem::replace(&mut self.hidden, next);
        self.hidden_ids = self.hidden_indexes();
        let newly_hidden = self
            .hidden
            .iter()
            .filter_map(|u| visible_rank(&previous, *u));
        let newly_shown = previous
            .iter()
            .filter_map(|u| visible_rank(&self.hidden, *u));
        let change = StructuralChange::build(newly_hidden, newly_shown, []);
        if change.is_empty() {
            return None;
        }
        self.pixels.invalidate();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            axis = self.axis.name(),
            hidden = self.hidden.len(),
            "visibility changed"
        );
        Some(LayerEvent::structural(self.axis, AxisChange::Diffs(change)))
    }

    fn reconcile_diffs(&mut self, change: &StructuralChange) -> Option<AxisChange> {
        if self.filter.is_none() && !change.changes_count() {
            let updated: Vec<(usize, usize)> = change
                .updated_pairs()
                .filter_map(|(old, new)| {
                    Some((visible_rank(&self.hidden, old)?, visible_rank(&self.hidden, new)?))
                })
                .collect();
            if let Some(first) = updated.iter().map(|(_, new)| *new).min() {
                self.pixels.invalidate_from(first);
            }
            let local = StructuralChange::build([], [], updated);
            return (!local.is_empty()).then_some(AxisChange::Diffs(local));
        }
        let previous = core::mem::take(&mut self.hidden);
        let mut next: Vec<usize> = previous.iter().filter_map(|u| change.map_old(*u)).collect();
        if let Some(Filter(keep)) = &self.filter {
            let rejected = |u: &usize| {
                self.underlying
                    .index_of_position(self.axis, *u)
                    .is_some_and(|index| !keep(index))
            };
            let mut touched: Vec<usize> = change
                .added_positions()
                .chain(change.updated_pairs().map(|(_, new)| new))
                .collect();
            touched.sort_unstable();
            next.retain(|u| touched.binary_search(u).is_err() || rejected(u));
            next.extend(touched.iter().copied().filter(|u| rejected(u)));
            next.sort_unstable();
            next.dedup();
        }
        self.hidden = next;
        self.hidden_ids = self.hidden_indexes();

        let mut deleted = Vec::new();
        let mut added = Vec::new();
        let mut updated = Vec::new();
        for u in change.deleted_positions() {
            deleted.extend(visible_rank(&previous, u));
        }
        for u in change.added_positions() {
            added.extend(visible_rank(&self.hidden, u));
        }
        for (old, new) in change.updated_pairs() {
            match (visible_rank(&previous, old), visible_rank(&self.hidden, new)) {
                (Some(a), Some(b)) => updated.push((a, b)),
                (Some(a), None) => deleted.push(a),
                (None, Some(b)) => added.push(b),
                (None, None) => {}
            }
        }
        let local = StructuralChange::build(deleted, added, updated);
        if let Some(diff) = local.diffs().first() {
            self.pixels.invalidate_from(diff.before.start.min(diff.after.start));
        }
        (!local.is_empty()).then_some(AxisChange::Diffs(local))
    }

    fn follow_move(&mut self, moved: &PositionMove) -> Option<AxisChange> {
        let previous = core::mem::take(&mut self.hidden);
        self.hidden = previous.iter().map(|u| moved.map(*u)).collect();
        self.hidden.sort_unstable();

        let range = moved.range();
        let local_range = Range::new(
            visible_before(&previous, range.start),
            visible_before(&previous, range.end),
        );
        self.pixels.invalidate_from(local_range.start);
        let targets = moved
            .iter()
            .filter(|(old, _)| visible_rank(&previous, *old).is_some())
            .filter_map(|(_, new)| visible_rank(&self.hidden, new))
            .collect();
        let local = PositionMove::new(local_range, targets)?;
        (!local.is_identity()).then_some(AxisChange::Moved(local))
    }

    /// Re-resolves the hidden set by identity after the underlying axis changed
    /// wholesale.
    fn reconcile_refresh(&mut self) {
        let mut next = match self.filtered_out() {
            Some(next) => next,
            None => self
                .hidden_ids
                .iter()
                .filter_map(|index| self.underlying.position_of_index(self.axis, *index))
                .collect(),
        };
        next.sort_unstable();
        next.dedup();
        self.hidden = next;
        self.hidden_ids = self.hidden_indexes();
        self.pixels.invalidate();
    }

    fn hidden_key(&self, prefix: &str) -> String {
        Properties::key(prefix, &format!("hidden{}Indexes", self.axis.title()))
    }
}

impl<L: Layer> Layer for HideShowLayer<L> {
    fn underlying(&self) -> Option<&dyn Layer> {
        Some(&self.underlying)
    }

    fn underlying_mut(&mut self) -> Option<&mut dyn Layer> {
        Some(&mut self.underlying)
    }

    fn element_count(&self, axis: Axis) -> usize {
        let count = self.underlying.element_count(axis);
        if axis == self.axis {
            count.saturating_sub(self.hidden.len())
        } else {
            count
        }
    }

    fn underlying_position(&self, axis: Axis, position: usize) -> Option<usize> {
        if position >= self.element_count(axis) {
            return None;
        }
        Some(if axis == self.axis {
            nth_visible(&self.hidden, position)
        } else {
            position
        })
    }

    fn local_position(&self, axis: Axis, underlying: usize) -> Option<usize> {
        if underlying >= self.underlying.element_count(axis) {
            return None;
        }
        if axis == self.axis {
            visible_rank(&self.hidden, underlying)
        } else {
            Some(underlying)
        }
    }

    fn extent_of_position(&mut self, axis: Axis, position: usize) -> Option<u32> {
        let underlying = self.underlying_position(axis, position)?;
        self.underlying.extent_of_position(axis, underlying)
    }

    fn start_pixel_of_position(&mut self, axis: Axis, position: usize) -> Option<i64> {
        if axis != self.axis {
            return self.underlying.start_pixel_of_position(axis, position);
        }
        let count = self.element_count(axis);
        if position >= count {
            return None;
        }
        let Self {
            underlying,
            hidden,
            pixels,
            ..
        } = self;
        pixels.start_of(position, count, |p| {
            underlying
                .extent_of_position(axis, nth_visible(hidden, p))
                .unwrap_or(0)
        })
    }

    fn total_extent(&mut self, axis: Axis) -> i64 {
        if axis != self.axis {
            return self.underlying.total_extent(axis);
        }
        let count = self.element_count(axis);
        let Self {
            underlying,
            hidden,
            pixels,
            ..
        } = self;
        pixels.total(count, |p| {
            underlying
                .extent_of_position(axis, nth_visible(hidden, p))
                .unwrap_or(0)
        })
    }

    fn do_command(&mut self, command: &Command) -> Result<CommandOutcome, GridError> {
        let event = match command {
            Command::Hide { axis, positions } if *axis == self.axis => {
                self.hide_positions(positions)?
            }
            Command::ShowIndexes { axis, indexes } if *axis == self.axis => {
                self.show_indexes(indexes)?
            }
            Command::ShowAdjacent {
                axis,
                position,
                direction,
                show_all,
            } if *axis == self.axis => self.show_adjacent(*position, *direction, *show_all)?,
            Command::ShowAll { axis } if *axis == self.axis => self.show_all()?,
            _ => return forward_command(self, command),
        };
        Ok(CommandOutcome::handled(event))
    }

    fn handle_underlying_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        let mut structural = match event {
            LayerEvent::Structural(structural) => structural,
            visual @ LayerEvent::Visual(_) => return Some(visual),
        };
        let local = match structural.take(self.axis) {
            None => None,
            Some(AxisChange::Diffs(change)) => self.reconcile_diffs(&change),
            Some(AxisChange::Moved(moved)) => self.follow_move(&moved),
            Some(AxisChange::Refresh) => {
                self.reconcile_refresh();
                Some(AxisChange::Refresh)
            }
        };
        structural.set(self.axis, local);
        structural.into_layer_event()
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        self.underlying.save_state(prefix, properties);
        if self.filter.is_none() {
            let indexes = self.hidden_indexes().into_iter().filter_map(Index::backed);
            properties.set_list(self.hidden_key(prefix), indexes);
        }
    }

    fn load_state(
        &mut self,
        prefix: &str,
        properties: &Properties,
    ) -> Result<Option<LayerEvent>, GridError> {
        let below = self
            .underlying
            .load_state(prefix, properties)?
            .and_then(|event| self.handle_underlying_event(event));
        if self.filter.is_some() {
            return Ok(below);
        }
        let Some(indexes) = properties.list(&self.hidden_key(prefix))? else {
            return Ok(below);
        };
        let next = indexes
            .into_iter()
            .filter_map(|i| self.underlying.position_of_index(self.axis, Index::Backed(i)))
            .collect();
        let local = self.replace_hidden(next);
        Ok(LayerEvent::merge_opt(below, local))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::HideShowLayer;
    use crate::{
        Axis, AxisChange, Command, DataChange, DataLayer, Direction, GridError, Index, Layer,
        LayerEvent, LayerExt, PositionMove, Properties, Range, ReorderLayer, StructuralChange,
    };

    fn columns(count: usize) -> HideShowLayer<DataLayer> {
        HideShowLayer::new(DataLayer::new(count, 1, 10, 10), Axis::Column)
    }

    fn indexes<L: Layer>(layer: &L) -> Vec<usize> {
        (0..layer.column_count())
            .map(|p| layer.column_index_by_position(p).and_then(Index::backed).unwrap())
            .collect()
    }

    fn diffs(change: StructuralChange) -> Option<LayerEvent> {
        Some(LayerEvent::structural(Axis::Column, AxisChange::Diffs(change)))
    }

    #[test]
    fn hide_then_show_by_index() {
        let mut layer = columns(5);
        let event = layer.hide_positions(&[1]).unwrap();
        assert_eq!(event, diffs(StructuralChange::build([1], [], [])));
        assert_eq!(layer.column_count(), 4);
        assert_eq!(layer.column_index_by_position(1), Some(Index::Backed(2)));
        assert_eq!(layer.column_position_by_index(1), None);

        let event = layer.show_indexes(&[Index::Backed(1)]).unwrap();
        assert_eq!(event, diffs(StructuralChange::build([], [1], [])));
        assert_eq!(layer.column_index_by_position(1), Some(Index::Backed(1)));
    }

    #[test]
    fn disjoint_hides_fire_one_event() {
        let mut layer = columns(6);
        let event = layer.hide_positions(&[4, 1, 2]).unwrap();
        let Some(LayerEvent::Structural(structural)) = event else {
            panic!("expected a structural event");
        };
        let Some(AxisChange::Diffs(change)) = structural.get(Axis::Column) else {
            panic!("expected diffs");
        };
        assert_eq!(change.diffs().len(), 2);
        assert_eq!(change.diffs()[0].before, Range::new(1, 3));
        assert_eq!(indexes(&layer), [0, 3, 5]);
        assert_eq!(layer.hide_positions(&[9]).unwrap(), None);
    }

    #[test]
    fn show_adjacent_reveals_only_the_touching_block() {
        let mut layer = columns(6);
        layer.hide_positions(&[1, 2, 4]).unwrap();
        assert_eq!(indexes(&layer), [0, 3, 5]);

        // Nothing is hidden before the first column.
        assert_eq!(layer.show_adjacent(0, Direction::Backward, false).unwrap(), None);
        let event = layer.show_adjacent(1, Direction::Backward, false).unwrap();
        assert_eq!(event, diffs(StructuralChange::build([], [1, 2], [])));
        assert_eq!(indexes(&layer), [0, 1, 2, 3, 5]);

        layer.show_adjacent(3, Direction::Forward, false).unwrap();
        assert_eq!(indexes(&layer), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn show_adjacent_handles_trailing_block_and_show_all() {
        let mut layer = columns(4);
        layer.hide_positions(&[0, 3]).unwrap();
        assert_eq!(layer.column_count(), 2);
        layer.show_adjacent(2, Direction::Backward, false).unwrap();
        assert_eq!(indexes(&layer), [1, 2, 3]);
        layer.show_adjacent(1, Direction::Forward, true).unwrap();
        assert_eq!(indexes(&layer), [0, 1, 2, 3]);
        assert_eq!(layer.show_adjacent(4, Direction::Forward, false).unwrap(), None);
    }

    #[test]
    fn pixels_skip_hidden_columns() {
        let mut layer = columns(4);
        layer.inner_mut().size_config_mut(Axis::Column).set_size(1, 50);
        assert_eq!(layer.width(), 80);
        layer.hide_positions(&[1]).unwrap();
        assert_eq!(layer.width(), 30);
        assert_eq!(layer.start_x_of_column_position(2), Some(20));
        assert_eq!(layer.column_position_by_x(15), Some(1));
    }

    #[test]
    fn filter_mode_rejects_manual_operations() {
        let mut layer = columns(6);
        layer
            .set_filter(|index| index.backed().is_some_and(|i| i % 2 == 0))
            .unwrap();
        assert_eq!(indexes(&layer), [0, 2, 4]);
        assert_eq!(
            layer.hide_positions(&[0]),
            Err(GridError::Unsupported {
                operation: "hide_positions",
                layer: "a filtered HideShowLayer",
            })
        );
        assert!(matches!(
            layer.set_filter(|_| true),
            Err(GridError::AlreadySet {
                reset: "clear_filter",
                ..
            })
        ));
        assert!(
            layer
                .do_command(&Command::ShowAll { axis: Axis::Column })
                .is_err()
        );
        layer.clear_filter();
        assert_eq!(layer.column_count(), 6);
    }

    #[test]
    fn inserted_elements_failing_the_filter_stay_hidden() {
        let mut layer = columns(3);
        layer
            .set_filter(|index| index.backed().is_some_and(|i| i < 2))
            .unwrap();
        assert_eq!(indexes(&layer), [0, 1]);
        let outcome = layer
            .do_command(&Command::Data {
                axis: Axis::Column,
                change: DataChange::Insert { at: 3, count: 2 },
            })
            .unwrap();
        assert!(outcome.handled);
        assert_eq!(outcome.event, None);
        assert_eq!(layer.hidden_positions(), &[2, 3, 4]);
        assert_eq!(indexes(&layer), [0, 1]);
    }

    #[test]
    fn underlying_delete_prunes_hidden_set() {
        let mut layer = columns(5);
        layer.hide_positions(&[3]).unwrap();
        let outcome = layer
            .do_command(&Command::Data {
                axis: Axis::Column,
                change: DataChange::Delete {
                    indexes: vec![1, 3],
                },
            })
            .unwrap();
        // Index 3 was hidden, so only index 1 disappears from this layer.
        assert_eq!(outcome.event, diffs(StructuralChange::build([1], [], [])));
        assert_eq!(layer.hidden_positions(), &[] as &[usize]);
        assert_eq!(indexes(&layer), [0, 1, 2]);
    }

    #[test]
    fn reorder_below_moves_hidden_elements() {
        let data = DataLayer::new(4, 1, 10, 10);
        let mut layer = HideShowLayer::new(ReorderLayer::new(data, Axis::Column), Axis::Column);
        layer.hide_positions(&[1]).unwrap();
        let outcome = layer
            .do_command(&Command::Reorder {
                axis: Axis::Column,
                from: vec![0],
                to: 3,
            })
            .unwrap();
        assert_eq!(indexes(&layer), [2, 3, 0]);
        assert_eq!(layer.hidden_indexes(), [Index::Backed(1)]);
        let expected = PositionMove::new(Range::new(0, 3), vec![2, 0, 1]).unwrap();
        assert_eq!(
            outcome.event,
            Some(LayerEvent::structural(Axis::Column, AxisChange::Moved(expected)))
        );
    }

    fn over_reorder() -> HideShowLayer<ReorderLayer<DataLayer>> {
        HideShowLayer::new(
            ReorderLayer::new(DataLayer::new(4, 1, 10, 10), Axis::Column),
            Axis::Column,
        )
    }

    #[test]
    fn reset_below_keeps_the_same_element_hidden() {
        let mut layer = over_reorder();
        layer.inner_mut().reorder(3, 0);
        layer.hide_positions(&[0]).unwrap();
        assert_eq!(layer.hidden_indexes(), [Index::Backed(3)]);

        let outcome = layer
            .do_command(&Command::ResetReorder { axis: Axis::Column })
            .unwrap();
        assert!(outcome.handled);
        // Only the hidden element moved, so the visible order is unchanged.
        assert_eq!(outcome.event, None);
        assert_eq!(layer.hidden_indexes(), [Index::Backed(3)]);
        assert_eq!(indexes(&layer), [0, 1, 2]);
    }

    #[test]
    fn loading_an_order_below_keeps_the_same_element_hidden() {
        let mut layer = over_reorder();
        layer.hide_positions(&[0]).unwrap();
        let mut props = Properties::new();
        props.set("columnIndexOrder", "3,0,1,2");
        let event = layer.inner_mut().load_state("", &props).unwrap().unwrap();
        layer.handle_underlying_event(event);
        assert_eq!(layer.hidden_indexes(), [Index::Backed(0)]);
        assert_eq!(indexes(&layer), [3, 1, 2]);
    }

    #[test]
    fn loading_order_and_sizes_together_keeps_hidden_elements() {
        let mut source = ReorderLayer::new(DataLayer::new(4, 1, 10, 10), Axis::Column);
        source.reorder(3, 0);
        let mut props = Properties::new();
        source.save_state("grid", &mut props);

        let mut layer = over_reorder();
        layer.hide_positions(&[0]).unwrap();
        layer.load_state("grid", &props).unwrap();
        assert_eq!(layer.hidden_indexes(), [Index::Backed(0)]);
        assert_eq!(indexes(&layer), [3, 1, 2]);
    }

    #[test]
    fn refresh_below_resolves_hidden_elements_by_identity() {
        let mut layer = over_reorder();
        layer.hide_positions(&[1]).unwrap();
        layer.inner_mut().reorder(3, 0);
        let refresh = LayerEvent::structural(Axis::Column, AxisChange::Refresh);
        assert_eq!(layer.handle_underlying_event(refresh.clone()), Some(refresh));
        assert_eq!(layer.hidden_indexes(), [Index::Backed(1)]);
        assert_eq!(indexes(&layer), [3, 0, 2]);
    }

    #[test]
    fn resize_below_updates_in_place() {
        let mut layer = columns(4);
        layer.hide_positions(&[1]).unwrap();
        assert_eq!(layer.width(), 30);
        let outcome = layer
            .do_command(&Command::Resize {
                axis: Axis::Column,
                position: 1,
                size: 30,
            })
            .unwrap();
        assert_eq!(
            outcome.event,
            diffs(StructuralChange::updated(Range::new(1, 2)))
        );
        assert_eq!(layer.start_x_of_column_position(2), Some(40));
        assert_eq!(layer.width(), 50);
    }

    #[test]
    fn hidden_indexes_round_trip_through_properties() {
        let mut layer = columns(5);
        layer.hide_positions(&[1, 3]).unwrap();
        let mut props = Properties::new();
        layer.save_state("grid", &mut props);
        assert_eq!(props.get("grid.hiddenColumnIndexes"), Some("1,3"));

        let mut restored = columns(5);
        restored.load_state("grid", &props).unwrap();
        assert_eq!(indexes(&restored), [0, 2, 4]);
    }
}
