// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Permutation of one axis.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashSet;
use understory_extent::ExtentCache;

use crate::properties::malformed;
use crate::{
    Axis, AxisChange, Command, CommandOutcome, GridError, Index, Layer, LayerEvent, PositionMove,
    Properties, Range, StructuralChange, forward_command,
};

/// Shows the underlying elements of one axis in a caller-chosen order.
///
/// `order[p]` is the underlying position shown at local position `p`; the inverse
/// map is kept in step so both directions are O(1). Reorders emit
/// [`AxisChange::Moved`] over the smallest range whose contents changed.
///
/// Reorder positions use insertion-point semantics: elements move to just before
/// the element currently at `to`, so `reorder(x, x)` and `reorder(x, x + 1)` leave
/// the order unchanged and `to >= count` appends.
#[derive(Debug)]
pub struct ReorderLayer<L> {
    underlying: L,
    axis: Axis,
    order: Vec<usize>,
    inverse: Vec<usize>,
    /// Identity of the element at each local position, for re-resolving the order
    /// after a refresh from below.
    ids: Vec<Option<Index>>,
    pixels: ExtentCache,
}

impl<L: Layer> ReorderLayer<L> {
    /// Wraps `underlying`, reordering `axis`, starting from the identity order.
    pub fn new(underlying: L, axis: Axis) -> Self {
        let count = underlying.element_count(axis);
        let mut layer = Self {
            underlying,
            axis,
            order: (0..count).collect(),
            inverse: (0..count).collect(),
            ids: Vec::new(),
            pixels: ExtentCache::new(),
        };
        layer.remember_ids();
        layer
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

    /// The reordered axis.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Underlying positions in local order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Returns `true` if the order matches the underlying order.
    pub fn is_identity(&self) -> bool {
        self.order.iter().enumerate().all(|(p, u)| p == *u)
    }

    /// Moves the element at `from` to just before the element at `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Option<LayerEvent> {
        self.reorder_multiple(&[from], to)
    }

    /// Moves the elements at `from` (kept in their relative order) to just before
    /// the element at `to`.
    ///
    /// When `to` falls inside the moved set, the block lands right after the last
    /// unmoved element before `to`. Out-of-range source positions are ignored.
    pub fn reorder_multiple(&mut self, from: &[usize], to: usize) -> Option<LayerEvent> {
        let count = self.order.len();
        let mut moving: Vec<usize> = from.iter().copied().filter(|p| *p < count).collect();
        moving.sort_unstable();
        moving.dedup();
        if moving.is_empty() {
            return None;
        }
        let to = to.min(count);
        let dest = to - moving.partition_point(|p| *p < to);

        let moved: Vec<usize> = moving.iter().map(|p| self.order[*p]).collect();
        let mut next = Vec::with_capacity(count);
        let mut skip = moving.iter().peekable();
        for (p, u) in self.order.iter().enumerate() {
            if skip.next_if_eq(&&p).is_none() {
                next.push(*u);
            }
        }
        next.splice(dest..dest, moved);

        let moved = self.apply_order(next)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            axis = self.axis.name(),
            ?moving,
            to,
            range = %moved.range(),
            "reordered"
        );
        Some(LayerEvent::structural(self.axis, AxisChange::Moved(moved)))
    }

    /// Restores the underlying order.
    ///
    /// Like a reorder, the event is a [`AxisChange::Moved`] over the range whose
    /// contents changed.
    pub fn reset_reorder(&mut self) -> Option<LayerEvent> {
        let count = self.order.len();
        let moved = self.apply_order((0..count).collect())?;
        #[cfg(feature = "tracing")]
        tracing::debug!(axis = self.axis.name(), range = %moved.range(), "reset reorder");
        Some(LayerEvent::structural(self.axis, AxisChange::Moved(moved)))
    }

    fn apply_order(&mut self, next: Vec<usize>) -> Option<PositionMove> {
        let lo = self.order.iter().zip(&next).position(|(a, b)| a != b)?;
        let hi = self.order.len()
            - self
                .order
                .iter()
                .rev()
                .zip(next.iter().rev())
                .position(|(a, b)| a != b)?;
        for (q, u) in next.iter().enumerate().take(hi).skip(lo) {
            self.inverse[*u] = q;
        }
        let targets = self.order[lo..hi].iter().map(|u| self.inverse[*u]).collect();
        self.order = next;
        for (id, u) in self.ids[lo..hi].iter_mut().zip(&self.order[lo..hi]) {
            *id = self.underlying.index_of_position(self.axis, *u);
        }
        self.pixels.invalidate_from(lo);
        PositionMove::new(Range::new(lo, hi), targets)
    }

    fn remember_ids(&mut self) {
        let Self {
            underlying,
            axis,
            order,
            ids,
            ..
        } = self;
        ids.clear();
        ids.extend(order.iter().map(|u| underlying.index_of_position(*axis, *u)));
    }

    fn rebuild_inverse(&mut self) {
        self.inverse = vec![0; self.order.len()];
        for (p, u) in self.order.iter().enumerate() {
            self.inverse[*u] = p;
        }
    }

    /// Rebuilds the order after the underlying axis gained or lost elements.
    ///
    /// Survivors keep their relative order. An inserted element goes right before
    /// the nearest surviving element that follows it in underlying order, or at
    /// the end if none does.
    fn reconcile_diffs(&mut self, change: &StructuralChange) -> Option<AxisChange> {
        if !change.changes_count() {
            let updated: Vec<(usize, usize)> = change
                .updated_pairs()
                .filter_map(|(old, new)| Some((*self.inverse.get(old)?, *self.inverse.get(new)?)))
                .collect();
            if let Some(first) = updated.iter().map(|(_, new)| *new).min() {
                self.pixels.invalidate_from(first);
            }
            let local = StructuralChange::build([], [], updated);
            return (!local.is_empty()).then_some(AxisChange::Diffs(local));
        }
        let new_count = self.underlying.element_count(self.axis);
        let mut deleted = Vec::new();
        let mut kept = Vec::with_capacity(new_count);
        for (p, u) in self.order.iter().enumerate() {
            match change.map_old(*u) {
                Some(n) => kept.push(n),
                None => deleted.push(p),
            }
        }

        let mut slot_of = vec![None; new_count];
        for (slot, n) in kept.iter().enumerate() {
            if let Some(entry) = slot_of.get_mut(*n) {
                *entry = Some(slot);
            }
        }
        let mut inserts = Vec::new();
        let mut next_slot = kept.len();
        for n in (0..new_count).rev() {
            match slot_of[n] {
                Some(slot) => next_slot = slot,
                None => inserts.push((next_slot, n)),
            }
        }
        inserts.sort_unstable();

        let mut next = Vec::with_capacity(new_count);
        let mut added = Vec::with_capacity(inserts.len());
        let mut pending = inserts.into_iter().peekable();
        for (slot, n) in kept.into_iter().enumerate() {
            while let Some((_, a)) = pending.next_if(|(s, _)| *s == slot) {
                added.push(next.len());
                next.push(a);
            }
            next.push(n);
        }
        for (_, a) in pending {
            added.push(next.len());
            next.push(a);
        }

        let old_inverse = core::mem::take(&mut self.inverse);
        self.order = next;
        self.rebuild_inverse();
        self.remember_ids();
        let updated: Vec<(usize, usize)> = change
            .updated_pairs()
            .filter_map(|(old, new)| Some((*old_inverse.get(old)?, *self.inverse.get(new)?)))
            .collect();

        let local = StructuralChange::build(deleted, added, updated);
        if let Some(diff) = local.diffs().first() {
            self.pixels.invalidate_from(diff.before.start.min(diff.after.start));
        }
        (!local.is_empty()).then_some(AxisChange::Diffs(local))
    }

    fn follow_move(&mut self, moved: &PositionMove) {
        let range = moved.range();
        let before: Vec<usize> = self.inverse[range.start..range.end].to_vec();
        for (old, new) in moved.iter() {
            let local = before[old - range.start];
            self.inverse[new] = local;
            self.order[local] = new;
        }
    }

    /// Re-resolves the order by element identity after the underlying axis changed
    /// wholesale. Elements that are gone are dropped and unknown ones are appended
    /// in underlying order.
    fn reconcile_refresh(&mut self) {
        let count = self.underlying.element_count(self.axis);
        let mut seen = vec![false; count];
        let mut next = Vec::with_capacity(count);
        for id in self.ids.iter().flatten() {
            if let Some(u) = self.underlying.position_of_index(self.axis, *id)
                && u < count
                && !core::mem::replace(&mut seen[u], true)
            {
                next.push(u);
            }
        }
        next.extend((0..count).filter(|u| !seen[*u]));
        self.order = next;
        self.rebuild_inverse();
        self.remember_ids();
        self.pixels.invalidate();
    }

    fn order_key(&self, prefix: &str) -> alloc::string::String {
        Properties::key(prefix, &format!("{}IndexOrder", self.axis.name()))
    }
}

impl<L: Layer> Layer for ReorderLayer<L> {
    fn underlying(&self) -> Option<&dyn Layer> {
        Some(&self.underlying)
    }

    fn underlying_mut(&mut self) -> Option<&mut dyn Layer> {
        Some(&mut self.underlying)
    }

    fn element_count(&self, axis: Axis) -> usize {
        if axis == self.axis {
            self.order.len()
        } else {
            self.underlying.element_count(axis)
        }
    }

    fn underlying_position(&self, axis: Axis, position: usize) -> Option<usize> {
        if axis == self.axis {
            self.order.get(position).copied()
        } else {
            (position < self.underlying.element_count(axis)).then_some(position)
        }
    }

    fn local_position(&self, axis: Axis, underlying: usize) -> Option<usize> {
        if axis == self.axis {
            self.inverse.get(underlying).copied()
        } else {
            (underlying < self.underlying.element_count(axis)).then_some(underlying)
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
        if position >= self.order.len() {
            return None;
        }
        let Self {
            underlying,
            order,
            pixels,
            ..
        } = self;
        pixels.start_of(position, order.len(), |p| {
            underlying.extent_of_position(axis, order[p]).unwrap_or(0)
        })
    }

    fn total_extent(&mut self, axis: Axis) -> i64 {
        if axis != self.axis {
            return self.underlying.total_extent(axis);
        }
        let Self {
            underlying,
            order,
            pixels,
            ..
        } = self;
        pixels.total(order.len(), |p| {
            underlying.extent_of_position(axis, order[p]).unwrap_or(0)
        })
    }

    fn do_command(&mut self, command: &Command) -> Result<CommandOutcome, GridError> {
        match command {
            Command::Reorder { axis, from, to } if *axis == self.axis => {
                Ok(CommandOutcome::handled(self.reorder_multiple(from, *to)))
            }
            Command::ResetReorder { axis } if *axis == self.axis => {
                Ok(CommandOutcome::handled(self.reset_reorder()))
            }
            _ => forward_command(self, command),
        }
    }

    fn handle_underlying_event(&mut self, event: LayerEvent) -> Option<LayerEvent> {
        let mut structural = match event {
            LayerEvent::Structural(structural) => structural,
            visual @ LayerEvent::Visual(_) => return Some(visual),
        };
        let local = match structural.take(self.axis) {
            None => None,
            Some(AxisChange::Diffs(change)) => self.reconcile_diffs(&change),
            Some(AxisChange::Moved(moved)) => {
                // Elements keep their local positions; only their underlying ones moved.
                self.follow_move(&moved);
                None
            }
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
        let indexes = self.order.iter().filter_map(|u| {
            self.underlying
                .index_of_position(self.axis, *u)
                .and_then(Index::backed)
        });
        properties.set_list(self.order_key(prefix), indexes);
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
        let key = self.order_key(prefix);
        let Some(indexes) = properties.list(&key)? else {
            return Ok(below);
        };

        let count = self.underlying.element_count(self.axis);
        let mut seen_indexes = HashSet::with_capacity(indexes.len());
        let mut shown = vec![false; count];
        let mut next = Vec::with_capacity(count);
        for index in indexes {
            if !seen_indexes.insert(index) {
                return Err(malformed(&key, "index listed twice"));
            }
            // Indexes that no longer exist are dropped.
            if let Some(u) = self.underlying.position_of_index(self.axis, Index::Backed(index)) {
                shown[u] = true;
                next.push(u);
            }
        }
        next.extend((0..count).filter(|u| !shown[*u]));
        let local = if next.len() == self.order.len() {
            self.apply_order(next)
                .map(|moved| LayerEvent::structural(self.axis, AxisChange::Moved(moved)))
        } else {
            self.order = next;
            self.rebuild_inverse();
            self.remember_ids();
            self.pixels.invalidate();
            Some(LayerEvent::structural(self.axis, AxisChange::Refresh))
        };
        Ok(LayerEvent::merge_opt(below, local))
    }
}
