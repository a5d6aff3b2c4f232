// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synthetic trailing elements such as a totals row.

use alloc::vec;
use alloc::vec::Vec;

use crate::{
    Axis, AxisChange, Command, CommandOutcome, GridError, Index, Layer, LayerEvent, Range,
    StructuralChange, SyntheticId, forward_command,
};

/// Appends synthetic elements after the last underlying element of one axis.
///
/// Synthetic elements have no backing index. Their identity is
/// [`Index::Synthetic`] carrying this layer's `tag` and the element's ordinal, and
/// only this layer translates that identity back to a position. Layers below
/// never see synthetic positions, so commands naming them stop here.
///
/// Structural events from below pass through unchanged: the synthetic elements
/// sit after every underlying position and shift with the underlying count.
#[derive(Clone, Debug)]
pub struct SummaryLayer<L> {
    underlying: L,
    axis: Axis,
    tag: u32,
    extents: Vec<u32>,
}

impl<L: Layer> SummaryLayer<L> {
    /// Appends `count` synthetic elements of `extent` pixels along `axis`.
    pub fn new(underlying: L, axis: Axis, tag: u32, count: usize, extent: u32) -> Self {
        Self {
            underlying,
            axis,
            tag,
            extents: vec![extent; count],
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

    /// The axis the synthetic elements are appended to.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Tag identifying this layer's synthetic elements.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// Number of synthetic elements.
    pub fn summary_count(&self) -> usize {
        self.extents.len()
    }

    /// Ordinal of the synthetic element at `position`, if it is one.
    pub fn summary_ordinal(&self, position: usize) -> Option<usize> {
        let ordinal = position.checked_sub(self.underlying.element_count(self.axis))?;
        (ordinal < self.extents.len()).then_some(ordinal)
    }

    /// Sets the extent of synthetic element `ordinal`.
    pub fn resize_summary(&mut self, ordinal: usize, size: u32) -> Option<LayerEvent> {
        let extent = self.extents.get_mut(ordinal)?;
        if *extent == size {
            return None;
        }
        *extent = size;
        let position = self.underlying.element_count(self.axis) + ordinal;
        #[cfg(feature = "tracing")]
        tracing::debug!(axis = self.axis.name(), ordinal, size, "summary resized");
        Some(LayerEvent::structural(
            self.axis,
            AxisChange::Diffs(StructuralChange::updated(Range::new(position, position + 1))),
        ))
    }

    fn synthetic_extent(&self) -> i64 {
        self.extents.iter().map(|e| i64::from(*e)).sum()
    }
}

impl<L: Layer> Layer for SummaryLayer<L> {
    fn underlying(&self) -> Option<&dyn Layer> {
        Some(&self.underlying)
    }

    fn underlying_mut(&mut self) -> Option<&mut dyn Layer> {
        Some(&mut self.underlying)
    }

    fn element_count(&self, axis: Axis) -> usize {
        let count = self.underlying.element_count(axis);
        if axis == self.axis {
            count + self.extents.len()
        } else {
            count
        }
    }

    fn underlying_position(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.underlying.element_count(axis)).then_some(position)
    }

    fn local_position(&self, axis: Axis, underlying: usize) -> Option<usize> {
        (underlying < self.underlying.element_count(axis)).then_some(underlying)
    }

    fn extent_of_position(&mut self, axis: Axis, position: usize) -> Option<u32> {
        if axis == self.axis
            && let Some(ordinal) = self.summary_ordinal(position)
        {
            return Some(self.extents[ordinal]);
        }
        self.underlying.extent_of_position(axis, position)
    }

    fn start_pixel_of_position(&mut self, axis: Axis, position: usize) -> Option<i64> {
        if axis == self.axis
            && let Some(ordinal) = self.summary_ordinal(position)
        {
            let before: i64 = self.extents[..ordinal].iter().map(|e| i64::from(*e)).sum();
            return Some(self.underlying.total_extent(axis) + before);
        }
        self.underlying.start_pixel_of_position(axis, position)
    }

    fn total_extent(&mut self, axis: Axis) -> i64 {
        let total = self.underlying.total_extent(axis);
        if axis == self.axis {
            total + self.synthetic_extent()
        } else {
            total
        }
    }

    fn index_of_position(&self, axis: Axis, position: usize) -> Option<Index> {
        if axis == self.axis
            && let Some(ordinal) = self.summary_ordinal(position)
        {
            return Some(Index::Synthetic(SyntheticId {
                tag: self.tag,
                ordinal,
            }));
        }
        self.underlying.index_of_position(axis, position)
    }

    fn position_of_index(&self, axis: Axis, index: Index) -> Option<usize> {
        match index {
            Index::Synthetic(SyntheticId { tag, ordinal })
                if axis == self.axis && tag == self.tag =>
            {
                (ordinal < self.extents.len())
                    .then(|| self.underlying.element_count(axis) + ordinal)
            }
            _ => self.underlying.position_of_index(axis, index),
        }
    }

    fn do_command(&mut self, command: &Command) -> Result<CommandOutcome, GridError> {
        if let Command::Resize {
            axis,
            position,
            size,
        } = command
            && *axis == self.axis
            && let Some(ordinal) = self.summary_ordinal(*position)
        {
            return Ok(CommandOutcome::handled(self.resize_summary(ordinal, *size)));
        }
        forward_command(self, command)
    }
}
