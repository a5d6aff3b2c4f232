// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer events.
//!
//! Events are immutable values. A layer that receives an event from the layer
//! below builds a new event in its own coordinate space instead of editing the one
//! it received.

use bitflags::bitflags;

use crate::{Axis, PositionMove, StructuralChange};

/// How the positions along one axis changed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisChange {
    /// Positions were added, deleted or updated.
    Diffs(StructuralChange),
    /// Positions were permuted without changing the count.
    Moved(PositionMove),
    /// Anything may have changed; consumers rebuild their state along this axis.
    Refresh,
}

/// A structural change along one or both axes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralEvent {
    columns: Option<AxisChange>,
    rows: Option<AxisChange>,
}

impl StructuralEvent {
    /// An event with a change along a single axis.
    #[must_use]
    pub fn single(axis: Axis, change: AxisChange) -> Self {
        let mut event = Self::default();
        event.set(axis, Some(change));
        event
    }

    /// Refresh along both axes.
    #[must_use]
    pub fn refresh_all() -> Self {
        Self {
            columns: Some(AxisChange::Refresh),
            rows: Some(AxisChange::Refresh),
        }
    }

    /// The change along `axis`.
    #[must_use]
    pub fn get(&self, axis: Axis) -> Option<&AxisChange> {
        match axis {
            Axis::Column => self.columns.as_ref(),
            Axis::Row => self.rows.as_ref(),
        }
    }

    /// Replaces the change along `axis`.
    pub fn set(&mut self, axis: Axis, change: Option<AxisChange>) {
        match axis {
            Axis::Column => self.columns = change,
            Axis::Row => self.rows = change,
        }
    }

    /// Removes and returns the change along `axis`.
    pub fn take(&mut self, axis: Axis) -> Option<AxisChange> {
        match axis {
            Axis::Column => self.columns.take(),
            Axis::Row => self.rows.take(),
        }
    }

    /// Returns `true` if neither axis changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_none() && self.rows.is_none()
    }

    /// Combines two events that happened one after the other.
    ///
    /// Two changes along the same axis cannot be composed position by position, so
    /// they collapse to [`AxisChange::Refresh`].
    #[must_use]
    pub fn merge(mut self, mut later: Self) -> Self {
        for axis in Axis::ALL {
            let merged = match (self.take(axis), later.take(axis)) {
                (Some(_), Some(_)) => Some(AxisChange::Refresh),
                (first, second) => first.or(second),
            };
            self.set(axis, merged);
        }
        self
    }

    pub(crate) fn into_layer_event(self) -> Option<LayerEvent> {
        (!self.is_empty()).then_some(LayerEvent::Structural(self))
    }
}

bitflags! {
    /// A set of axes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Axes: u8 {
        /// The column axis.
        const COLUMNS = 0b01;
        /// The row axis.
        const ROWS = 0b10;
    }
}

impl From<Axis> for Axes {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Column => Self::COLUMNS,
            Axis::Row => Self::ROWS,
        }
    }
}

/// A change that leaves the meaning of positions untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisualEvent {
    /// The viewport origin moved along these axes.
    Scrolled(Axes),
    /// The selection or its anchor changed.
    SelectionChanged,
}

/// A notification emitted by a layer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerEvent {
    /// Positions changed shape.
    Structural(StructuralEvent),
    /// Only presentation changed.
    Visual(VisualEvent),
}

impl LayerEvent {
    /// Structural change along a single axis.
    #[must_use]
    pub fn structural(axis: Axis, change: AxisChange) -> Self {
        Self::Structural(StructuralEvent::single(axis, change))
    }

    /// The structural part, if any.
    #[must_use]
    pub fn as_structural(&self) -> Option<&StructuralEvent> {
        match self {
            Self::Structural(event) => Some(event),
            Self::Visual(_) => None,
        }
    }

    /// Combines two events that happened one after the other.
    ///
    /// Structural events dominate visual ones, since consumers of a structural event
    /// repaint anyway. Two visual events keep the later one, except that scrolls
    /// along different axes accumulate.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        match (self, later) {
            (Self::Structural(a), Self::Structural(b)) => Self::Structural(a.merge(b)),
            (Self::Structural(a), Self::Visual(_)) | (Self::Visual(_), Self::Structural(a)) => {
                Self::Structural(a)
            }
            (
                Self::Visual(VisualEvent::Scrolled(a)),
                Self::Visual(VisualEvent::Scrolled(b)),
            ) => Self::Visual(VisualEvent::Scrolled(a | b)),
            (Self::Visual(_), later @ Self::Visual(_)) => later,
        }
    }

    /// Merges two optional events.
    #[must_use]
    pub fn merge_opt(first: Option<Self>, later: Option<Self>) -> Option<Self> {
        match (first, later) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        }
    }
}
