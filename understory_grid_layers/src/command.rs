// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Commands: typed requests sent down a layer stack.
//!
//! A command enters the stack at the top layer. Each layer either handles it or
//! converts its positions into the underlying layer's space and passes it on (see
//! [`forward_command`](crate::forward_command)). The layer that handles a command
//! returns an event in its own space, which every layer above translates on the
//! way back up.

use alloc::vec::Vec;

use bitflags::bitflags;

use crate::{Axis, CellRegion, Index, Layer, LayerEvent, PositionCoordinate, Range};

bitflags! {
    /// Keyboard modifiers that shape a selection gesture.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u8 {
        /// Extend from the anchor.
        const SHIFT = 0b01;
        /// Toggle or accumulate.
        const CTRL = 0b10;
    }
}

/// Direction along an axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Toward position 0 (left or up).
    Backward,
    /// Away from position 0 (right or down).
    #[default]
    Forward,
}

/// A change to the backing data source along one axis, in backing indexes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataChange {
    /// `count` elements were inserted before index `at`.
    Insert {
        /// Index of the first inserted element.
        at: usize,
        /// Number of inserted elements.
        count: usize,
    },
    /// The elements at these indexes were removed.
    Delete {
        /// Removed indexes, in any order.
        indexes: Vec<usize>,
    },
    /// The elements in this range changed in place.
    Update {
        /// Updated indexes.
        range: Range,
    },
}

/// A request to a layer stack.
///
/// Positions are expressed in the coordinate space of the layer that receives the
/// command, except where a variant says otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Move the elements at `from` so they land before the element currently at `to`.
    Reorder {
        /// Reordered axis.
        axis: Axis,
        /// Positions to move.
        from: Vec<usize>,
        /// Insertion point; `to >= count` appends.
        to: usize,
    },
    /// Restore the backing order.
    ResetReorder {
        /// Reset axis.
        axis: Axis,
    },
    /// Hide the elements at these positions.
    Hide {
        /// Hidden axis.
        axis: Axis,
        /// Positions to hide.
        positions: Vec<usize>,
    },
    /// Show hidden elements by identity.
    ShowIndexes {
        /// Axis to show on.
        axis: Axis,
        /// Element identities; never converted.
        indexes: Vec<Index>,
    },
    /// Show the hidden block next to a position.
    ShowAdjacent {
        /// Axis to show on.
        axis: Axis,
        /// Position whose neighborhood is revealed; may equal the count.
        position: usize,
        /// Side of `position` to reveal.
        direction: Direction,
        /// Reveal every hidden element instead of the adjacent block.
        show_all: bool,
    },
    /// Show every hidden element.
    ShowAll {
        /// Axis to show on.
        axis: Axis,
    },
    /// Set the on-screen extent of one element.
    Resize {
        /// Resized axis.
        axis: Axis,
        /// Resized position.
        position: usize,
        /// New extent in pixels.
        size: u32,
    },
    /// The backing data changed shape; indexes are backing indexes.
    Data {
        /// Changed axis.
        axis: Axis,
        /// What changed.
        change: DataChange,
    },
    /// The pixels available for display changed.
    ClientAreaResized {
        /// Available width.
        width: u32,
        /// Available height.
        height: u32,
    },
    /// Move the viewport origin to an absolute pixel.
    SetOrigin {
        /// Scrolled axis.
        axis: Axis,
        /// New origin in the scrolled layer's pixel space.
        pixel: i64,
    },
    /// Move the viewport origin by a pixel delta.
    ScrollBy {
        /// Scrolled axis.
        axis: Axis,
        /// Signed delta.
        delta: i64,
    },
    /// Move the viewport origin by one client area.
    ScrollPage {
        /// Scrolled axis.
        axis: Axis,
        /// Scroll direction.
        direction: Direction,
    },
    /// Scroll so the element becomes fully visible.
    ShowPosition {
        /// Scrolled axis.
        axis: Axis,
        /// Position in the space of the layer beneath the viewport; never converted.
        position: usize,
    },
    /// Select one cell.
    SelectCell {
        /// Selected cell.
        coordinate: PositionCoordinate,
        /// Gesture modifiers.
        modifiers: Modifiers,
    },
    /// Select a rectangular region.
    SelectRegion {
        /// Selected region.
        region: CellRegion,
        /// Gesture modifiers.
        modifiers: Modifiers,
        /// Explicit anchor; defaults to the region origin.
        anchor: Option<PositionCoordinate>,
    },
    /// Select a whole column or row.
    SelectAxis {
        /// Axis of the selected element.
        axis: Axis,
        /// Selected position.
        position: usize,
        /// Gesture modifiers.
        modifiers: Modifiers,
    },
    /// Select every cell.
    SelectAll,
    /// Clear the selection and anchor.
    ClearSelection,
    /// Move the selection anchor without changing the selection.
    MoveAnchor {
        /// New anchor.
        coordinate: PositionCoordinate,
    },
}

impl Command {
    /// Converts positions from `layer`'s space into its underlying layer's space.
    ///
    /// Returns `None` if a position the command needs has no counterpart below, in
    /// which case the command cannot be forwarded. Position lists keep the
    /// positions that convert and are dropped only when none do.
    #[must_use]
    pub fn to_underlying<L: Layer + ?Sized>(&self, layer: &L) -> Option<Self> {
        let convert = |axis: Axis, position: usize| layer.underlying_position(axis, position);
        let convert_cell = |c: PositionCoordinate| {
            Some(PositionCoordinate::new(
                convert(Axis::Column, c.column)?,
                convert(Axis::Row, c.row)?,
            ))
        };
        let convert_list = |axis: Axis, positions: &[usize]| {
            let converted: Vec<usize> = positions
                .iter()
                .filter_map(|p| convert(axis, *p))
                .collect();
            (!converted.is_empty()).then_some(converted)
        };
        // Insertion points may sit one past the last position.
        let convert_gap = |axis: Axis, position: usize| {
            let count = layer.element_count(axis);
            if position < count {
                convert(axis, position)
            } else if count == 0 {
                Some(layer.underlying()?.element_count(axis))
            } else {
                convert(axis, count - 1).map(|p| p + 1)
            }
        };

        Some(match self {
            Self::Reorder { axis, from, to } => Self::Reorder {
                axis: *axis,
                from: convert_list(*axis, from)?,
                to: convert_gap(*axis, *to)?,
            },
            Self::Hide { axis, positions } => Self::Hide {
                axis: *axis,
                positions: convert_list(*axis, positions)?,
            },
            Self::ShowAdjacent {
                axis,
                position,
                direction,
                show_all,
            } => Self::ShowAdjacent {
                axis: *axis,
                position: convert_gap(*axis, *position)?,
                direction: *direction,
                show_all: *show_all,
            },
            Self::Resize {
                axis,
                position,
                size,
            } => Self::Resize {
                axis: *axis,
                position: convert(*axis, *position)?,
                size: *size,
            },
            Self::SelectCell {
                coordinate,
                modifiers,
            } => Self::SelectCell {
                coordinate: convert_cell(*coordinate)?,
                modifiers: *modifiers,
            },
            Self::SelectRegion {
                region,
                modifiers,
                anchor,
            } => {
                let origin = convert_cell(region.origin())?;
                let far = convert_cell(region.far_corner()?)?;
                Self::SelectRegion {
                    region: CellRegion::spanning(origin, far),
                    modifiers: *modifiers,
                    anchor: match anchor {
                        Some(anchor) => Some(convert_cell(*anchor)?),
                        None => None,
                    },
                }
            }
            Self::SelectAxis {
                axis,
                position,
                modifiers,
            } => Self::SelectAxis {
                axis: *axis,
                position: convert(*axis, *position)?,
                modifiers: *modifiers,
            },
            Self::MoveAnchor { coordinate } => Self::MoveAnchor {
                coordinate: convert_cell(*coordinate)?,
            },
            Self::ResetReorder { .. }
            | Self::ShowIndexes { .. }
            | Self::ShowAll { .. }
            | Self::Data { .. }
            | Self::ClientAreaResized { .. }
            | Self::SetOrigin { .. }
            | Self::ScrollBy { .. }
            | Self::ScrollPage { .. }
            | Self::ShowPosition { .. }
            | Self::SelectAll
            | Self::ClearSelection => self.clone(),
        })
    }
}

/// Result of offering a command to a layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Whether some layer handled the command.
    pub handled: bool,
    /// The resulting event, in the space of the layer that returned the outcome.
    pub event: Option<LayerEvent>,
}

impl CommandOutcome {
    /// No layer handled the command.
    #[must_use]
    pub const fn unhandled() -> Self {
        Self {
            handled: false,
            event: None,
        }
    }

    /// The command was handled, optionally producing an event.
    #[must_use]
    pub const fn handled(event: Option<LayerEvent>) -> Self {
        Self {
            handled: true,
            event,
        }
    }
}
