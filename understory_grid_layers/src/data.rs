// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The bottom of every stack: backing element counts and pixel sizing.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::fmt;

use understory_extent::SizeConfig;

use crate::{
    Axis, AxisChange, CellRegion, Command, CommandOutcome, DataChange, DataProvider, GridError,
    Index, Layer, LayerEvent, Properties, StructuralChange, StructuralEvent,
};

/// Declares which cells span several backing elements.
pub trait SpanSource: fmt::Debug {
    /// The span containing the cell at backing `(column, row)`, as a region of
    /// backing indexes, or `None` if the cell does not span.
    fn span_at(&self, column: usize, row: usize) -> Option<CellRegion>;
}

/// Identity layer over a rectangular backing data source.
///
/// Positions equal backing indexes. Each axis carries a [`SizeConfig`] for pixel
/// extents. Resizes, data changes and client area changes arrive as commands and
/// leave as structural events.
///
/// Changes made through [`DataLayer::size_config_mut`] bypass event propagation
/// and are meant for setting up a stack before it is shown.
pub struct DataLayer {
    columns: SizeConfig,
    rows: SizeConfig,
    spans: Option<Box<dyn SpanSource>>,
}

impl fmt::Debug for DataLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataLayer")
            .field("columns", &self.columns.count())
            .field("rows", &self.rows.count())
            .field("spans", &self.spans)
            .finish_non_exhaustive()
    }
}

impl DataLayer {
    /// Creates a layer of `columns x rows` elements with uniform default sizes.
    #[must_use]
    pub fn new(columns: usize, rows: usize, default_width: u32, default_height: u32) -> Self {
        Self {
            columns: SizeConfig::new(columns, default_width),
            rows: SizeConfig::new(rows, default_height),
            spans: None,
        }
    }

    /// Creates a layer sized to `provider`.
    #[must_use]
    pub fn for_provider<P: DataProvider + ?Sized>(
        provider: &P,
        default_width: u32,
        default_height: u32,
    ) -> Self {
        Self::new(
            provider.column_count(),
            provider.row_count(),
            default_width,
            default_height,
        )
    }

    /// Sizing of `axis`.
    #[must_use]
    pub fn size_config(&self, axis: Axis) -> &SizeConfig {
        match axis {
            Axis::Column => &self.columns,
            Axis::Row => &self.rows,
        }
    }

    /// Mutable sizing of `axis`.
    pub fn size_config_mut(&mut self, axis: Axis) -> &mut SizeConfig {
        match axis {
            Axis::Column => &mut self.columns,
            Axis::Row => &mut self.rows,
        }
    }

    /// Installs the span declarations.
    pub fn set_span_source(&mut self, spans: impl SpanSource + 'static) {
        self.spans = Some(Box::new(spans));
    }

    /// Removes the span declarations.
    pub fn clear_span_source(&mut self) {
        self.spans = None;
    }

    /// Sets the on-screen extent of `position`.
    ///
    /// Returns `None` if the position is out of range, not resizable, or already
    /// that size.
    pub fn resize(&mut self, axis: Axis, position: usize, size: u32) -> Option<LayerEvent> {
        let config = self.size_config_mut(axis);
        let percentage = config.is_percentage_sizing();
        if !config.set_size(position, size) {
            return None;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(axis = axis.name(), position, size, "resized element");
        // Under percentage sizing one fixed size redistributes every shared extent.
        let change = if percentage {
            StructuralChange::updated((0..config.count()).into())
        } else {
            StructuralChange::build([], [], [(position, position)])
        };
        Some(LayerEvent::structural(axis, AxisChange::Diffs(change)))
    }

    /// Applies a backing data change along `axis`, moving size overrides with their
    /// elements.
    pub fn apply_data_change(
        &mut self,
        axis: Axis,
        change: &DataChange,
    ) -> Result<Option<LayerEvent>, GridError> {
        let config = self.size_config_mut(axis);
        let count = config.count();
        let diff = match change {
            DataChange::Insert { at, count: inserted } => {
                if *at > count {
                    return Err(GridError::InvalidArgument(format!(
                        "insert at {at} beyond {} count {count}",
                        axis.name()
                    )));
                }
                if *inserted == 0 {
                    return Ok(None);
                }
                let (at, inserted) = (*at, *inserted);
                config.remap(count + inserted, |p| {
                    Some(if p < at { p } else { p + inserted })
                });
                StructuralChange::build([], at..at + inserted, [])
            }
            DataChange::Delete { indexes } => {
                let mut deleted: Vec<usize> = indexes.clone();
                deleted.sort_unstable();
                deleted.dedup();
                if let Some(bad) = deleted.iter().find(|i| **i >= count) {
                    return Err(GridError::InvalidArgument(format!(
                        "cannot delete {} index {bad} of {count}",
                        axis.name()
                    )));
                }
                if deleted.is_empty() {
                    return Ok(None);
                }
                config.remap(count - deleted.len(), |p| match deleted.binary_search(&p) {
                    Ok(_) => None,
                    Err(removed_before) => Some(p - removed_before),
                });
                StructuralChange::build(deleted, [], [])
            }
            DataChange::Update { range } => {
                if range.end > count {
                    return Err(GridError::InvalidArgument(format!(
                        "update {range} beyond {} count {count}",
                        axis.name()
                    )));
                }
                if range.is_empty() {
                    return Ok(None);
                }
                StructuralChange::updated(*range)
            }
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(axis = axis.name(), ?change, "applied data change");
        Ok(Some(LayerEvent::structural(axis, AxisChange::Diffs(diff))))
    }

    /// Updates the pixels available to percentage sizing on both axes.
    pub fn set_client_area(&mut self, width: u32, height: u32) -> Option<LayerEvent> {
        let mut event = StructuralEvent::default();
        for (axis, pixels) in [(Axis::Column, width), (Axis::Row, height)] {
            let config = self.size_config_mut(axis);
            if config.set_available(pixels) {
                let all = StructuralChange::updated((0..config.count()).into());
                event.set(axis, Some(AxisChange::Diffs(all)));
            }
        }
        event.into_layer_event()
    }
}

const fn size_key(axis: Axis) -> &'static str {
    match axis {
        Axis::Column => "columnWidth",
        Axis::Row => "rowHeight",
    }
}

impl Layer for DataLayer {
    fn underlying(&self) -> Option<&dyn Layer> {
        None
    }

    fn underlying_mut(&mut self) -> Option<&mut dyn Layer> {
        None
    }

    fn element_count(&self, axis: Axis) -> usize {
        self.size_config(axis).count()
    }

    fn underlying_position(&self, axis: Axis, position: usize) -> Option<usize> {
        (position < self.element_count(axis)).then_some(position)
    }

    fn local_position(&self, axis: Axis, underlying: usize) -> Option<usize> {
        (underlying < self.element_count(axis)).then_some(underlying)
    }

    fn extent_of_position(&mut self, axis: Axis, position: usize) -> Option<u32> {
        self.size_config_mut(axis).size_of(position)
    }

    fn start_pixel_of_position(&mut self, axis: Axis, position: usize) -> Option<i64> {
        let config = self.size_config_mut(axis);
        if position >= config.count() {
            return None;
        }
        config.start_of(position)
    }

    fn total_extent(&mut self, axis: Axis) -> i64 {
        self.size_config_mut(axis).total()
    }

    fn position_at_pixel(&mut self, axis: Axis, pixel: i64) -> Option<usize> {
        self.size_config_mut(axis).position_at_pixel(pixel)
    }

    fn span_of_index(&self, column: Index, row: Index) -> Option<CellRegion> {
        self.spans.as_ref()?.span_at(column.backed()?, row.backed()?)
    }

    fn do_command(&mut self, command: &Command) -> Result<CommandOutcome, GridError> {
        match command {
            Command::Resize {
                axis,
                position,
                size,
            } => Ok(CommandOutcome::handled(self.resize(*axis, *position, *size))),
            Command::Data { axis, change } => {
                Ok(CommandOutcome::handled(self.apply_data_change(*axis, change)?))
            }
            Command::ClientAreaResized { width, height } => {
                Ok(CommandOutcome::handled(self.set_client_area(*width, *height)))
            }
            _ => Ok(CommandOutcome::unhandled()),
        }
    }

    fn save_state(&self, prefix: &str, properties: &mut Properties) {
        for axis in Axis::ALL {
            let config = self.size_config(axis);
            let base = Properties::key(prefix, size_key(axis));
            properties.set(
                Properties::key(&base, "default"),
                format!("{}", config.default_size()),
            );
            properties.set_pairs(Properties::key(&base, "sizes"), config.size_overrides());
            properties.set_pairs(
                Properties::key(&base, "percentages"),
                config.percentage_overrides(),
            );
        }
    }

    fn load_state(
        &mut self,
        prefix: &str,
        properties: &Properties,
    ) -> Result<Option<LayerEvent>, GridError> {
        let mut event = StructuralEvent::default();
        for axis in Axis::ALL {
            let base = Properties::key(prefix, size_key(axis));
            let default = properties.number(&Properties::key(&base, "default"))?;
            let sizes = properties.pairs(&Properties::key(&base, "sizes"))?;
            let percentages = properties.pairs(&Properties::key(&base, "percentages"))?;
            if default.is_none() && sizes.is_none() && percentages.is_none() {
                continue;
            }
            let config = self.size_config_mut(axis);
            if let Some(default) = default {
                config.set_default_size(default);
            }
            if let Some(sizes) = sizes {
                config.restore_size_overrides(sizes);
            }
            if let Some(percentages) = percentages {
                config.restore_percentages(percentages)?;
            }
            let all = StructuralChange::updated((0..config.count()).into());
            event.set(axis, Some(AxisChange::Diffs(all)));
        }
        Ok(event.into_layer_event())
    }
}
