// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-axis sizing: default size, overrides, percentage sizing and scaling.

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::{ExtentCache, ExtentError, position_at_pixel};

/// Pixel extents for one axis of `0..count` elements.
///
/// Sizes are stored unscaled and multiplied by the scale (in percent) when
/// queried. When percentage sizing is enabled, elements without a fixed pixel
/// override share the available pixels: elements with an explicit percentage
/// get that share of what the fixed elements leave over, and the rest split the
/// remainder evenly. Rounding leftovers go to the earliest shared elements so
/// the axis exactly fills the available pixels.
#[derive(Clone, Debug)]
pub struct SizeConfig {
    count: usize,
    default_size: u32,
    sizes: HashMap<usize, u32>,
    percentages: HashMap<usize, u32>,
    resizable_by_default: bool,
    resizable: HashMap<usize, bool>,
    percentage_sizing: bool,
    available: u32,
    scale_percent: u32,
    resolved: Option<Vec<u32>>,
    cache: ExtentCache,
}

impl SizeConfig {
    /// Creates an axis of `count` elements, each `default_size` pixels.
    #[must_use]
    pub fn new(count: usize, default_size: u32) -> Self {
        Self {
            count,
            default_size,
            sizes: HashMap::new(),
            percentages: HashMap::new(),
            resizable_by_default: true,
            resizable: HashMap::new(),
            percentage_sizing: false,
            available: 0,
            scale_percent: 100,
            resolved: None,
            cache: ExtentCache::new(),
        }
    }

    /// Number of elements on this axis.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Unscaled default size.
    #[must_use]
    pub const fn default_size(&self) -> u32 {
        self.default_size
    }

    /// Sets the unscaled default size.
    pub fn set_default_size(&mut self, size: u32) {
        self.default_size = size;
        self.invalidate();
    }

    /// Current scale in percent (`100` is unscaled).
    #[must_use]
    pub const fn scale_percent(&self) -> u32 {
        self.scale_percent
    }

    /// Sets the scale in percent.
    pub fn set_scale_percent(&mut self, scale_percent: u32) -> Result<(), ExtentError> {
        if scale_percent == 0 {
            return Err(ExtentError::ZeroScale);
        }
        self.scale_percent = scale_percent;
        self.invalidate();
        Ok(())
    }

    /// Whether percentage sizing is active.
    #[must_use]
    pub const fn is_percentage_sizing(&self) -> bool {
        self.percentage_sizing
    }

    /// Enables or disables percentage sizing.
    pub fn set_percentage_sizing(&mut self, enabled: bool) {
        if self.percentage_sizing != enabled {
            self.percentage_sizing = enabled;
            self.invalidate();
        }
    }

    /// Pixels available to percentage sizing.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.available
    }

    /// Updates the pixels available to percentage sizing.
    ///
    /// Returns `true` if any extent changed as a result.
    pub fn set_available(&mut self, pixels: u32) -> bool {
        if self.available == pixels {
            return false;
        }
        self.available = pixels;
        if self.percentage_sizing {
            self.invalidate();
            true
        } else {
            false
        }
    }

    /// Assigns an explicit percentage to `position`.
    pub fn set_percentage(&mut self, position: usize, percentage: u32) -> Result<(), ExtentError> {
        if percentage > 100 {
            return Err(ExtentError::PercentageOutOfRange {
                position,
                percentage,
            });
        }
        let others: u32 = self
            .percentages
            .iter()
            .filter(|(p, _)| **p != position)
            .map(|(_, pct)| *pct)
            .sum();
        if others + percentage > 100 {
            return Err(ExtentError::PercentageOverflow {
                total: others + percentage,
            });
        }
        self.percentages.insert(position, percentage);
        self.invalidate();
        Ok(())
    }

    /// Removes the explicit percentage of `position`.
    pub fn clear_percentage(&mut self, position: usize) {
        if self.percentages.remove(&position).is_some() {
            self.invalidate();
        }
    }

    /// Whether elements accept [`SizeConfig::set_size`] unless overridden.
    pub fn set_resizable_by_default(&mut self, resizable: bool) {
        self.resizable_by_default = resizable;
    }

    /// Overrides resizability of a single position.
    pub fn set_resizable(&mut self, position: usize, resizable: bool) {
        self.resizable.insert(position, resizable);
    }

    /// Whether `position` accepts resizing.
    #[must_use]
    pub fn is_resizable(&self, position: usize) -> bool {
        position < self.count
            && self
                .resizable
                .get(&position)
                .copied()
                .unwrap_or(self.resizable_by_default)
    }

    /// Sets the on-screen size of `position`.
    ///
    /// The size is stored unscaled. Returns `false` (and changes nothing) when the
    /// position is out of range, not resizable, or already that size.
    pub fn set_size(&mut self, position: usize, pixels: u32) -> bool {
        if !self.is_resizable(position) {
            return false;
        }
        let unscaled = self.downscale(pixels);
        if self.sizes.get(&position) == Some(&unscaled) {
            return false;
        }
        self.sizes.insert(position, unscaled);
        if self.percentage_sizing {
            self.invalidate();
        } else {
            self.cache.invalidate_from(position);
        }
        true
    }

    /// Removes a size override so `position` falls back to the default.
    pub fn clear_size(&mut self, position: usize) {
        if self.sizes.remove(&position).is_some() {
            self.invalidate();
        }
    }

    /// Unscaled size overrides sorted by position.
    #[must_use]
    pub fn size_overrides(&self) -> Vec<(usize, u32)> {
        let mut out: Vec<_> = self.sizes.iter().map(|(p, s)| (*p, *s)).collect();
        out.sort_unstable();
        out
    }

    /// Explicit percentages sorted by position.
    #[must_use]
    pub fn percentage_overrides(&self) -> Vec<(usize, u32)> {
        let mut out: Vec<_> = self.percentages.iter().map(|(p, s)| (*p, *s)).collect();
        out.sort_unstable();
        out
    }

    /// Replaces every unscaled size override.
    pub fn restore_size_overrides(&mut self, overrides: impl IntoIterator<Item = (usize, u32)>) {
        self.sizes = overrides.into_iter().filter(|(p, _)| *p < self.count).collect();
        self.invalidate();
    }

    /// Replaces every explicit percentage.
    pub fn restore_percentages(
        &mut self,
        overrides: impl IntoIterator<Item = (usize, u32)>,
    ) -> Result<(), ExtentError> {
        self.percentages.clear();
        for (position, percentage) in overrides {
            self.set_percentage(position, percentage)?;
        }
        self.invalidate();
        Ok(())
    }

    /// Changes the element count, moving per-position state along with its element.
    ///
    /// `remap` maps an old position to its new position, or `None` if the element
    /// was removed. It must preserve relative order.
    pub fn remap(&mut self, new_count: usize, mut remap: impl FnMut(usize) -> Option<usize>) {
        fn remap_keys<V>(
            map: &mut HashMap<usize, V>,
            new_count: usize,
            remap: &mut impl FnMut(usize) -> Option<usize>,
        ) {
            *map = map
                .drain()
                .filter_map(|(p, v)| remap(p).filter(|n| *n < new_count).map(|n| (n, v)))
                .collect();
        }
        remap_keys(&mut self.sizes, new_count, &mut remap);
        remap_keys(&mut self.percentages, new_count, &mut remap);
        remap_keys(&mut self.resizable, new_count, &mut remap);
        self.count = new_count;
        self.invalidate();
    }

    /// Scaled on-screen size of `position`.
    #[must_use]
    pub fn size_of(&mut self, position: usize) -> Option<u32> {
        if position >= self.count {
            return None;
        }
        if self.percentage_sizing {
            return self.resolved().get(position).copied();
        }
        let unscaled = self.sizes.get(&position).copied().unwrap_or(self.default_size);
        Some(self.upscale(unscaled))
    }

    /// Start pixel of `position`. `position == count` yields the total extent.
    pub fn start_of(&mut self, position: usize) -> Option<i64> {
        if position > self.count {
            return None;
        }
        let count = self.count;
        if self.percentage_sizing {
            self.resolved();
            let Self {
                resolved, cache, ..
            } = self;
            let resolved = resolved.as_deref().unwrap_or_default();
            return cache.start_of(position, count, |p| resolved.get(p).copied().unwrap_or(0));
        }
        let Self {
            sizes,
            default_size,
            scale_percent,
            cache,
            ..
        } = self;
        cache.start_of(position, count, |p| {
            upscale(
                sizes.get(&p).copied().unwrap_or(*default_size),
                *scale_percent,
            )
        })
    }

    /// Total extent of the axis.
    pub fn total(&mut self) -> i64 {
        self.start_of(self.count).unwrap_or(0)
    }

    /// Position containing `pixel`, or `None` outside `[0, total)`.
    pub fn position_at_pixel(&mut self, pixel: i64) -> Option<usize> {
        let total = self.total();
        let count = self.count;
        position_at_pixel(pixel, count, total, |p| {
            (
                self.start_of(p).unwrap_or(total),
                self.size_of(p).unwrap_or(0),
            )
        })
    }

    fn invalidate(&mut self) {
        self.resolved = None;
        self.cache.invalidate();
    }

    fn upscale(&self, unscaled: u32) -> u32 {
        upscale(unscaled, self.scale_percent)
    }

    fn downscale(&self, pixels: u32) -> u32 {
        let scale = u64::from(self.scale_percent.max(1));
        u32::try_from((u64::from(pixels) * 100 + scale / 2) / scale).unwrap_or(u32::MAX)
    }

    fn resolved(&mut self) -> &[u32] {
        if self.resolved.is_none() {
            self.resolved = Some(self.resolve_percentages());
        }
        self.resolved.as_deref().unwrap_or_default()
    }

    fn resolve_percentages(&self) -> Vec<u32> {
        let mut out = vec![0_u32; self.count];
        let mut fixed = 0_u64;
        let mut shared = Vec::new();
        for (position, slot) in out.iter_mut().enumerate() {
            if self.percentages.contains_key(&position) {
                continue;
            }
            match self.sizes.get(&position) {
                Some(size) => {
                    *slot = self.upscale(*size);
                    fixed += u64::from(*slot);
                }
                None => shared.push(position),
            }
        }

        let remaining = u64::from(self.available).saturating_sub(fixed);
        let mut used = 0_u64;
        for (position, percentage) in &self.percentages {
            if let Some(slot) = out.get_mut(*position) {
                let share = remaining * u64::from(*percentage) / 100;
                *slot = u32::try_from(share).unwrap_or(u32::MAX);
                used += share;
            }
        }

        let leftover = remaining.saturating_sub(used);
        if !shared.is_empty() {
            let n = u64::try_from(shared.len()).unwrap_or(u64::MAX);
            let each = leftover / n;
            let mut extra = leftover % n;
            for position in shared {
                let bonus = u64::from(extra > 0);
                extra = extra.saturating_sub(1);
                out[position] = u32::try_from(each + bonus).unwrap_or(u32::MAX);
            }
        }
        out
    }
}

fn upscale(unscaled: u32, scale_percent: u32) -> u32 {
    if scale_percent == 100 {
        return unscaled;
    }
    let scaled = (u64::from(unscaled) * u64::from(scale_percent) + 50) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
