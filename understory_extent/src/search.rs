// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel to position lookup over non-uniform extents.

/// Finds the element whose `[start, start + extent)` contains `pixel`.
///
/// - `len`: number of elements in the strip.
/// - `total`: total extent of the strip.
/// - `probe`: reports `(start, extent)` for a position in `0..len`.
///
/// The search assumes a uniform average extent to guess a candidate, checks the
/// candidate's actual bounds, and narrows to the sub-strip before or after it with
/// the candidate's edges as the new pixel bounds. For roughly uniform sizes this
/// lands in one or two probes; skewed sizes degrade toward a bounded scan of the
/// remaining sub-strip, never beyond `len` probes.
///
/// Zero-extent elements never contain a pixel. Returns `None` when `pixel` is
/// outside `[0, total)` or the strip is empty.
pub fn position_at_pixel(
    pixel: i64,
    len: usize,
    total: i64,
    mut probe: impl FnMut(usize) -> (i64, u32),
) -> Option<usize> {
    if len == 0 || pixel < 0 || pixel >= total {
        return None;
    }

    let (mut lo, mut hi) = (0_usize, len);
    let (mut lo_pixel, mut hi_pixel) = (0_i64, total);

    while lo < hi {
        let count = hi - lo;
        let span = hi_pixel - lo_pixel;
        let guess = if span <= 0 {
            lo
        } else {
            let estimate = i128::from(pixel - lo_pixel) * i128::try_from(count).unwrap_or(i128::MAX)
                / i128::from(span);
            lo + usize::try_from(estimate).unwrap_or(count - 1).min(count - 1)
        };

        let (start, extent) = probe(guess);
        let end = start + i64::from(extent);
        if pixel < start {
            hi = guess;
            hi_pixel = start;
        } else if pixel >= end {
            lo = guess + 1;
            lo_pixel = end;
        } else {
            return Some(guess);
        }
    }
    None
}
