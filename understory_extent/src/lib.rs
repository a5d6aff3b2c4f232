// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_extent --heading-base-level=0

//! Understory Extent: pixel sizing for one axis of a grid.
//!
//! This crate answers the pixel half of grid coordinate questions for a single
//! axis (columns or rows) of `0..count` elements:
//!
//! - [`SizeConfig`]: per-element pixel extents with a default size, per-position
//!   overrides, optional percentage sizing against an available pixel total, and
//!   an integer DPI scale. Start offsets are served from a lazily maintained
//!   prefix-sum cache.
//! - [`ExtentCache`]: the prefix-sum cache on its own, for callers that derive
//!   extents from somewhere else (for example a transformed view of another axis).
//! - [`position_at_pixel`]: converts a pixel offset to the element containing it
//!   over non-uniform extents, narrowing an average-extent estimate instead of
//!   scanning linearly.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_extent::SizeConfig;
//!
//! // Five columns, 100 pixels wide unless overridden.
//! let mut widths = SizeConfig::new(5, 100);
//! widths.set_size(0, 150);
//! widths.set_size(2, 35);
//!
//! assert_eq!(widths.start_of(2), Some(250));
//! assert_eq!(widths.total(), 485);
//! assert_eq!(widths.position_at_pixel(260), Some(2));
//! assert_eq!(widths.position_at_pixel(485), None);
//! ```
//!
//! Pixel offsets are `i64` and extents are `u32`. Queries outside the axis return
//! `None` rather than panicking, so callers can chain them with `?`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod cache;
mod error;
mod search;
mod size_config;

pub use cache::ExtentCache;
pub use error::ExtentError;
pub use search::position_at_pixel;
pub use size_config::SizeConfig;
