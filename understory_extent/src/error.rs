// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while configuring an axis.

/// Invalid sizing configuration.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExtentError {
    /// A single percentage was above 100.
    #[error("percentage {percentage} for position {position} exceeds 100")]
    PercentageOutOfRange {
        /// Position the percentage was assigned to.
        position: usize,
        /// Offending percentage.
        percentage: u32,
    },
    /// The explicit percentages of an axis add up to more than 100.
    #[error("explicit percentages sum to {total}, which exceeds 100")]
    PercentageOverflow {
        /// Sum of all explicit percentages including the rejected one.
        total: u32,
    },
    /// A zero scale would collapse every element.
    #[error("scale must be a positive percentage")]
    ZeroScale,
}
