// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by layer mutations, commands and state restore.
//!
//! Queries never fail: positions, indexes and pixels outside a layer come back as
//! `None`. These errors cover programming mistakes and operations a layer variant
//! cannot perform.

use alloc::string::String;

use understory_extent::ExtentError;

/// An error from a layer operation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// An argument was out of range or inconsistent with the layer.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The layer variant cannot perform this operation.
    #[error("`{operation}` is not supported by {layer}")]
    Unsupported {
        /// Rejected operation.
        operation: &'static str,
        /// Description of the layer variant.
        layer: &'static str,
    },
    /// A single-valued setting was set twice.
    #[error("{what} is already set; call `{reset}` first")]
    AlreadySet {
        /// The setting that is already present.
        what: &'static str,
        /// Operation that clears it.
        reset: &'static str,
    },
    /// Persisted state could not be parsed or describes an impossible state.
    #[error("malformed persisted state under `{key}`: {reason}")]
    MalformedState {
        /// Offending property key.
        key: String,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// Invalid sizing configuration.
    #[error(transparent)]
    Extent(#[from] ExtentError),
}
