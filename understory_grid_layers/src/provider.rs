// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell value access consumed by search and other collaborators.

use alloc::vec::Vec;

use crate::{Axis, DataChange, Range};

/// Read/write access to cell values by backing index.
pub trait DataProvider {
    /// Cell value type.
    type Value;

    /// Number of backing columns.
    fn column_count(&self) -> usize;

    /// Number of backing rows.
    fn row_count(&self) -> usize;

    /// Value of the cell at backing `(column, row)`.
    fn value(&self, column: usize, row: usize) -> Option<Self::Value>;

    /// Replaces the value at backing `(column, row)`. Returns `false` if the cell
    /// does not exist or is read-only.
    fn set_value(&mut self, column: usize, row: usize, value: Self::Value) -> bool;
}

/// Typed column access for one row object.
pub trait ColumnAccessor<R> {
    /// Cell value type.
    type Value;

    /// Number of columns a row exposes.
    fn column_count(&self) -> usize;

    /// Value of `column` in `row`.
    fn get(&self, row: &R, column: usize) -> Option<Self::Value>;

    /// Writes `column` of `row`. Returns `false` if the column is read-only or does
    /// not exist.
    fn set(&self, row: &mut R, column: usize, value: Self::Value) -> bool;
}

/// A [`DataProvider`] over a list of row objects.
///
/// Structural edits return the [`DataChange`] to send down the stack as a
/// [`Command::Data`](crate::Command::Data) so layers stay in step with the list.
#[derive(Clone, Debug, Default)]
pub struct ListDataProvider<R, A> {
    rows: Vec<R>,
    accessor: A,
}

impl<R, A: ColumnAccessor<R>> ListDataProvider<R, A> {
    /// Wraps `rows`, reading columns through `accessor`.
    pub fn new(rows: Vec<R>, accessor: A) -> Self {
        Self { rows, accessor }
    }

    /// The row objects.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// The column accessor.
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Inserts a row before backing index `at` (clamped to the row count).
    pub fn insert(&mut self, at: usize, row: R) -> (Axis, DataChange) {
        let at = at.min(self.rows.len());
        self.rows.insert(at, row);
        (Axis::Row, DataChange::Insert { at, count: 1 })
    }

    /// Removes the row at backing index `index`.
    pub fn remove(&mut self, index: usize) -> Option<(R, Axis, DataChange)> {
        (index < self.rows.len()).then(|| {
            let row = self.rows.remove(index);
            (
                row,
                Axis::Row,
                DataChange::Delete {
                    indexes: alloc::vec![index],
                },
            )
        })
    }

    /// Applies `edit` to the row at `index` in place.
    pub fn update(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut R),
    ) -> Option<(Axis, DataChange)> {
        let row = self.rows.get_mut(index)?;
        edit(row);
        Some((
            Axis::Row,
            DataChange::Update {
                range: Range::new(index, index + 1),
            },
        ))
    }
}

impl<R, A: ColumnAccessor<R>> DataProvider for ListDataProvider<R, A> {
    type Value = A::Value;

    fn column_count(&self) -> usize {
        self.accessor.column_count()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, column: usize, row: usize) -> Option<Self::Value> {
        self.accessor.get(self.rows.get(row)?, column)
    }

    fn set_value(&mut self, column: usize, row: usize, value: Self::Value) -> bool {
        match self.rows.get_mut(row) {
            Some(row) => self.accessor.set(row, column, value),
            None => false,
        }
    }
}
