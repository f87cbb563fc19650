// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One adjusted row: column name to numeric or categorical value, in the
/// column order the engine emitted.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TableError {
    Decode(String),
}

impl Display for TableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(msg) => write!(f, "adjusted table decode failed: {msg}"),
        }
    }
}

impl std::error::Error for TableError {}

/// The tabular result of an adjustment run. Row order is significant:
/// previews take the first rows, never a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjustedTable {
    rows: Vec<Row>,
}

impl AdjustedTable {
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Decodes the engine's record output: a JSON array of objects.
    pub fn from_json_records(bytes: &[u8]) -> Result<Self, TableError> {
        let rows: Vec<Row> =
            serde_json::from_slice(bytes).map_err(|e| TableError::Decode(e.to_string()))?;
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (row count, column count of the first row). An empty table has
    /// shape (0, 0).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        let cols = self.rows.first().map_or(0, serde_json::Map::len);
        (self.rows.len(), cols)
    }

    /// The first `n` rows in original order. A table shorter than `n`
    /// yields all of its rows; an empty table yields an empty preview.
    #[must_use]
    pub fn preview(&self, n: usize) -> Self {
        Self {
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}
