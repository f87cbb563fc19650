#![forbid(unsafe_code)]
//! Perilgrid model SSOT: the adjusted year-loss table as it crosses the
//! engine boundary and the HTTP surface.

mod table;

pub use table::{AdjustedTable, Row, TableError};

pub const CRATE_NAME: &str = "perilgrid-model";
