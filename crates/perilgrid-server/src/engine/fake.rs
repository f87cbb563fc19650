// SPDX-License-Identifier: Apache-2.0

use crate::config::AdjustPaths;
use crate::engine::AdjustEngine;
use crate::AdjustError;
use async_trait::async_trait;
use perilgrid_model::AdjustedTable;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Scripted engine for tests: returns a canned table, or a canned
/// failure when `fail_with` is set.
pub struct FakeEngine {
    pub table: Mutex<AdjustedTable>,
    pub fail_with: Mutex<Option<String>>,
    pub adjust_calls: AtomicU64,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            table: Mutex::new(AdjustedTable::default()),
            fail_with: Mutex::new(None),
            adjust_calls: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl AdjustEngine for FakeEngine {
    fn engine_tag(&self) -> &'static str {
        "fake"
    }

    async fn adjust(&self, _paths: &AdjustPaths) -> Result<AdjustedTable, AdjustError> {
        self.adjust_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(msg) = self.fail_with.lock().await.clone() {
            return Err(AdjustError::Engine(msg));
        }
        Ok(self.table.lock().await.clone())
    }
}
