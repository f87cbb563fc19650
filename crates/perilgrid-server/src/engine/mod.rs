// SPDX-License-Identifier: Apache-2.0

use crate::config::AdjustPaths;
use crate::AdjustError;
use async_trait::async_trait;
use perilgrid_model::AdjustedTable;

pub mod fake;
pub mod process;

/// Call boundary to the external adjustment routine. The engine owns no
/// transformation logic; whatever it raises propagates unchanged to the
/// HTTP surface, which turns it into a user-visible error.
#[async_trait]
pub trait AdjustEngine: Send + Sync + 'static {
    fn engine_tag(&self) -> &'static str {
        "unknown"
    }

    async fn adjust(&self, paths: &AdjustPaths) -> Result<AdjustedTable, AdjustError>;
}
