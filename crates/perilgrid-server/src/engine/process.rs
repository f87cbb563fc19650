// SPDX-License-Identifier: Apache-2.0

use crate::config::AdjustPaths;
use crate::engine::AdjustEngine;
use crate::AdjustError;
use async_trait::async_trait;
use perilgrid_model::AdjustedTable;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::info;

/// Runs the adjustment routine as a child process. The routine receives
/// the four validated input paths and must print its adjusted table to
/// stdout as a JSON array of row objects. The call blocks until the
/// child exits; there is no timeout in this layer.
pub struct ProcessEngine {
    program: PathBuf,
}

impl ProcessEngine {
    #[must_use]
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

#[async_trait]
impl AdjustEngine for ProcessEngine {
    fn engine_tag(&self) -> &'static str {
        "process"
    }

    async fn adjust(&self, paths: &AdjustPaths) -> Result<AdjustedTable, AdjustError> {
        let started = Instant::now();
        info!(program = %self.program.display(), "adjustment run start");
        let output = Command::new(&self.program)
            .arg("--ylt")
            .arg(&paths.input_ylt)
            .arg("--counts")
            .arg(&paths.counts)
            .arg("--metrics")
            .arg(&paths.metrics)
            .arg("--gates")
            .arg(&paths.gates)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AdjustError::Engine(format!("adjustment routine failed to start: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdjustError::Engine(format!(
                "adjustment routine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let table = AdjustedTable::from_json_records(&output.stdout)
            .map_err(|e| AdjustError::Engine(e.to_string()))?;
        info!(
            rows = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "adjustment run complete"
        );
        Ok(table)
    }
}
