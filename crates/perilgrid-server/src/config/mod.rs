// SPDX-License-Identifier: Apache-2.0

use crate::AdjustError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub preview_rows: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
            preview_rows: 5,
        }
    }
}

/// Resolved once at startup and immutable for the process lifetime. The
/// four input files are re-checked on every adjustment request; nothing
/// is cached as "validated".
#[derive(Debug, Clone)]
pub struct AdjustPaths {
    pub data_dir: PathBuf,
    pub input_ylt: PathBuf,
    pub counts: PathBuf,
    pub metrics: PathBuf,
    pub gates: PathBuf,
    pub save_dir: PathBuf,
}

impl AdjustPaths {
    #[must_use]
    pub fn resolve(
        data_dir: PathBuf,
        input_ylt_file: &str,
        counts_file: &str,
        metrics_file: &str,
        gates_file: &str,
        save_dir: PathBuf,
    ) -> Self {
        Self {
            input_ylt: data_dir.join(input_ylt_file),
            counts: data_dir.join(counts_file),
            metrics: data_dir.join(metrics_file),
            gates: data_dir.join(gates_file),
            data_dir,
            save_dir,
        }
    }

    /// Confirms the four inputs exist and are regular files, failing on
    /// the first violation in fixed order: input YLT, counts, metrics,
    /// gates. Absence is a configuration error, not transient; no retry.
    pub fn ensure_inputs(&self) -> Result<(), AdjustError> {
        debug!(path = %self.input_ylt.display(), "input YLT path");
        debug!(path = %self.counts.display(), "counts path");
        debug!(path = %self.metrics.display(), "metrics path");
        debug!(path = %self.gates.display(), "gates path");
        debug!(path = %self.save_dir.display(), "save directory");

        require_file("input YLT path", &self.input_ylt)?;
        require_file("counts path", &self.counts)?;
        require_file("metrics path", &self.metrics)?;
        require_file("gates path", &self.gates)?;
        Ok(())
    }
}

fn require_file(label: &'static str, path: &Path) -> Result<(), AdjustError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AdjustError::MissingInput {
            label,
            path: path.to_path_buf(),
        })
    }
}

pub fn validate_startup_config_contract(
    api: &ApiConfig,
    paths: &AdjustPaths,
) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if api.preview_rows == 0 {
        return Err("preview rows must be > 0".to_string());
    }
    if paths.data_dir.as_os_str().is_empty() {
        return Err("data directory must not be empty".to_string());
    }
    if paths.save_dir.as_os_str().is_empty() {
        return Err("save directory must not be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_paths(tmp: &Path) -> AdjustPaths {
        for name in ["ylt.parquet", "counts.csv", "metrics.csv", "gates.csv"] {
            std::fs::write(tmp.join(name), b"fixture").expect("seed input file");
        }
        AdjustPaths::resolve(
            tmp.to_path_buf(),
            "ylt.parquet",
            "counts.csv",
            "metrics.csv",
            "gates.csv",
            tmp.join("charts"),
        )
    }

    #[test]
    fn ensure_inputs_accepts_seeded_files() {
        let tmp = tempdir().expect("tempdir");
        let paths = seeded_paths(tmp.path());
        paths.ensure_inputs().expect("all inputs present");
    }

    #[test]
    fn ensure_inputs_fails_fast_in_fixed_order() {
        let tmp = tempdir().expect("tempdir");
        let paths = seeded_paths(tmp.path());
        std::fs::remove_file(&paths.counts).expect("drop counts");
        std::fs::remove_file(&paths.gates).expect("drop gates");

        let err = paths.ensure_inputs().expect_err("counts missing");
        assert!(
            err.to_string().starts_with("counts path not found"),
            "counts must be reported before gates, got: {err}"
        );
    }

    #[test]
    fn ensure_inputs_rejects_directories() {
        let tmp = tempdir().expect("tempdir");
        let paths = seeded_paths(tmp.path());
        std::fs::remove_file(&paths.input_ylt).expect("drop ylt file");
        std::fs::create_dir(&paths.input_ylt).expect("replace with dir");

        let err = paths.ensure_inputs().expect_err("directory is not a file");
        assert!(err.to_string().starts_with("input YLT path not found"));
    }

    #[test]
    fn startup_contract_rejects_zero_limits() {
        let tmp = tempdir().expect("tempdir");
        let paths = seeded_paths(tmp.path());
        let api = ApiConfig {
            preview_rows: 0,
            ..ApiConfig::default()
        };
        let err = validate_startup_config_contract(&api, &paths).expect_err("zero preview rows");
        assert!(err.contains("preview rows"));

        let api = ApiConfig {
            max_body_bytes: 0,
            ..ApiConfig::default()
        };
        let err = validate_startup_config_contract(&api, &paths).expect_err("zero body limit");
        assert!(err.contains("max body bytes"));

        validate_startup_config_contract(&ApiConfig::default(), &paths)
            .expect("defaults satisfy the contract");
    }
}
