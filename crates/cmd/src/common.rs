// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Parent of the per-run output directories when `--local-dir` is not given
pub const DEFAULT_OUTPUT_PARENT: &str = "tmp";

/// Minute-granularity stamp naming a run's default output directory
pub const RUN_STAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// Default output directory for a run started at `started`
pub fn default_output_dir(started: &DateTime<Local>) -> PathBuf {
    Path::new(DEFAULT_OUTPUT_PARENT).join(started.format(RUN_STAMP_FORMAT).to_string())
}

/// `--local-dir` if given, else the default for `started`
pub fn resolve_output_dir(local_dir: Option<PathBuf>, started: &DateTime<Local>) -> PathBuf {
    local_dir.unwrap_or_else(|| default_output_dir(started))
}
