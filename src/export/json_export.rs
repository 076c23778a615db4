//! JSON export of exposure outcomes.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::config::Parameters;
use crate::error::Result;
use crate::survival::ExposureOutcome;

/// Full outcome export structure
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeExport<'a> {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: &'static str,
    /// Parameters the outcome was computed with
    pub parameters: &'a Parameters,
    pub outcome: &'a ExposureOutcome,
}

/// Write an outcome as pretty JSON to any writer
pub fn write_outcome_json<W: Write>(
    writer: W,
    params: &Parameters,
    outcome: &ExposureOutcome,
) -> Result<()> {
    let export = OutcomeExport {
        exported_at: Local::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        parameters: params,
        outcome,
    };
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}

/// Export an outcome to `dir/outcome_YYYYMMDD_HHMMSS.json`
///
/// Creates the directory if it doesn't exist.
/// Returns the path to the saved JSON file.
pub fn export_outcome_json<P: AsRef<Path>>(
    dir: P,
    params: &Parameters,
    outcome: &ExposureOutcome,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let timestamp = Local::now();
    let path = dir.join(format!("outcome_{}.json", timestamp.format("%Y%m%d_%H%M%S")));

    let file = std::fs::File::create(&path)?;
    write_outcome_json(file, params, outcome)?;

    log::info!("JSON outcome exported: {}", path.display());
    Ok(path)
}
