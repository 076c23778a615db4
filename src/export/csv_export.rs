//! CSV time-series export for oxygen trajectories.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::config::OerCurveParameters;
use crate::error::{FlashError, Result};
use crate::exposure::Exposure;
use crate::kinetics::OxygenTrajectory;

/// Record for CSV time-series export
#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryRecord {
    /// Time since start of exposure (seconds)
    pub time_sec: f64,
    /// Dose rate held from this sample on (Gy/s)
    pub dose_rate_Gy_per_sec: f64,
    /// Oxygen (fraction of 100% O2)
    pub o2: f64,
    /// Instantaneous OER
    pub oer: f64,
}

/// CSV writer for trajectory records
pub struct TrajectoryCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> TrajectoryCsvWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
            rows: 0,
        }
    }

    /// Write one row per sample of the trajectory
    pub fn write_trajectory(
        &mut self,
        exposure: &Exposure,
        trajectory: &OxygenTrajectory,
        curve: &OerCurveParameters,
    ) -> Result<usize> {
        if trajectory.len() != exposure.len() {
            return Err(FlashError::invalid(
                "trajectory",
                format!(
                    "{} oxygen samples for an exposure of {} samples",
                    trajectory.len(),
                    exposure.len()
                ),
            ));
        }

        let start = self.rows;
        for ((time_sec, o2), &dose_rate) in trajectory.iter().zip(exposure.dose_rates()) {
            let record = TrajectoryRecord {
                time_sec,
                dose_rate_Gy_per_sec: dose_rate,
                o2,
                oer: curve.oer(o2),
            };
            self.writer.serialize(&record)?;
            self.rows += 1;
        }
        Ok(self.rows - start)
    }

    /// Flush and hand back the underlying writer
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| FlashError::Io(e.into_error()))
    }
}

/// Write a trajectory to `dir/trajectory_YYYYMMDD_HHMMSS.csv`
///
/// Creates the directory if it doesn't exist.
pub fn export_trajectory_csv<P: AsRef<Path>>(
    dir: P,
    exposure: &Exposure,
    trajectory: &OxygenTrajectory,
    curve: &OerCurveParameters,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("trajectory_{}.csv", timestamp));

    let mut writer = TrajectoryCsvWriter::new(File::create(&path)?);
    let rows = writer.write_trajectory(exposure, trajectory, curve)?;
    writer.finish()?;

    log::info!("CSV export completed: {} ({} rows)", path.display(), rows);
    Ok(path)
}
