//! Export functionality for model results.
//!
//! Provides CSV time-series export of oxygen trajectories and JSON export
//! of exposure outcomes.

mod csv_export;
mod json_export;

pub use csv_export::{export_trajectory_csv, TrajectoryCsvWriter, TrajectoryRecord};
pub use json_export::{export_outcome_json, write_outcome_json, OutcomeExport};
