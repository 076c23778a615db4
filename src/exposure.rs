//! Dose delivery over time.
//!
//! An exposure is a time grid with one dose-rate sample per point. Dose
//! rate i is held constant over [t_i, t_{i+1}); the last sample only closes
//! the interval, so its rate never delivers dose.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, FlashError, Result};
use crate::kinetics::integrator::MAX_SUBSTEPS;

/// One held interval of an exposure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start_sec: f64,
    pub duration_sec: f64,
    pub dose_rate_Gy_per_sec: f64,
}

impl Segment {
    /// Dose delivered over the segment (Gy)
    pub fn dose_Gy(&self) -> f64 {
        self.dose_rate_Gy_per_sec * self.duration_sec
    }
}

/// Rectangular pulse train, as delivered by pulsed electron linacs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseTrain {
    /// Dose rate inside a pulse (Gy/s)
    pub dose_rate_Gy_per_sec: f64,
    /// Pulse width (s)
    pub pulse_width_sec: f64,
    /// Pulse start-to-start spacing (s)
    pub period_sec: f64,
    /// Number of pulses
    pub n_pulses: usize,
    /// Grid points inside each pulse
    pub samples_per_pulse: usize,
}

impl PulseTrain {
    /// Dose delivered by the full train (Gy)
    pub fn total_dose_Gy(&self) -> f64 {
        self.dose_rate_Gy_per_sec * self.pulse_width_sec * self.n_pulses as f64
    }
}

/// Validated dose-rate-over-time description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exposure {
    times_sec: Vec<f64>,
    dose_rates_Gy_per_sec: Vec<f64>,
}

impl Exposure {
    /// Build an exposure from matching time and dose-rate samples.
    ///
    /// Times must be finite and strictly increasing, dose rates finite and
    /// non-negative.
    pub fn from_samples(times_sec: Vec<f64>, dose_rates_Gy_per_sec: Vec<f64>) -> Result<Self> {
        if times_sec.is_empty() {
            return Err(FlashError::invalid("times_sec", "at least one sample is required"));
        }
        if times_sec.len() != dose_rates_Gy_per_sec.len() {
            return Err(FlashError::invalid(
                "dose_rates_Gy_per_sec",
                format!(
                    "length {} does not match {} time samples",
                    dose_rates_Gy_per_sec.len(),
                    times_sec.len()
                ),
            ));
        }
        if let Some(t) = times_sec.iter().find(|t| !t.is_finite()) {
            return Err(FlashError::invalid("times_sec", format!("must be finite, got {}", t)));
        }
        for (i, pair) in times_sec.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(FlashError::invalid(
                    "times_sec",
                    format!(
                        "must be strictly increasing: t[{}] = {} then t[{}] = {}",
                        i,
                        pair[0],
                        i + 1,
                        pair[1]
                    ),
                ));
            }
        }
        for &rate in &dose_rates_Gy_per_sec {
            ensure_non_negative("dose_rates_Gy_per_sec", rate)?;
        }

        Ok(Self {
            times_sec,
            dose_rates_Gy_per_sec,
        })
    }

    /// Constant dose rate from t = 0 until `dose_Gy` has been delivered,
    /// on a uniform grid of `n_intervals` intervals.
    ///
    /// A zero dose gives a single-sample exposure.
    pub fn constant(dose_Gy: f64, dose_rate_Gy_per_sec: f64, n_intervals: usize) -> Result<Self> {
        ensure_non_negative("dose_Gy", dose_Gy)?;
        ensure_positive("dose_rate_Gy_per_sec", dose_rate_Gy_per_sec)?;
        if n_intervals == 0 {
            return Err(FlashError::invalid("n_intervals", "must be at least 1"));
        }
        if dose_Gy == 0.0 {
            return Self::from_samples(vec![0.0], vec![dose_rate_Gy_per_sec]);
        }

        let duration_sec = dose_Gy / dose_rate_Gy_per_sec;
        let dt = duration_sec / n_intervals as f64;
        let times: Vec<f64> = (0..=n_intervals)
            .map(|i| if i == n_intervals { duration_sec } else { i as f64 * dt })
            .collect();
        let mut rates = vec![dose_rate_Gy_per_sec; n_intervals + 1];
        rates[n_intervals] = 0.0;

        Self::from_samples(times, rates)
    }

    /// Rectangular pulses separated by beam-off gaps
    pub fn pulsed(train: &PulseTrain) -> Result<Self> {
        ensure_non_negative("dose_rate_Gy_per_sec", train.dose_rate_Gy_per_sec)?;
        ensure_positive("pulse_width_sec", train.pulse_width_sec)?;
        ensure_positive("period_sec", train.period_sec)?;
        if train.period_sec < train.pulse_width_sec {
            return Err(FlashError::invalid(
                "period_sec",
                format!(
                    "must be >= pulse width {}, got {}",
                    train.pulse_width_sec, train.period_sec
                ),
            ));
        }
        if train.n_pulses == 0 {
            return Err(FlashError::invalid("n_pulses", "must be at least 1"));
        }
        if train.samples_per_pulse == 0 {
            return Err(FlashError::invalid("samples_per_pulse", "must be at least 1"));
        }

        let n = train.samples_per_pulse;
        let has_gap = train.period_sec > train.pulse_width_sec;
        let mut times = Vec::with_capacity(train.n_pulses * (n + 1) + 1);
        let mut rates = Vec::with_capacity(times.capacity());

        for pulse in 0..train.n_pulses {
            let start = pulse as f64 * train.period_sec;
            for j in 0..n {
                times.push(start + train.pulse_width_sec * j as f64 / n as f64);
                rates.push(train.dose_rate_Gy_per_sec);
            }
            let is_last = pulse + 1 == train.n_pulses;
            if has_gap || is_last {
                // Beam off until the next pulse (or end of exposure)
                times.push(start + train.pulse_width_sec);
                rates.push(0.0);
            }
        }

        Self::from_samples(times, rates)
    }

    /// Same delivery on a grid where no interval exceeds `max_interval_sec`.
    ///
    /// Fails when the refined grid would need more than `MAX_SUBSTEPS`
    /// intervals.
    pub fn refined(&self, max_interval_sec: f64) -> Result<Self> {
        ensure_positive("max_interval_sec", max_interval_sec)?;

        let total_pieces: f64 = self
            .segments()
            .map(|segment| (segment.duration_sec / max_interval_sec).ceil().max(1.0))
            .sum();
        if total_pieces > MAX_SUBSTEPS as f64 {
            return Err(FlashError::invalid(
                "max_interval_sec",
                format!(
                    "{} gives {:.3e} intervals, more than the limit of {}",
                    max_interval_sec, total_pieces, MAX_SUBSTEPS
                ),
            ));
        }

        let mut times = Vec::with_capacity(total_pieces as usize + 1);
        let mut rates = Vec::with_capacity(times.capacity());
        for segment in self.segments() {
            let pieces = (segment.duration_sec / max_interval_sec).ceil().max(1.0) as usize;
            let dt = segment.duration_sec / pieces as f64;
            for j in 0..pieces {
                times.push(segment.start_sec + j as f64 * dt);
                rates.push(segment.dose_rate_Gy_per_sec);
            }
        }
        let last = self.len() - 1;
        times.push(self.times_sec[last]);
        rates.push(self.dose_rates_Gy_per_sec[last]);

        Self::from_samples(times, rates)
    }

    pub fn times_sec(&self) -> &[f64] {
        &self.times_sec
    }

    pub fn dose_rates(&self) -> &[f64] {
        &self.dose_rates_Gy_per_sec
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.times_sec.len()
    }

    /// Always false; an exposure holds at least one sample
    pub fn is_empty(&self) -> bool {
        self.times_sec.is_empty()
    }

    /// Held intervals between consecutive samples
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.times_sec
            .windows(2)
            .zip(&self.dose_rates_Gy_per_sec)
            .map(|(t, &rate)| Segment {
                start_sec: t[0],
                duration_sec: t[1] - t[0],
                dose_rate_Gy_per_sec: rate,
            })
    }

    /// Integral of the dose rate over the exposure (Gy)
    pub fn total_dose_Gy(&self) -> f64 {
        self.segments().map(|s| s.dose_Gy()).sum()
    }

    pub fn duration_sec(&self) -> f64 {
        self.times_sec[self.len() - 1] - self.times_sec[0]
    }

    /// Highest dose rate that actually delivers dose
    pub fn max_dose_rate(&self) -> f64 {
        self.segments()
            .map(|s| s.dose_rate_Gy_per_sec)
            .fold(0.0, f64::max)
    }
}
