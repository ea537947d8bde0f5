use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};

/// Index-aligned `(time, value)` samples plotted under the video.
///
/// Times are non-decreasing. The series is read-only once built.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "SeriesDoc", into = "SeriesDoc")]
pub struct OverlaySeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct SeriesDoc {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TryFrom<SeriesDoc> for OverlaySeries {
    type Error = ReelError;

    fn try_from(doc: SeriesDoc) -> Result<Self, Self::Error> {
        Self::new(doc.times, doc.values)
    }
}

impl From<OverlaySeries> for SeriesDoc {
    fn from(s: OverlaySeries) -> Self {
        Self {
            times: s.times,
            values: s.values,
        }
    }
}

impl OverlaySeries {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> ReelResult<Self> {
        if times.len() != values.len() {
            return Err(ReelError::validation(format!(
                "overlay series has {} times but {} values",
                times.len(),
                values.len()
            )));
        }
        if times.iter().chain(&values).any(|v| !v.is_finite()) {
            return Err(ReelError::validation(
                "overlay series values must be finite",
            ));
        }
        if times.windows(2).any(|w| w[1] < w[0]) {
            return Err(ReelError::validation(
                "overlay series times must be non-decreasing",
            ));
        }
        Ok(Self { times, values })
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read overlay series '{}'", path.display()))?;
        let series: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse overlay series '{}'", path.display()))?;
        Ok(series)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of leading samples with `time <= cutoff`.
    pub fn visible_len(&self, cutoff: f64) -> usize {
        self.times.partition_point(|&t| t <= cutoff)
    }

    /// Axis window for the full series; see [`AxisLimits::from_series`].
    pub fn limits(&self) -> Option<AxisLimits> {
        AxisLimits::from_series(self)
    }
}

/// Fixed plot window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisLimits {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl AxisLimits {
    /// Relative padding added above and below the value range.
    pub const Y_MARGIN: f64 = 0.1;

    /// Time spans the whole series; values span the global min/max widened by 10% of the range on
    /// each side. Degenerate ranges are widened so the window never collapses.
    pub fn from_series(series: &OverlaySeries) -> Option<Self> {
        let (&x_min, &x_max) = (series.times.first()?, series.times.last()?);
        let (y_lo, y_hi) = series
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let (x_min, x_max) = if x_max > x_min {
            (x_min, x_max)
        } else {
            (x_min - 0.5, x_max + 0.5)
        };

        let range = y_hi - y_lo;
        let margin = if range > 0.0 {
            range * Self::Y_MARGIN
        } else if y_lo != 0.0 {
            y_lo.abs() * Self::Y_MARGIN
        } else {
            Self::Y_MARGIN
        };

        Some(Self {
            x_min,
            x_max,
            y_min: y_lo - margin,
            y_max: y_hi + margin,
        })
    }
}
