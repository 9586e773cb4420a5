use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QualityError {
    #[error("{field} must be a finite, non-negative pixel value (got {value})")]
    InvalidMetric { field: &'static str, value: f64 },
}

/// Summary of pixel reprojection error for one accepted alignment.
///
/// Immutable once built; use the `with_*` methods to derive variants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawQuality")]
pub struct AlignmentQuality {
    mean_px: f64,
    max_px: f64,
    samples: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuality {
    mean_px: f64,
    max_px: f64,
    samples: u32,
}

impl TryFrom<RawQuality> for AlignmentQuality {
    type Error = QualityError;

    fn try_from(raw: RawQuality) -> Result<Self, Self::Error> {
        AlignmentQuality::new(raw.mean_px, raw.max_px, raw.samples)
    }
}

fn check_metric(field: &'static str, value: f64) -> Result<f64, QualityError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(QualityError::InvalidMetric { field, value })
    }
}

impl AlignmentQuality {
    pub fn new(mean_px: f64, max_px: f64, samples: u32) -> Result<Self, QualityError> {
        Ok(Self {
            mean_px: check_metric("meanPx", mean_px)?,
            max_px: check_metric("maxPx", max_px)?,
            samples,
        })
    }

    /// Mean, max and count of per-point pixel residuals.
    ///
    /// An empty slice summarizes to all zeros.
    pub fn from_residuals(residuals_px: &[f64]) -> Result<Self, QualityError> {
        if residuals_px.is_empty() {
            return Self::new(0.0, 0.0, 0);
        }
        let mut sum = 0.0;
        let mut max = 0.0_f64;
        for &r in residuals_px {
            let r = check_metric("residual", r)?;
            sum += r;
            max = max.max(r);
        }
        let samples = u32::try_from(residuals_px.len()).unwrap_or(u32::MAX);
        Self::new(sum / residuals_px.len() as f64, max, samples)
    }

    pub fn mean_px(&self) -> f64 {
        self.mean_px
    }

    pub fn max_px(&self) -> f64 {
        self.max_px
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn with_mean_px(&self, mean_px: f64) -> Result<Self, QualityError> {
        Self::new(mean_px, self.max_px, self.samples)
    }

    pub fn with_max_px(&self, max_px: f64) -> Result<Self, QualityError> {
        Self::new(self.mean_px, max_px, self.samples)
    }

    pub fn with_samples(&self, samples: u32) -> Self {
        Self { samples, ..*self }
    }
}
