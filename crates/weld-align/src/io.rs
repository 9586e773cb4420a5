//! JSON configuration and report helpers for the alignment commands.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use weld_align_marker::MarkerPoseParams;

use crate::{
    AlignError, MarkerAlignment, MarkerObservation, ModelAlignment, ModelAlignmentRequest,
};

#[derive(thiserror::Error, Debug)]
pub enum AlignIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AlignIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write<T: Serialize>(value: &T, path: &Path) -> Result<(), AlignIoError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Configuration for a single-marker alignment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerAlignConfig {
    pub observation: MarkerObservation,
    #[serde(default)]
    pub params: Option<MarkerPoseParams>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl MarkerAlignConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AlignIoError> {
        load(path.as_ref())
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AlignIoError> {
        write(self, path.as_ref())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("marker_align_report.json"))
    }

    pub fn pose_params(&self) -> MarkerPoseParams {
        self.params.unwrap_or_default()
    }
}

/// Configuration for a model-to-world fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAlignConfig {
    pub request: ModelAlignmentRequest,
    #[serde(default)]
    pub params: Option<MarkerPoseParams>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl ModelAlignConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AlignIoError> {
        load(path.as_ref())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AlignIoError> {
        write(self, path.as_ref())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("model_align_report.json"))
    }

    pub fn pose_params(&self) -> MarkerPoseParams {
        self.params.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerAlignReport {
    pub config_path: String,
    pub marker_id: String,
    #[serde(default)]
    pub alignment: Option<MarkerAlignment>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MarkerAlignReport {
    pub fn new(cfg: &MarkerAlignConfig, config_path: &Path) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            marker_id: cfg.observation.marker.id.clone(),
            alignment: None,
            error: None,
        }
    }

    pub fn set_result(&mut self, res: &Result<MarkerAlignment, AlignError>) {
        match res {
            Ok(a) => {
                self.alignment = Some(a.clone());
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AlignIoError> {
        load(path.as_ref())
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AlignIoError> {
        write(self, path.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAlignReport {
    pub config_path: String,
    pub num_markers: usize,
    pub num_manual_points: usize,
    #[serde(default)]
    pub alignment: Option<ModelAlignment>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ModelAlignReport {
    pub fn new(cfg: &ModelAlignConfig, config_path: &Path) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            num_markers: cfg.request.markers.len(),
            num_manual_points: cfg.request.manual_points.len(),
            alignment: None,
            error: None,
        }
    }

    pub fn set_result(&mut self, res: &Result<ModelAlignment, AlignError>) {
        match res {
            Ok(a) => {
                self.alignment = Some(a.clone());
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AlignIoError> {
        load(path.as_ref())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AlignIoError> {
        write(self, path.as_ref())
    }
}
